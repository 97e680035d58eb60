//! Store methods for the cached report and the payment receipt.

use crate::{
    error::CrbResult,
    payment::PaymentReceipt,
    report::ReportRecord,
    types::keys,
};

use super::ClientStore;

impl ClientStore {
    /// An unreadable cached report reads as absent.
    pub fn load_report(&self) -> CrbResult<Option<ReportRecord>> {
        self.get_json_or_discard(keys::REPORT)
    }

    pub fn save_report(&self, report: &ReportRecord) -> CrbResult<()> {
        self.set_json(keys::REPORT, report)
    }

    pub fn clear_report(&self) -> CrbResult<()> {
        self.remove(keys::REPORT)
    }

    pub fn load_payment_receipt(&self) -> CrbResult<Option<PaymentReceipt>> {
        self.get_json_or_discard(keys::PAYMENT_RECEIPT)
    }

    pub fn save_payment_receipt(&self, receipt: &PaymentReceipt) -> CrbResult<()> {
        self.set_json(keys::PAYMENT_RECEIPT, receipt)
    }

    pub fn clear_payment_receipt(&self) -> CrbResult<()> {
        self.remove(keys::PAYMENT_RECEIPT)
    }
}
