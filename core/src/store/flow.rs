//! Store methods for the persisted flow flags.

use crate::{error::CrbResult, flow::FlowState, types::keys};

use super::ClientStore;

impl ClientStore {
    /// Read the flow record. A record that no longer parses is treated
    /// as absent so a corrupted value cannot pin the user in a
    /// redirect loop. A missing flag reads as false.
    pub fn load_flow_state(&self) -> CrbResult<Option<FlowState>> {
        self.get_json_or_discard(keys::FLOW_STATE)
    }

    pub fn save_flow_state(&self, state: &FlowState) -> CrbResult<()> {
        self.set_json(keys::FLOW_STATE, state)
    }

    pub fn clear_flow_state(&self) -> CrbResult<()> {
        self.remove(keys::FLOW_STATE)
    }
}
