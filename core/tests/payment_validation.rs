//! Payment validator tests.
//!
//! Covers the four checks in order (format, amount found, amount equal,
//! recipient) and the reference confirmation message.

use crbcheck_core::payment::{parse_confirmation, validate, PaymentRejection};

const BIZ: &str = "FOOTBALL HIGHWAY ENTERPRISES";
const GOOD: &str = "ABC123 Confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.";

#[test]
fn reference_message_is_valid() {
    let result = validate(GOOD, 100.0, BIZ);
    assert!(result.valid, "expected valid, got {:?}", result.reason);
    assert_eq!(result.reason, None);
}

#[test]
fn reference_message_wrong_expected_amount() {
    let result = validate(GOOD, 150.0, BIZ);
    assert!(!result.valid);
    let reason = result.reason.expect("reason");
    assert!(reason.contains("amount"), "reason: {reason}");
    assert!(reason.contains("150"), "reason should name the expected amount: {reason}");
}

/// Messages with no leading uppercase/digit run fail on format,
/// whatever else they contain.
#[test]
fn missing_code_prefix_fails_on_format() {
    let messages = [
        "",
        " ABC123 Confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.",
        "confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.",
        "-ABC Ksh100.00 FOOTBALL HIGHWAY ENTERPRISES",
        ".",
        "\nABC123 Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES",
    ];
    for msg in messages {
        let result = validate(msg, 100.0, BIZ);
        assert!(!result.valid, "{msg:?} should be invalid");
        let reason = result.reason.unwrap();
        assert!(reason.contains("format"), "{msg:?} gave {reason}");
    }
}

#[test]
fn missing_amount_is_reported_before_recipient() {
    let result = validate("ABC123 Confirmed. KES 100 sent to NOBODY", 100.0, BIZ);
    assert!(!result.valid);
    assert!(result.reason.unwrap().contains("amount"));
    assert_eq!(
        parse_confirmation("ABC123 Confirmed.", 100.0, BIZ),
        Err(PaymentRejection::AmountNotFound)
    );
}

/// Well-formed messages whose amount differs always fail on amount and
/// name the expected figure.
#[test]
fn any_wrong_amount_fails_on_amount() {
    for (paid, expected) in [(99.0, 100.0), (100.0, 100.5), (1000.0, 100.0), (0.0, 250.0), (100.01, 100.0)] {
        let msg = format!("QX9{paid} Confirmed. Ksh{paid:.2} sent to {BIZ}.");
        let result = validate(&msg, expected, BIZ);
        assert!(!result.valid, "{msg} vs {expected}");
        let reason = result.reason.unwrap();
        assert!(reason.contains("amount"), "{reason}");
        assert!(reason.contains(&expected.to_string()), "{reason} lacks {expected}");
    }
}

/// Well-formed, correct-amount messages that do not name the recipient
/// fail on recipient.
#[test]
fn wrong_recipient_fails_on_recipient() {
    for recipient in ["SOMEONE ELSE LTD", "football highway enterprises", "FOOTBALL HIGHWAY"] {
        let msg = format!("RKT55 Confirmed. Ksh 100 sent to {recipient}.");
        let result = validate(&msg, 100.0, BIZ);
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("recipient"), "{msg}");
    }
}

#[test]
fn whitespace_between_ksh_and_digits_is_allowed() {
    let msg = "SGH71TT Confirmed. Ksh   100 paid to FOOTBALL HIGHWAY ENTERPRISES on 1/1/24";
    assert!(validate(msg, 100.0, BIZ).valid);
}
