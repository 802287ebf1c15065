//! Channel-status normalization.
//!
//! Channels speak their own status vocabularies. Order statuses go through the rule table in
//! the database (see [`StatusManagement`](crate::traits::StatusManagement)); payment and
//! fulfillment codes are normalized here first, then resolved to internal ids.

use log::debug;

/// Financial status codes accepted as-is. Shopify-style vocabulary, shared by the other
/// storefront channels.
pub const PAYMENT_CODES: [&str; 8] =
    ["pending", "authorized", "paid", "partially_paid", "refunded", "partially_refunded", "voided", "unpaid"];

pub const FULFILLMENT_CODES: [&str; 4] = ["unfulfilled", "partial", "fulfilled", "shipped"];

pub const DEFAULT_PAYMENT_CODE: &str = "pending";
pub const DEFAULT_FULFILLMENT_CODE: &str = "unfulfilled";

/// Normalize a channel financial-status string. Unknown input defaults to `pending`.
pub fn normalize_payment_code(code: &str) -> &str {
    let trimmed = code.trim();
    match PAYMENT_CODES.iter().find(|c| trimmed.eq_ignore_ascii_case(c)) {
        Some(c) => c,
        None => {
            if !trimmed.is_empty() {
                debug!("Unknown financial status '{trimmed}'. Defaulting to {DEFAULT_PAYMENT_CODE}");
            }
            DEFAULT_PAYMENT_CODE
        },
    }
}

/// Normalize a channel fulfillment-status string. Null, empty and unknown input all default
/// to `unfulfilled`.
pub fn normalize_fulfillment_code(code: Option<&str>) -> &str {
    let trimmed = code.unwrap_or_default().trim();
    match FULFILLMENT_CODES.iter().find(|c| trimmed.eq_ignore_ascii_case(c)) {
        Some(c) => c,
        None => {
            if !trimmed.is_empty() {
                debug!("Unknown fulfillment status '{trimmed}'. Defaulting to {DEFAULT_FULFILLMENT_CODE}");
            }
            DEFAULT_FULFILLMENT_CODE
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_codes_pass_through() {
        for code in PAYMENT_CODES {
            assert_eq!(normalize_payment_code(code), code);
        }
        assert_eq!(normalize_payment_code("PAID"), "paid");
        assert_eq!(normalize_payment_code(" authorized "), "authorized");
    }

    #[test]
    fn unknown_payment_codes_default_to_pending() {
        assert_eq!(normalize_payment_code(""), "pending");
        assert_eq!(normalize_payment_code("card_declined"), "pending");
    }

    #[test]
    fn fulfillment_codes() {
        assert_eq!(normalize_fulfillment_code(Some("fulfilled")), "fulfilled");
        assert_eq!(normalize_fulfillment_code(Some("PARTIAL")), "partial");
        assert_eq!(normalize_fulfillment_code(Some("")), "unfulfilled");
        assert_eq!(normalize_fulfillment_code(None), "unfulfilled");
        assert_eq!(normalize_fulfillment_code(Some("in_transit")), "unfulfilled");
    }
}
