mod secret;

pub use secret::Secret;

pub const MANUAL_PLATFORM: &str = "manual";
pub const MANUAL_ORDER_PREFIX: &str = "prob-";

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Round a monetary amount down to 2 decimal places.
///
/// Truncation rather than banker's rounding: downstream systems compare scores and totals for
/// exact equality, so the rounding direction must be deterministic.
pub fn round_down_2(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("1".into()), false));
        assert!(parse_boolean_flag(Some("  YES ".into()), false));
        assert!(!parse_boolean_flag(Some("off".into()), true));
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(Some("maybe".into()), false));
    }

    #[test]
    fn rounding_truncates() {
        assert_eq!(round_down_2(80.0), 80.0);
        assert_eq!(round_down_2(56.004), 56.0);
        assert_eq!(round_down_2(29.999), 29.99);
        assert_eq!(round_down_2(0.0), 0.0);
    }
}
