//! Decimal rendering of integer base-unit amounts.

/// Render `raw` base units as a decimal number with `decimals` places,
/// dropping trailing zeros.
///
/// `raw` must be a string of ASCII digits.
#[must_use]
pub fn format_units(raw: &str, decimals: usize) -> String {
    let digits = raw.trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }

    let (whole, fraction) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        (
            "0".to_string(),
            format!("{}{digits}", "0".repeat(decimals - digits.len())),
        )
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units("500000000000000000", 18), "0.5");
        assert_eq!(format_units("1000000000000000000", 18), "1");
        assert_eq!(format_units("1230000000000000000000", 18), "1230");
        assert_eq!(format_units("1", 18), "0.000000000000000001");
        assert_eq!(format_units("0", 18), "0");
        assert_eq!(format_units("12500000", 6), "12.5");
        assert_eq!(format_units("42", 0), "42");
    }
}
