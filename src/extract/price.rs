//! Price and count parsing

/// Parses a displayed price by keeping only its digits
///
/// Every non-digit character is dropped, so separators and currency marks
/// vanish: "1.250.000đ" is 1250000. A price written with a decimal subunit is
/// read as if the subunit digits were part of the integer amount. Text with no
/// digits, or with more digits than an `f64` can hold, yields 0.0.
///
/// # Examples
///
/// ```
/// use longchau_harvest::extract::parse_price;
///
/// assert_eq!(parse_price("150.000đ"), 150000.0);
/// assert_eq!(parse_price("Liên hệ"), 0.0);
/// ```
pub fn parse_price(text: &str) -> f64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0.0;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses the digits of a count such as "(25)" or "25 lượt"
pub fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("125.000 ₫"), 125000.0);
        assert_eq!(parse_price("1,250,000đ"), 1250000.0);
        assert_eq!(parse_price("  89000  "), 89000.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("Hết hàng"), 0.0);
    }

    #[test]
    fn test_parse_price_merges_decimal_digits() {
        assert_eq!(parse_price("12.50"), 1250.0);
    }

    #[test]
    fn test_parse_price_idempotent() {
        let overflowing = "9".repeat(400);
        for input in [
            "150.000đ",
            "0",
            "Giá: 99.000 / Hộp",
            "",
            "abc",
            "1.234.567.890",
            overflowing.as_str(),
        ] {
            let once = parse_price(input);
            assert_eq!(parse_price(&once.to_string()), once, "input: {input}");
            assert!(once.is_finite() && once >= 0.0);
        }
        assert_eq!(parse_price(&overflowing), 0.0);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("(25)"), 25);
        assert_eq!(parse_count("không có"), 0);
    }
}
