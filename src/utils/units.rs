//! Native currency unit conversion.

const WEI_PER_MICRO_ETH: u128 = 1_000_000_000_000;
const MICRO_ETH_PER_ETH: u128 = 1_000_000;

/// Parse a wei amount given as a decimal or `0x` hex string
pub fn parse_wei(raw: &str) -> Option<u128> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some("") => Some(0),
        Some(hex) => u128::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Format a wei amount as ETH with six decimals, rounding half up
///
/// # Examples
/// ```
/// use walletscope::utils::units::format_wei;
///
/// assert_eq!(format_wei("1500000000000000000").as_deref(), Some("1.500000"));
/// assert_eq!(format_wei("not a number"), None);
/// ```
pub fn format_wei(raw: &str) -> Option<String> {
    let wei = parse_wei(raw)?;
    let micro = wei / WEI_PER_MICRO_ETH + u128::from(wei % WEI_PER_MICRO_ETH >= WEI_PER_MICRO_ETH / 2);
    Some(format!(
        "{}.{:06}",
        micro / MICRO_ETH_PER_ETH,
        micro % MICRO_ETH_PER_ETH
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wei() {
        assert_eq!(format_wei("0").as_deref(), Some("0.000000"));
        assert_eq!(format_wei("1000000000000000000").as_deref(), Some("1.000000"));
        assert_eq!(format_wei("123456789012345678901").as_deref(), Some("123.456789"));
        // Below one micro-ETH
        assert_eq!(format_wei("400000000000").as_deref(), Some("0.000000"));
        assert_eq!(format_wei("500000000000").as_deref(), Some("0.000001"));
        // Rounding carries into the integer part
        assert_eq!(format_wei("1999999999999999999").as_deref(), Some("2.000000"));
    }

    #[test]
    fn test_parse_wei_forms() {
        assert_eq!(parse_wei("0x0de0b6b3a7640000"), Some(1_000_000_000_000_000_000));
        assert_eq!(parse_wei(" 42 "), Some(42));
        assert_eq!(parse_wei("0x"), Some(0));
        assert_eq!(parse_wei("-1"), None);
        assert_eq!(parse_wei("1.5"), None);
        assert_eq!(format_wei(""), None);
    }
}
