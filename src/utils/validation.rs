//! Wallet address validation.
//!
//! Applied to user input before it reaches the analysis core.

use std::sync::LazyLock;

use regex::Regex;

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressError {
    #[error("Address is empty")]
    Empty,

    #[error("Invalid wallet address '{0}': expected 0x followed by 40 hex digits")]
    Malformed(String),
}

/// True for a `0x`-prefixed, 40 hex digit address. Mixed case is accepted.
///
/// # Examples
/// ```
/// use walletscope::utils::validation::is_valid_address;
///
/// assert!(is_valid_address("0x52908400098527886E0F7030069857D2E4169EE7"));
/// assert!(!is_valid_address("52908400098527886E0F7030069857D2E4169EE7"));
/// ```
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_PATTERN.is_match(address)
}

/// Validate a wallet address
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    if !is_valid_address(address) {
        return Err(AddressError::Malformed(address.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("0x0000000000000000000000000000000000000000"));
        assert!(is_valid_address("0xabcdefABCDEF0123456789abcdefABCDEF012345"));
    }

    #[test]
    fn test_invalid_addresses() {
        // Too short, too long, bad prefix, non-hex, whitespace
        assert!(!is_valid_address("0x123"));
        assert!(!is_valid_address("0x00000000000000000000000000000000000000000"));
        assert!(!is_valid_address("0X0000000000000000000000000000000000000000"));
        assert!(!is_valid_address("0xg000000000000000000000000000000000000000"));
        assert!(!is_valid_address(" 0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn test_validate_address_errors() {
        assert_eq!(validate_address(""), Err(AddressError::Empty));
        assert_eq!(
            validate_address("vitalik.eth"),
            Err(AddressError::Malformed("vitalik.eth".to_string()))
        );
        assert!(validate_address("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
    }
}
