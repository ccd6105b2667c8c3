//! Utility functions and helpers.

pub mod units;
pub mod validation;

pub use units::{format_wei, parse_wei};
pub use validation::{is_valid_address, validate_address, AddressError};
