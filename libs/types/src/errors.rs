//! Error types for identity and amount parsing
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("Address must start with 0x: {input}")]
    MissingPrefix { input: String },

    #[error("Invalid hex in address: {input}")]
    InvalidHex { input: String },

    #[error("Invalid address length: expected 20 bytes, got {len}")]
    InvalidLength { len: usize },
}

/// Unit conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitsError {
    #[error("Invalid decimal amount: {input}")]
    Invalid { input: String },

    #[error("Amount must not be negative: {input}")]
    Negative { input: String },

    #[error("Too many decimal places: {scale} exceeds {max}")]
    TooPrecise { scale: u32, max: u32 },

    #[error("Amount does not fit in base units: {input}")]
    Overflow { input: String },
}
