//! Types library for the token vendor
//!
//! Core identity and quantity types shared by the contract crate. Amounts
//! are integer base units; conversions to and from human-readable units
//! go through `rust_decimal` so that no floating point is involved.
//!
//! # Modules
//! - `address`: 20-byte account and contract identities
//! - `units`: Native-currency (`Wei`) and token (`TokenAmount`) quantities
//! - `errors`: Parsing error taxonomy

pub mod address;
pub mod errors;
pub mod units;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::address::*;
    pub use crate::errors::*;
    pub use crate::units::*;
}
