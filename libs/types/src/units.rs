//! Native-currency and token quantities
//!
//! Both assets are counted in integer base units (`u128`), the way the
//! ledger stores them. Human-readable amounts such as `"10.1"` ether are
//! converted with 18 decimals through `rust_decimal`, never through floats.
//!
//! Serialized form is the decimal base-unit string, so large balances
//! survive JSON round-trips without precision loss.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::UnitsError;

/// Decimals of the native currency (wei per ether = 10^18).
pub const NATIVE_DECIMALS: u32 = 18;

/// Decimals of the vendor token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Parse a human-readable decimal string into base units.
///
/// `parse_units("10.1", 18)` is `10_100_000_000_000_000_000`.
pub fn parse_units(input: &str, decimals: u32) -> Result<u128, UnitsError> {
    let value = Decimal::from_str(input.trim()).map_err(|_| UnitsError::Invalid {
        input: input.to_string(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitsError::Negative {
            input: input.to_string(),
        });
    }

    let value = value.normalize();
    let scale = value.scale();
    if scale > decimals {
        return Err(UnitsError::TooPrecise {
            scale,
            max: decimals,
        });
    }

    let mantissa = value.mantissa().unsigned_abs();
    10u128
        .checked_pow(decimals - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| UnitsError::Overflow {
            input: input.to_string(),
        })
}

/// Format base units as a human-readable decimal string.
///
/// Trailing zeros are trimmed: `format_units(1_500_000_000_000_000_000, 18)`
/// is `"1.5"`.
pub fn format_units(value: u128, decimals: u32) -> String {
    let as_decimal = i128::try_from(value)
        .ok()
        .and_then(|v| Decimal::try_from_i128_with_scale(v, decimals).ok());
    if let Some(d) = as_decimal {
        return d.normalize().to_string();
    }

    // Beyond Decimal's 96-bit mantissa
    let base = 10u128.pow(decimals);
    let whole = value / base;
    let frac = value % base;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

mod base_units {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

macro_rules! base_unit_amount {
    ($(#[$meta:meta])* $name:ident, $decimals:expr) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "base_units")] u128);

        impl $name {
            pub const ZERO: $name = $name(0);

            /// Create from raw base units
            pub const fn new(base_units: u128) -> Self {
                Self(base_units)
            }

            /// Parse a human-readable amount (e.g. `"0.1"`).
            pub fn parse(input: &str) -> Result<Self, UnitsError> {
                parse_units(input, $decimals).map(Self)
            }

            /// Whole units: `from_whole(3)` is 3 × 10^decimals base units.
            pub fn from_whole(units: u64) -> Self {
                Self(u128::from(units) * 10u128.pow($decimals))
            }

            /// Raw base units
            pub const fn get(&self) -> u128 {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == 0
            }

            pub fn checked_add(self, rhs: Self) -> Option<Self> {
                self.0.checked_add(rhs.0).map(Self)
            }

            pub fn checked_sub(self, rhs: Self) -> Option<Self> {
                self.0.checked_sub(rhs.0).map(Self)
            }

            /// Human-readable decimal value, if it fits in a `Decimal`.
            pub fn to_decimal(&self) -> Option<Decimal> {
                i128::try_from(self.0)
                    .ok()
                    .and_then(|v| Decimal::try_from_i128_with_scale(v, $decimals).ok())
                    .map(|d| d.normalize())
            }

            /// Human-readable string with trailing zeros trimmed.
            pub fn format(&self) -> String {
                format_units(self.0, $decimals)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u128> for $name {
            fn from(base_units: u128) -> Self {
                Self(base_units)
            }
        }
    };
}

base_unit_amount!(
    /// Native-currency quantity in wei.
    Wei,
    NATIVE_DECIMALS
);

base_unit_amount!(
    /// Token quantity in the token's smallest unit.
    TokenAmount,
    TOKEN_DECIMALS
);
