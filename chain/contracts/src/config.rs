//! Deployment configuration
//!
//! Every field has a default matching the reference deployment: 100 tokens
//! per native unit, a 1000-token "Gold" supply, and a flat transaction fee of
//! 21000 gas at 1 gwei.

use serde::{Deserialize, Serialize};
use types::units::{TokenAmount, Wei};

use crate::errors::ConfigError;

/// Configuration for the vendor contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Token base units paid out per base unit of native currency.
    pub tokens_per_native: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            tokens_per_native: 100,
        }
    }
}

/// Configuration for the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Minted to the deployer at construction.
    pub initial_supply: TokenAmount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Gold".to_string(),
            symbol: "GLD".to_string(),
            initial_supply: TokenAmount::from_whole(1000),
        }
    }
}

/// Configuration for the local chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Flat fee charged to the sender of every transaction, reverted or not.
    pub tx_fee: Wei,
    pub vendor: VendorConfig,
    pub token: TokenConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            tx_fee: Wei::new(21_000 * 1_000_000_000),
            vendor: VendorConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor.tokens_per_native == 0 {
            return Err(ConfigError::InvalidRate);
        }
        Ok(())
    }
}
