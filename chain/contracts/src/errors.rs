//! Contract-specific error types
//!
//! Error taxonomy for the vendor, the token it custodies, the native
//! currency ledger, and the local execution substrate. Every variant aborts
//! the call that produced it with no state change.

use thiserror::Error;
use types::address::Address;
use types::units::{TokenAmount, Wei};

/// Vendor-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VendorError {
    #[error("Ownable: caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("Ownable: new owner is the zero address")]
    InvalidOwner,

    #[error("Vendor: payment must be positive")]
    ZeroPayment,

    #[error("Vendor: insufficient token inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("Vendor: sell amount {amount} is not a positive multiple of {rate}")]
    InvalidSellQuantity { amount: TokenAmount, rate: u128 },

    #[error("ERC20: insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("ERC20: transfer amount exceeds balance: required {required}, available {available}")]
    InsufficientTokenBalance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("Vendor: insufficient native reserve: required {required}, available {available}")]
    InsufficientNativeReserve { required: Wei, available: Wei },

    #[error("Vendor: transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("ReentrancyGuard: reentrant call")]
    Reentrancy,

    #[error("Arithmetic overflow in rate conversion")]
    Overflow,
}

/// Fungible token errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("ERC20: insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("ERC20: transfer amount exceeds balance: required {required}, available {available}")]
    InsufficientBalance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("ERC20: zero address")]
    ZeroAddress,

    #[error("ERC20: arithmetic overflow")]
    Overflow,
}

/// Native currency transfer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Wei, available: Wei },

    #[error("Recipient {recipient} cannot accept native currency")]
    RecipientRejected { recipient: Address },

    #[error("Arithmetic overflow in native balance")]
    Overflow,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(String),

    #[error("Exchange rate must be positive")]
    InvalidRate,
}

/// Execution substrate errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Reverted: {0}")]
    Vendor(#[from] VendorError),

    #[error("Reverted: {0}")]
    Token(#[from] TokenError),

    #[error("Native transfer error: {0}")]
    Bank(#[from] BankError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Insufficient funds for fee and value: required {required}, available {available}")]
    InsufficientFundsForFee { required: Wei, available: Wei },

    #[error("Contract not deployed: {contract}")]
    NotDeployed { contract: &'static str },

    #[error("Contract already deployed: {contract}")]
    AlreadyDeployed { contract: &'static str },
}

impl From<TokenError> for VendorError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientAllowance {
                required,
                available,
            } => VendorError::InsufficientAllowance {
                required,
                available,
            },
            TokenError::InsufficientBalance {
                required,
                available,
            } => VendorError::InsufficientTokenBalance {
                required,
                available,
            },
            other => VendorError::TransferFailed {
                reason: other.to_string(),
            },
        }
    }
}

impl From<BankError> for VendorError {
    fn from(err: BankError) -> Self {
        VendorError::TransferFailed {
            reason: err.to_string(),
        }
    }
}
