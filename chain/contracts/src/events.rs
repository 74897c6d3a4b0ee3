//! Contract events
//!
//! Events are immutable records emitted by successful contract operations.
//! A reverted call emits nothing.

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::units::{TokenAmount, Wei};

/// Tokens moved between holders (zero `from` means mint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
}

/// Allowance set by a token holder for a spender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub amount: TokenAmount,
}

/// Native currency exchanged for tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyTokens {
    pub buyer: Address,
    pub native_paid: Wei,
    pub tokens_bought: TokenAmount,
}

/// Tokens exchanged back for native currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellTokens {
    pub seller: Address,
    pub tokens_sold: TokenAmount,
    pub native_paid: Wei,
}

/// Native reserve paid out to the owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub owner: Address,
    pub amount: Wei,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Transfer(Transfer),
    Approval(Approval),
    BuyTokens(BuyTokens),
    SellTokens(SellTokens),
    Withdrawn(Withdrawn),
    OwnershipTransferred(OwnershipTransferred),
}
