//! Native currency accounting
//!
//! The vendor never stores its own native balance; it reads it from the
//! execution substrate through the `NativeBank` trait, the same way a
//! contract reads `address(this).balance`.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use types::address::Address;
use types::units::Wei;

use crate::errors::BankError;

/// Native balance accounting consumed by the vendor.
pub trait NativeBank {
    /// Native balance held by `who`.
    fn balance_of(&self, who: &Address) -> Wei;

    /// Report whether `send` with the same arguments would succeed.
    ///
    /// With no mutation in between, `send` must succeed whenever this does.
    fn check_send(&self, from: &Address, to: &Address, amount: Wei) -> Result<(), BankError>;

    /// Move `amount` from `from` to `to`.
    ///
    /// Either both balances change or neither does.
    fn send(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<(), BankError>;
}

/// In-memory native balances keyed by address.
#[derive(Debug, Clone, Default)]
pub struct NativeLedger {
    balances: HashMap<Address, Wei>,
    /// Addresses that refuse incoming native transfers
    rejecting: HashSet<Address>,
}

impl NativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create native currency out of nothing (genesis allocation).
    pub fn mint(&mut self, to: &Address, amount: Wei) -> Result<(), BankError> {
        let current = self.balance_of(to);
        let updated = current.checked_add(amount).ok_or(BankError::Overflow)?;
        self.balances.insert(*to, updated);
        Ok(())
    }

    /// Destroy native currency (transaction fees).
    pub fn burn(&mut self, from: &Address, amount: Wei) -> Result<(), BankError> {
        let current = self.balance_of(from);
        let updated = current
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                required: amount,
                available: current,
            })?;
        self.balances.insert(*from, updated);
        Ok(())
    }

    /// Make `who` refuse incoming native transfers.
    pub fn reject_incoming(&mut self, who: Address) {
        self.rejecting.insert(who);
    }

    /// Let `who` accept incoming native transfers again.
    pub fn accept_incoming(&mut self, who: &Address) {
        self.rejecting.remove(who);
    }

    /// Sum of every balance.
    pub fn total(&self) -> Option<Wei> {
        self.balances
            .values()
            .try_fold(Wei::ZERO, |acc, b| acc.checked_add(*b))
    }
}

impl NativeBank for NativeLedger {
    fn balance_of(&self, who: &Address) -> Wei {
        self.balances.get(who).copied().unwrap_or(Wei::ZERO)
    }

    fn check_send(&self, from: &Address, to: &Address, amount: Wei) -> Result<(), BankError> {
        self.settle(from, to, amount).map(|_| ())
    }

    fn send(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<(), BankError> {
        if let Some((from_after, to_after)) = self.settle(from, to, amount)? {
            self.balances.insert(*from, from_after);
            self.balances.insert(*to, to_after);
        }
        debug!(%from, %to, amount = %amount, "Native transfer");
        Ok(())
    }
}

impl NativeLedger {
    /// Balances after moving `amount`, or `None` for a send to self.
    fn settle(
        &self,
        from: &Address,
        to: &Address,
        amount: Wei,
    ) -> Result<Option<(Wei, Wei)>, BankError> {
        if self.rejecting.contains(to) {
            return Err(BankError::RecipientRejected { recipient: *to });
        }

        let from_balance = self.balance_of(from);
        let from_after = from_balance
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                required: amount,
                available: from_balance,
            })?;
        if from == to {
            return Ok(None);
        }
        let to_after = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;
        Ok(Some((from_after, to_after)))
    }
}
