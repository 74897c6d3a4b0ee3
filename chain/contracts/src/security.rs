//! Shared security primitives for contract modules
//!
//! Reentrancy guard and single-owner access control used by the vendor.

use serde::{Deserialize, Serialize};
use types::address::Address;

use crate::errors::VendorError;

/// Entry lock held while one of the vendor's mutating calls runs.
///
/// Entering twice before `exit` fails with `VendorError::Reentrancy`.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self) -> Result<(), VendorError> {
        if self.entered {
            return Err(VendorError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.entered = false;
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

/// Single-owner access control.
///
/// One identity holds every privileged right; there is no role hierarchy.
/// The owner can only be replaced by the current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    /// Create with the deploying identity as owner.
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// Get the current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Guard clause for owner-only operations.
    pub fn only_owner(&self, caller: &Address) -> Result<(), VendorError> {
        if !self.is_owner(caller) {
            return Err(VendorError::NotOwner { caller: *caller });
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Returns the previous owner.
    ///
    /// The zero address is never a valid owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Address, VendorError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(VendorError::InvalidOwner);
        }
        let previous = self.owner;
        self.owner = new_owner;
        Ok(previous)
    }
}
