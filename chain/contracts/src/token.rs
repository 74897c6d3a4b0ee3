//! Fungible token: the asset the vendor custodies
//!
//! `FungibleToken` is the collaborator interface the vendor calls into.
//! `Erc20Token` is an in-memory implementation with standard semantics:
//! the whole supply is minted to the deployer, allowances are replaced (not
//! added to) by `approve`, and `transfer_from` checks the allowance before
//! the balance. Every failing call leaves balances and allowances unchanged.

use std::collections::HashMap;

use tracing::debug;
use types::address::Address;
use types::units::TokenAmount;

use crate::config::TokenConfig;
use crate::errors::TokenError;
use crate::events::{Approval, ContractEvent, Transfer};

/// Token operations consumed by the vendor.
pub trait FungibleToken {
    fn balance_of(&self, who: &Address) -> TokenAmount;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount;

    /// Move `amount` from `sender` to `to`.
    fn transfer(
        &mut self,
        sender: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. Fails without partial effect.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;
}

/// In-memory ERC-20 style token.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    address: Address,
    name: String,
    symbol: String,
    total_supply: TokenAmount,
    balances: HashMap<Address, TokenAmount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), TokenAmount>,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Erc20Token {
    /// Deploy the token at `address`, minting the initial supply to `deployer`.
    pub fn new(address: Address, config: &TokenConfig, deployer: Address) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer, config.initial_supply);
        Self {
            address,
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            total_supply: config.initial_supply,
            balances,
            allowances: HashMap::new(),
            events: vec![ContractEvent::Transfer(Transfer {
                from: Address::ZERO,
                to: deployer,
                amount: config.initial_supply,
            })],
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        types::units::TOKEN_DECIMALS
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Set `spender`'s allowance over `owner`'s tokens to `amount`.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.allowances.insert((*owner, *spender), amount);
        self.events.push(ContractEvent::Approval(Approval {
            owner: *owner,
            spender: *spender,
            amount,
        }));
        debug!(%owner, %spender, amount = %amount, "Approval");
        Ok(())
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    /// Checked balance move shared by `transfer` and `transfer_from`.
    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let from_balance = self.balance_of(from);
        let from_after =
            from_balance
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientBalance {
                    required: amount,
                    available: from_balance,
                })?;

        if from != to {
            let to_after = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::Overflow)?;
            self.balances.insert(*from, from_after);
            self.balances.insert(*to, to_after);
        }

        self.events.push(ContractEvent::Transfer(Transfer {
            from: *from,
            to: *to,
            amount,
        }));
        debug!(%from, %to, amount = %amount, "Token transfer");
        Ok(())
    }
}

impl FungibleToken for Erc20Token {
    fn balance_of(&self, who: &Address) -> TokenAmount {
        self.balances.get(who).copied().unwrap_or(TokenAmount::ZERO)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    fn transfer(
        &mut self,
        sender: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        self.move_balance(sender, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            })?;

        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), remaining);
        Ok(())
    }
}
