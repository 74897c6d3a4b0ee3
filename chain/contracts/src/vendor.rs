//! Vendor: fixed-rate exchange between native currency and a custodied token
//!
//! The vendor holds two assets, neither stored in its own fields:
//! - native currency, read from the `NativeBank` at the vendor's address
//! - tokens, read from the `FungibleToken` at the vendor's address
//!
//! Every operation follows the same order:
//! 1. Reentrancy guard
//! 2. Access control and input validation
//! 3. Solvency checks against current holdings
//! 4. External transfers, native payout last
//! 5. Event emission
//!
//! A failed sell, withdraw or ownership transfer leaves the vendor and its
//! collaborators untouched: the native payout is checked with
//! `NativeBank::check_send` before any tokens move.

use tracing::{info, warn};
use types::address::Address;
use types::units::{TokenAmount, Wei};

use crate::bank::NativeBank;
use crate::config::VendorConfig;
use crate::errors::{ConfigError, VendorError};
use crate::events::{BuyTokens, ContractEvent, OwnershipTransferred, SellTokens, Withdrawn};
use crate::security::{Ownable, ReentrancyGuard};
use crate::token::FungibleToken;

/// Identity and attached value of the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Native currency sent with the call, already credited to the vendor.
    pub value: Wei,
}

impl CallContext {
    pub fn new(caller: Address) -> Self {
        Self {
            caller,
            value: Wei::ZERO,
        }
    }

    pub fn with_value(caller: Address, value: Wei) -> Self {
        Self { caller, value }
    }
}

/// Core vendor contract.
///
/// `buy_tokens` expects the call value to be credited to the vendor before
/// it runs (see `CallContext::value`). If the buy fails, returning that
/// value to the buyer is the caller's job; `Chain` does it by restoring its
/// snapshot.
#[derive(Debug, Clone)]
pub struct Vendor {
    /// The vendor's own identity, where its holdings live
    address: Address,
    /// Token contract this vendor trades
    token: Address,
    /// Token base units per native base unit
    tokens_per_native: u128,
    /// Security: owner access control
    ownable: Ownable,
    /// Security: reentrancy guard
    reentrancy_guard: ReentrancyGuard,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Vendor {
    /// Create a vendor owned by `deployer`.
    pub fn new(
        address: Address,
        token: Address,
        deployer: Address,
        config: &VendorConfig,
    ) -> Result<Self, ConfigError> {
        if config.tokens_per_native == 0 {
            return Err(ConfigError::InvalidRate);
        }
        info!(
            %address,
            %token,
            owner = %deployer,
            tokens_per_native = config.tokens_per_native,
            "Vendor deployed"
        );
        Ok(Self {
            address,
            token,
            tokens_per_native: u128::from(config.tokens_per_native),
            ownable: Ownable::new(deployer),
            reentrancy_guard: ReentrancyGuard::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn tokens_per_native(&self) -> u128 {
        self.tokens_per_native
    }

    /// Native currency currently held by the vendor.
    pub fn native_reserve<B: NativeBank + ?Sized>(&self, bank: &B) -> Wei {
        bank.balance_of(&self.address)
    }

    /// Tokens currently custodied by the vendor.
    pub fn token_inventory<T: FungibleToken + ?Sized>(&self, token: &T) -> TokenAmount {
        token.balance_of(&self.address)
    }

    /// Tokens a payment of `paid` buys.
    pub fn quote_buy(&self, paid: Wei) -> Result<TokenAmount, VendorError> {
        if paid.is_zero() {
            return Err(VendorError::ZeroPayment);
        }
        paid.get()
            .checked_mul(self.tokens_per_native)
            .map(TokenAmount::new)
            .ok_or(VendorError::Overflow)
    }

    /// Native currency returned for selling `amount` tokens.
    ///
    /// `amount` must be a positive exact multiple of the rate, so no
    /// remainder is ever truncated away.
    pub fn quote_sell(&self, amount: TokenAmount) -> Result<Wei, VendorError> {
        let units = amount.get();
        if units == 0 || units % self.tokens_per_native != 0 {
            return Err(VendorError::InvalidSellQuantity {
                amount,
                rate: self.tokens_per_native,
            });
        }
        Ok(Wei::new(units / self.tokens_per_native))
    }

    // ───────────────────────── Buy ─────────────────────────

    /// Exchange the call's attached value for tokens at the fixed rate.
    ///
    /// The value stays with the vendor; `value × rate` tokens go to the
    /// caller. Fails with `InsufficientInventory` when the vendor does not
    /// custody enough tokens.
    pub fn buy_tokens<T: FungibleToken + ?Sized>(
        &mut self,
        ctx: &CallContext,
        token: &mut T,
    ) -> Result<TokenAmount, VendorError> {
        self.guarded(|vendor| vendor.buy_inner(ctx, token))
    }

    fn buy_inner<T: FungibleToken + ?Sized>(
        &mut self,
        ctx: &CallContext,
        token: &mut T,
    ) -> Result<TokenAmount, VendorError> {
        let tokens_out = self.quote_buy(ctx.value)?;

        let available = token.balance_of(&self.address);
        if tokens_out > available {
            return Err(VendorError::InsufficientInventory {
                requested: tokens_out,
                available,
            });
        }

        token.transfer(&self.address, &ctx.caller, tokens_out)?;

        self.events.push(ContractEvent::BuyTokens(BuyTokens {
            buyer: ctx.caller,
            native_paid: ctx.value,
            tokens_bought: tokens_out,
        }));
        info!(
            buyer = %ctx.caller,
            native_paid = %ctx.value.format(),
            tokens_bought = %tokens_out.format(),
            "Tokens bought"
        );
        Ok(tokens_out)
    }

    // ───────────────────────── Sell ─────────────────────────

    /// Exchange `amount` tokens back for native currency at the fixed rate.
    ///
    /// The caller must have approved the vendor for at least `amount`.
    /// Tokens are pulled into custody first; the native payout is the last
    /// effect.
    pub fn sell_tokens<T, B>(
        &mut self,
        ctx: &CallContext,
        amount: TokenAmount,
        token: &mut T,
        bank: &mut B,
    ) -> Result<Wei, VendorError>
    where
        T: FungibleToken + ?Sized,
        B: NativeBank + ?Sized,
    {
        self.guarded(|vendor| vendor.sell_inner(ctx, amount, token, bank))
    }

    fn sell_inner<T, B>(
        &mut self,
        ctx: &CallContext,
        amount: TokenAmount,
        token: &mut T,
        bank: &mut B,
    ) -> Result<Wei, VendorError>
    where
        T: FungibleToken + ?Sized,
        B: NativeBank + ?Sized,
    {
        let native_out = self.quote_sell(amount)?;

        let allowed = token.allowance(&ctx.caller, &self.address);
        if allowed < amount {
            return Err(VendorError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }

        let held = token.balance_of(&ctx.caller);
        if held < amount {
            return Err(VendorError::InsufficientTokenBalance {
                required: amount,
                available: held,
            });
        }

        let reserve = bank.balance_of(&self.address);
        if native_out > reserve {
            return Err(VendorError::InsufficientNativeReserve {
                required: native_out,
                available: reserve,
            });
        }
        bank.check_send(&self.address, &ctx.caller, native_out)?;

        token.transfer_from(&self.address, &ctx.caller, &self.address, amount)?;
        bank.send(&self.address, &ctx.caller, native_out)?;

        self.events.push(ContractEvent::SellTokens(SellTokens {
            seller: ctx.caller,
            tokens_sold: amount,
            native_paid: native_out,
        }));
        info!(
            seller = %ctx.caller,
            tokens_sold = %amount.format(),
            native_paid = %native_out.format(),
            "Tokens sold"
        );
        Ok(native_out)
    }

    // ───────────────────────── Owner operations ─────────────────────────

    /// Send the vendor's entire native balance to the owner. Owner-only.
    pub fn withdraw<B: NativeBank + ?Sized>(
        &mut self,
        ctx: &CallContext,
        bank: &mut B,
    ) -> Result<Wei, VendorError> {
        self.guarded(|vendor| vendor.withdraw_inner(ctx, bank))
    }

    fn withdraw_inner<B: NativeBank + ?Sized>(
        &mut self,
        ctx: &CallContext,
        bank: &mut B,
    ) -> Result<Wei, VendorError> {
        self.ownable.only_owner(&ctx.caller)?;

        let owner = self.ownable.owner();
        let amount = bank.balance_of(&self.address);
        if !amount.is_zero() {
            bank.send(&self.address, &owner, amount)?;
        }

        self.events
            .push(ContractEvent::Withdrawn(Withdrawn { owner, amount }));
        info!(%owner, amount = %amount.format(), "Native reserve withdrawn");
        Ok(amount)
    }

    /// Hand ownership to `new_owner`. Owner-only.
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), VendorError> {
        self.guarded(|vendor| {
            let previous_owner = vendor.ownable.transfer_ownership(&ctx.caller, new_owner)?;
            vendor
                .events
                .push(ContractEvent::OwnershipTransferred(OwnershipTransferred {
                    previous_owner,
                    new_owner,
                }));
            info!(%previous_owner, %new_owner, "Ownership transferred");
            Ok(())
        })
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    /// Run `op` inside the entry lock, releasing it on every path.
    ///
    /// `&mut self` rules out nested entry from safe Rust; the lock stays as
    /// the contract-level entered flag that reports `VendorError::Reentrancy`.
    fn guarded<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, VendorError>,
    ) -> Result<R, VendorError> {
        self.reentrancy_guard.enter()?;
        let result = op(self);
        self.reentrancy_guard.exit();
        if let Err(err) = &result {
            warn!(vendor = %self.address, error = %err, "Vendor call rejected");
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn lock_for_test(&mut self) {
        self.reentrancy_guard.enter().unwrap();
    }
}
