//! Local execution substrate
//!
//! Runs transactions against one token and one vendor, one at a time:
//! - the sender pays a flat fee up front, kept even if the call reverts
//! - call value moves to the vendor before the vendor runs
//! - the whole call (value, token and native moves, vendor state) is undone
//!   from a snapshot if any step fails
//!
//! Contract addresses are derived from the deployer and its nonce.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use types::address::{Address, ADDRESS_LEN};
use types::units::{TokenAmount, Wei};
use uuid::Uuid;

use crate::bank::{NativeBank, NativeLedger};
use crate::config::ChainConfig;
use crate::errors::{BankError, ChainError};
use crate::events::ContractEvent;
use crate::token::{Erc20Token, FungibleToken};
use crate::vendor::{CallContext, Vendor};

/// Record of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: Uuid,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub value: Wei,
    pub fee: Wei,
    /// Set for contract deployments
    pub contract_address: Option<Address>,
    pub events: Vec<ContractEvent>,
    /// Unix milliseconds
    pub executed_at: i64,
}

/// Derive a contract address from its deployer and the deployer's nonce.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
    Address::new(bytes)
}

/// Single-token, single-vendor local chain.
#[derive(Debug)]
pub struct Chain {
    config: ChainConfig,
    bank: NativeLedger,
    token: Option<Erc20Token>,
    vendor: Option<Vendor>,
    nonces: HashMap<Address, u64>,
    fees_burned: Wei,
}

/// State restored when a transaction reverts.
struct Snapshot {
    bank: NativeLedger,
    token: Option<Erc20Token>,
    vendor: Option<Vendor>,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;
        info!(
            tx_fee = %config.tx_fee,
            tokens_per_native = config.vendor.tokens_per_native,
            "Chain initialized"
        );
        Ok(Self {
            config,
            bank: NativeLedger::new(),
            token: None,
            vendor: None,
            nonces: HashMap::new(),
            fees_burned: Wei::ZERO,
        })
    }

    /// Create a chain with default configuration.
    pub fn with_defaults() -> Result<Self, ChainError> {
        Self::new(ChainConfig::default())
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    // ───────────────────────── Genesis ─────────────────────────

    /// Credit a genesis balance.
    pub fn fund(&mut self, who: Address, amount: Wei) -> Result<(), ChainError> {
        self.bank.mint(&who, amount)?;
        Ok(())
    }

    /// Make `who` refuse incoming native transfers.
    pub fn reject_native(&mut self, who: Address) {
        self.bank.reject_incoming(who);
    }

    /// Let `who` accept incoming native transfers again.
    pub fn accept_native(&mut self, who: &Address) {
        self.bank.accept_incoming(who);
    }

    // ───────────────────────── Deployment ─────────────────────────

    /// Deploy the token; the deployer receives the whole initial supply.
    pub fn deploy_token(&mut self, deployer: Address) -> Result<Receipt, ChainError> {
        if self.token.is_some() {
            return Err(ChainError::AlreadyDeployed { contract: "Token" });
        }
        let address = contract_address(&deployer, self.nonce(&deployer));
        let mut receipt = self.execute(deployer, None, Wei::ZERO, |chain| {
            let token = Erc20Token::new(address, &chain.config.token, deployer);
            chain.token = Some(token);
            Ok(())
        })?;
        receipt.contract_address = Some(address);
        info!(%address, %deployer, "Token deployed");
        Ok(receipt)
    }

    /// Deploy the vendor against the already-deployed token.
    pub fn deploy_vendor(&mut self, deployer: Address) -> Result<Receipt, ChainError> {
        if self.vendor.is_some() {
            return Err(ChainError::AlreadyDeployed { contract: "Vendor" });
        }
        let token = self.token_ref()?.address();
        let address = contract_address(&deployer, self.nonce(&deployer));
        let mut receipt = self.execute(deployer, None, Wei::ZERO, |chain| {
            let vendor = Vendor::new(address, token, deployer, &chain.config.vendor)?;
            chain.vendor = Some(vendor);
            Ok(())
        })?;
        receipt.contract_address = Some(address);
        Ok(receipt)
    }

    // ───────────────────────── Token transactions ─────────────────────────

    pub fn token_transfer(
        &mut self,
        sender: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<Receipt, ChainError> {
        let target = self.token_ref()?.address();
        self.execute(sender, Some(target), Wei::ZERO, |chain| {
            chain.token_mut()?.transfer(&sender, &to, amount)?;
            Ok(())
        })
    }

    pub fn token_approve(
        &mut self,
        sender: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<Receipt, ChainError> {
        let target = self.token_ref()?.address();
        self.execute(sender, Some(target), Wei::ZERO, |chain| {
            chain.token_mut()?.approve(&sender, &spender, amount)?;
            Ok(())
        })
    }

    // ───────────────────────── Vendor transactions ─────────────────────────

    /// Buy tokens with `value` native currency attached.
    pub fn buy_tokens(&mut self, sender: Address, value: Wei) -> Result<Receipt, ChainError> {
        let target = self.vendor_ref()?.address();
        self.execute(sender, Some(target), value, |chain| {
            let (vendor, token, _) = chain.vendor_parts()?;
            vendor.buy_tokens(&CallContext::with_value(sender, value), token)?;
            Ok(())
        })
    }

    pub fn sell_tokens(
        &mut self,
        sender: Address,
        amount: TokenAmount,
    ) -> Result<Receipt, ChainError> {
        let target = self.vendor_ref()?.address();
        self.execute(sender, Some(target), Wei::ZERO, |chain| {
            let (vendor, token, bank) = chain.vendor_parts()?;
            vendor.sell_tokens(&CallContext::new(sender), amount, token, bank)?;
            Ok(())
        })
    }

    pub fn withdraw(&mut self, sender: Address) -> Result<Receipt, ChainError> {
        let target = self.vendor_ref()?.address();
        self.execute(sender, Some(target), Wei::ZERO, |chain| {
            let (vendor, _, bank) = chain.vendor_parts()?;
            vendor.withdraw(&CallContext::new(sender), bank)?;
            Ok(())
        })
    }

    pub fn transfer_ownership(
        &mut self,
        sender: Address,
        new_owner: Address,
    ) -> Result<Receipt, ChainError> {
        let target = self.vendor_ref()?.address();
        self.execute(sender, Some(target), Wei::ZERO, |chain| {
            let (vendor, _, _) = chain.vendor_parts()?;
            vendor.transfer_ownership(&CallContext::new(sender), new_owner)?;
            Ok(())
        })
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn native_balance(&self, who: &Address) -> Wei {
        self.bank.balance_of(who)
    }

    pub fn token_balance(&self, who: &Address) -> TokenAmount {
        self.token
            .as_ref()
            .map(|t| t.balance_of(who))
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.token
            .as_ref()
            .map(|t| t.allowance(owner, spender))
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn total_supply(&self) -> Result<TokenAmount, ChainError> {
        Ok(self.token_ref()?.total_supply())
    }

    pub fn token_address(&self) -> Result<Address, ChainError> {
        Ok(self.token_ref()?.address())
    }

    pub fn vendor_address(&self) -> Result<Address, ChainError> {
        Ok(self.vendor_ref()?.address())
    }

    pub fn vendor_owner(&self) -> Result<Address, ChainError> {
        Ok(self.vendor_ref()?.owner())
    }

    pub fn token(&self) -> Option<&Erc20Token> {
        self.token.as_ref()
    }

    pub fn vendor(&self) -> Option<&Vendor> {
        self.vendor.as_ref()
    }

    /// Number of transactions sent by `who`, reverted ones included.
    pub fn nonce(&self, who: &Address) -> u64 {
        self.nonces.get(who).copied().unwrap_or(0)
    }

    /// Native currency destroyed as transaction fees.
    pub fn fees_burned(&self) -> Wei {
        self.fees_burned
    }

    /// Sum of all native balances.
    pub fn native_supply(&self) -> Option<Wei> {
        self.bank.total()
    }

    // ───────────────────────── Execution ─────────────────────────

    fn execute<F>(
        &mut self,
        sender: Address,
        to: Option<Address>,
        value: Wei,
        op: F,
    ) -> Result<Receipt, ChainError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainError>,
    {
        let fee = self.config.tx_fee;
        let available = self.bank.balance_of(&sender);
        let required = fee.checked_add(value).ok_or(BankError::Overflow)?;
        if required > available {
            return Err(ChainError::InsufficientFundsForFee {
                required,
                available,
            });
        }
        debug!(%sender, required = %required, "Charging transaction fee");

        let fees_burned = self
            .fees_burned
            .checked_add(fee)
            .ok_or(BankError::Overflow)?;
        self.bank.burn(&sender, fee)?;
        self.fees_burned = fees_burned;
        let nonce = self.nonce(&sender);
        self.nonces.insert(sender, nonce + 1);

        let snapshot = self.snapshot();
        let mut outcome: Result<(), ChainError> = Ok(());
        if let Some(target) = to {
            if !value.is_zero() {
                outcome = self.bank.send(&sender, &target, value).map_err(ChainError::from);
            }
        }
        let outcome = outcome.and_then(|()| op(self));

        if let Err(err) = outcome {
            self.restore(snapshot);
            warn!(%sender, nonce, error = %err, "Transaction reverted");
            return Err(err);
        }

        let mut events = Vec::new();
        if let Some(token) = self.token.as_mut() {
            events.extend(token.drain_events());
        }
        if let Some(vendor) = self.vendor.as_mut() {
            events.extend(vendor.drain_events());
        }

        Ok(Receipt {
            tx_id: Uuid::now_v7(),
            from: sender,
            to,
            nonce,
            value,
            fee,
            contract_address: None,
            events,
            executed_at: Utc::now().timestamp_millis(),
        })
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            bank: self.bank.clone(),
            token: self.token.clone(),
            vendor: self.vendor.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.bank = snapshot.bank;
        self.token = snapshot.token;
        self.vendor = snapshot.vendor;
    }

    fn token_ref(&self) -> Result<&Erc20Token, ChainError> {
        self.token
            .as_ref()
            .ok_or(ChainError::NotDeployed { contract: "Token" })
    }

    fn token_mut(&mut self) -> Result<&mut Erc20Token, ChainError> {
        self.token
            .as_mut()
            .ok_or(ChainError::NotDeployed { contract: "Token" })
    }

    fn vendor_ref(&self) -> Result<&Vendor, ChainError> {
        self.vendor
            .as_ref()
            .ok_or(ChainError::NotDeployed { contract: "Vendor" })
    }

    fn vendor_parts(
        &mut self,
    ) -> Result<(&mut Vendor, &mut Erc20Token, &mut NativeLedger), ChainError> {
        let vendor = self
            .vendor
            .as_mut()
            .ok_or(ChainError::NotDeployed { contract: "Vendor" })?;
        let token = self
            .token
            .as_mut()
            .ok_or(ChainError::NotDeployed { contract: "Token" })?;
        Ok((vendor, token, &mut self.bank))
    }
}

impl TryFrom<&str> for Chain {
    type Error = ChainError;

    /// Build a chain from a JSON configuration document.
    fn try_from(json: &str) -> Result<Self, Self::Error> {
        Chain::new(ChainConfig::from_json(json)?)
    }
}
