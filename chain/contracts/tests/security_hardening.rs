//! Security Hardening Tests
//!
//! Adversarial and property-based testing of the vendor:
//! - Arithmetic overflow
//! - Permission escalation
//! - Solvency (never pays out more than it holds)
//! - Atomicity of reverted calls
//! - Fuzz testing (proptest) of random operation sequences
//! - Upgrade path (ABI freeze)

use contracts::bank::{NativeBank, NativeLedger};
use contracts::chain::Chain;
use contracts::config::{TokenConfig, VendorConfig};
use contracts::errors::{ChainError, VendorError};
use contracts::token::{Erc20Token, FungibleToken};
use contracts::vendor::{CallContext, Vendor};
use contracts::CONTRACT_ABI_VERSION;
use types::address::Address;
use types::units::{TokenAmount, Wei};

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn setup_chain() -> Chain {
    let mut chain = Chain::with_defaults().unwrap();
    for n in 1..=3 {
        chain.fund(addr(n), Wei::from_whole(1_000)).unwrap();
    }
    chain.deploy_token(addr(1)).unwrap();
    chain.deploy_vendor(addr(1)).unwrap();
    let vendor = chain.vendor_address().unwrap();
    chain
        .token_transfer(addr(1), vendor, TokenAmount::from_whole(1000))
        .unwrap();
    chain
}

// ═══════════════════════════════════════════════════════════════════
// Overflow Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_buy_overflow_rejected_before_transfer() {
    let mut token = Erc20Token::new(addr(400), &TokenConfig::default(), addr(1));
    let mut vendor = Vendor::new(addr(500), addr(400), addr(1), &VendorConfig::default()).unwrap();
    token
        .transfer(&addr(1), &addr(500), TokenAmount::from_whole(1000))
        .unwrap();

    let ctx = CallContext::with_value(addr(2), Wei::new(u128::MAX / 2));
    let result = vendor.buy_tokens(&ctx, &mut token);

    assert_eq!(result, Err(VendorError::Overflow));
    assert_eq!(token.balance_of(&addr(500)), TokenAmount::from_whole(1000));
}

#[test]
fn test_huge_sell_rejected() {
    let mut chain = setup_chain();
    let vendor = chain.vendor_address().unwrap();
    let huge = TokenAmount::new(u128::MAX - u128::MAX % 100);
    chain.token_approve(addr(2), vendor, huge).unwrap();

    let err = chain.sell_tokens(addr(2), huge).unwrap_err();

    // no tokens held, so the balance check trips first
    assert!(matches!(
        err,
        ChainError::Vendor(VendorError::InsufficientTokenBalance { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Permission Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_non_owner_cannot_withdraw() {
    let mut chain = setup_chain();
    chain.buy_tokens(addr(2), Wei::from_whole(1)).unwrap();
    for attacker in [addr(2), addr(3), Address::ZERO] {
        let err = chain.withdraw(attacker);
        assert!(err.is_err());
    }
    assert_eq!(
        chain.native_balance(&chain.vendor_address().unwrap()),
        Wei::from_whole(1)
    );
}

#[test]
fn test_former_owner_loses_rights() {
    let mut chain = setup_chain();
    chain.transfer_ownership(addr(1), addr(2)).unwrap();
    assert!(matches!(
        chain.transfer_ownership(addr(1), addr(1)),
        Err(ChainError::Vendor(VendorError::NotOwner { .. }))
    ));
    assert!(matches!(
        chain.withdraw(addr(1)),
        Err(ChainError::Vendor(VendorError::NotOwner { .. }))
    ));
}

#[test]
fn test_vendor_cannot_be_drained_via_allowance() {
    let mut chain = setup_chain();
    let vendor = chain.vendor_address().unwrap();
    // an attacker approving itself for the vendor's tokens means nothing
    chain
        .token_approve(addr(3), vendor, TokenAmount::from_whole(1000))
        .unwrap();
    let err = chain
        .sell_tokens(addr(3), TokenAmount::from_whole(100))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Vendor(VendorError::InsufficientTokenBalance { .. })
    ));
    assert_eq!(chain.token_balance(&vendor), TokenAmount::from_whole(1000));
}

// ═══════════════════════════════════════════════════════════════════
// Solvency Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_sell_limited_by_reserve() {
    let mut chain = setup_chain();
    let vendor = chain.vendor_address().unwrap();
    chain.buy_tokens(addr(2), Wei::from_whole(1)).unwrap();
    chain.buy_tokens(addr(3), Wei::from_whole(1)).unwrap();
    chain.withdraw(addr(1)).unwrap();
    chain.buy_tokens(addr(3), Wei::parse("0.5").unwrap()).unwrap();

    chain
        .token_approve(addr(2), vendor, TokenAmount::from_whole(100))
        .unwrap();
    let err = chain
        .sell_tokens(addr(2), TokenAmount::from_whole(100))
        .unwrap_err();
    assert_eq!(
        err,
        ChainError::Vendor(VendorError::InsufficientNativeReserve {
            required: Wei::from_whole(1),
            available: Wei::parse("0.5").unwrap(),
        })
    );

    chain
        .sell_tokens(addr(2), TokenAmount::from_whole(50))
        .unwrap();
    assert_eq!(chain.native_balance(&vendor), Wei::ZERO);
}

#[test]
fn test_standalone_vendor_reads_reserve_from_bank() {
    let mut bank = NativeLedger::new();
    let vendor = Vendor::new(addr(500), addr(400), addr(1), &VendorConfig::default()).unwrap();
    bank.mint(&addr(500), Wei::new(42)).unwrap();
    assert_eq!(vendor.native_reserve(&bank), Wei::new(42));
    assert_eq!(bank.balance_of(&addr(500)), Wei::new(42));
}

// ═══════════════════════════════════════════════════════════════════
// Upgrade Path
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_abi_version_frozen() {
    assert_eq!(CONTRACT_ABI_VERSION, "1.0.0");
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

    #[derive(Debug, Clone)]
    enum Op {
        Buy { actor: u64, wei: u128 },
        Sell { actor: u64, amount: u128 },
        Approve { actor: u64, amount: u128 },
        Withdraw { actor: u64 },
        TransferOwnership { actor: u64, target: u64 },
    }

    fn actor() -> impl Strategy<Value = u64> {
        1u64..=3
    }

    /// Mix of whole-token multiples and arbitrary base-unit amounts.
    fn token_amount() -> impl Strategy<Value = u128> {
        prop_oneof![
            (1u128..=300).prop_map(|n| n * WEI_PER_ETHER),
            0u128..=1_000,
        ]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (actor(), 0u128..=5 * WEI_PER_ETHER).prop_map(|(actor, wei)| Op::Buy { actor, wei }),
            (actor(), token_amount()).prop_map(|(actor, amount)| Op::Sell { actor, amount }),
            (actor(), token_amount()).prop_map(|(actor, amount)| Op::Approve { actor, amount }),
            actor().prop_map(|actor| Op::Withdraw { actor }),
            (actor(), actor()).prop_map(|(actor, target)| Op::TransferOwnership { actor, target }),
        ]
    }

    fn sender(op: &Op) -> Address {
        match op {
            Op::Buy { actor, .. }
            | Op::Sell { actor, .. }
            | Op::Approve { actor, .. }
            | Op::Withdraw { actor }
            | Op::TransferOwnership { actor, .. } => addr(*actor),
        }
    }

    fn apply(chain: &mut Chain, op: &Op) -> Result<(), ChainError> {
        let vendor = chain.vendor_address()?;
        let receipt = match op {
            Op::Buy { actor, wei } => chain.buy_tokens(addr(*actor), Wei::new(*wei)),
            Op::Sell { actor, amount } => chain.sell_tokens(addr(*actor), TokenAmount::new(*amount)),
            Op::Approve { actor, amount } => {
                chain.token_approve(addr(*actor), vendor, TokenAmount::new(*amount))
            }
            Op::Withdraw { actor } => chain.withdraw(addr(*actor)),
            Op::TransferOwnership { actor, target } => {
                chain.transfer_ownership(addr(*actor), addr(*target))
            }
        };
        receipt.map(|_| ())
    }

    /// Token and native balances of every participant, vendor last.
    fn balances(chain: &Chain) -> Vec<(TokenAmount, Wei)> {
        let vendor = chain.vendor_address().unwrap();
        (1..=3)
            .map(addr)
            .chain(std::iter::once(vendor))
            .map(|a| (chain.token_balance(&a), chain.native_balance(&a)))
            .collect()
    }

    proptest! {
        /// Invariant: a buy either credits exactly `paid × 100` tokens or
        /// fails with InsufficientInventory and moves nothing but the fee.
        #[test]
        fn fuzz_buy_rate_and_conservation(wei in 1u128..=20 * WEI_PER_ETHER) {
            let mut chain = setup_chain();
            let vendor = chain.vendor_address().unwrap();
            let fee = chain.config().tx_fee;
            let before = balances(&chain);

            let result = chain.buy_tokens(addr(2), Wei::new(wei));
            let after = balances(&chain);
            let expected = wei * 100;

            if expected <= TokenAmount::from_whole(1000).get() {
                prop_assert!(result.is_ok());
                prop_assert_eq!(after[1].0.get(), before[1].0.get() + expected);
                prop_assert_eq!(after[3].0.get(), before[3].0.get() - expected);
                prop_assert_eq!(chain.native_balance(&vendor).get(), wei);
            } else {
                let is_inventory_error = matches!(
                    result,
                    Err(ChainError::Vendor(VendorError::InsufficientInventory { .. }))
                );
                prop_assert!(is_inventory_error);
                prop_assert_eq!(after[3], before[3]);
                prop_assert_eq!(after[1].0, before[1].0);
                prop_assert_eq!(after[1].1.get(), before[1].1.get() - fee.get());
            }
        }

        /// Invariant: non-multiples of the rate are always rejected with no
        /// balance change besides the fee.
        #[test]
        fn fuzz_sell_non_multiple_rejected(amount in 1u128..=1_000_000u128) {
            prop_assume!(amount % 100 != 0);
            let mut chain = setup_chain();
            chain.buy_tokens(addr(2), Wei::from_whole(1)).unwrap();
            let vendor = chain.vendor_address().unwrap();
            chain.token_approve(addr(2), vendor, TokenAmount::new(amount)).unwrap();
            let before = balances(&chain);

            let result = chain.sell_tokens(addr(2), TokenAmount::new(amount));

            let is_quantity_error = matches!(
                result,
                Err(ChainError::Vendor(VendorError::InvalidSellQuantity { .. }))
            );
            prop_assert!(is_quantity_error);
            let after = balances(&chain);
            prop_assert_eq!(after[3], before[3]);
            prop_assert_eq!(after[1].0, before[1].0);
        }

        /// Invariant: selling a positive multiple of the rate pays exactly
        /// `amount / 100` native units and moves exactly `amount` into custody.
        #[test]
        fn fuzz_sell_rate_exact(units in 1u128..=5 * WEI_PER_ETHER) {
            let amount = units * 100;
            let mut chain = setup_chain();
            let vendor = chain.vendor_address().unwrap();
            let fee = chain.config().tx_fee.get();
            chain.buy_tokens(addr(2), Wei::from_whole(5)).unwrap();
            chain.token_approve(addr(2), vendor, TokenAmount::new(amount)).unwrap();
            let before = balances(&chain);

            let receipt = chain.sell_tokens(addr(2), TokenAmount::new(amount));

            prop_assert!(receipt.is_ok());
            let after = balances(&chain);
            prop_assert_eq!(after[1].1.get() + fee, before[1].1.get() + units);
            prop_assert_eq!(after[1].0.get() + amount, before[1].0.get());
            prop_assert_eq!(after[3].0.get(), before[3].0.get() + amount);
            prop_assert_eq!(after[3].1.get() + units, before[3].1.get());
            prop_assert_eq!(chain.allowance(&addr(2), &vendor), TokenAmount::ZERO);
        }

        /// Invariants over random operation sequences:
        /// - token supply is conserved across all holders
        /// - native currency is conserved up to burned fees
        /// - a failed call changes nothing except the sender's fee
        #[test]
        fn fuzz_operation_sequences(ops in prop::collection::vec(op(), 1..40)) {
            let mut chain = setup_chain();
            let supply = chain.total_supply().unwrap();
            let native_total = chain.native_supply().unwrap().get() + chain.fees_burned().get();
            let fee = chain.config().tx_fee.get();

            for op in &ops {
                let before = balances(&chain);
                let owner_before = chain.vendor_owner().unwrap();
                let result = apply(&mut chain, op);
                let after = balances(&chain);

                let token_sum: u128 = after.iter().map(|(t, _)| t.get()).sum();
                prop_assert_eq!(token_sum, supply.get());
                prop_assert_eq!(
                    chain.native_supply().unwrap().get() + chain.fees_burned().get(),
                    native_total
                );

                if result.is_err() {
                    prop_assert_eq!(chain.vendor_owner().unwrap(), owner_before);
                    let who = (1..=3).position(|n| addr(n) == sender(op)).unwrap();
                    for (i, (b, a)) in before.iter().zip(after.iter()).enumerate() {
                        prop_assert_eq!(a.0, b.0);
                        if i == who {
                            prop_assert_eq!(a.1.get(), b.1.get() - fee);
                        } else {
                            prop_assert_eq!(a.1, b.1);
                        }
                    }
                }
            }
        }
    }
}
