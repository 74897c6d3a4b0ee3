//! Token Vendor Contract Logic
//!
//! This crate implements a fixed-rate exchange between a chain's native
//! currency and a single fungible token held in the vendor's custody,
//! together with the pieces it runs against.
//!
//! # Modules
//! - `vendor`: The exchange ledger (buy, sell, withdraw, ownership transfer)
//! - `token`: Fungible token interface and in-memory ERC-20 style token
//! - `bank`: Native currency accounting interface and ledger
//! - `chain`: Local execution substrate with fees and all-or-nothing calls
//! - `security`: Reentrancy guard and single-owner access control
//! - `config`: Deployment configuration
//! - `events`: Contract events
//! - `errors`: Contract-specific error types

pub mod bank;
pub mod chain;
pub mod config;
pub mod errors;
pub mod events;
pub mod security;
pub mod token;
pub mod vendor;

/// Contract ABI version (frozen after release)
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
