//! Wendy Woo Core - Shared types library.
//!
//! This crate provides the types used across the Wendy Woo components:
//! - `storefront` - Public-facing shop (catalog, cart, accounts, enquiries)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The session cart state machine lives here so it can be
//! exercised without a session store or a catalog.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and ratings
//! - [`cart`] - Cart mapping, quantity normalization and reconciliation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartLine, CartState, CartSummary, Priced, QuantityUpdate, Reconciliation};
pub use types::*;
