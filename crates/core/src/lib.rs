//! Bodegón Core - Shared domain types and pricing rules.
//!
//! This crate provides the types used across all Bodegón components:
//! - `api` - REST backend for categories, products and orders
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, discounts, statuses
//!   and tracking numbers
//! - [`pricing`] - Line-item and order total computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PricingError, compute_item_total, compute_order_total};
pub use types::*;
