//! Core types for Bodegón.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod discount;
pub mod email;
pub mod id;
pub mod status;
pub mod tracking;

pub use category::normalize_category_name;
pub use discount::{Discount, DiscountError};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::OrderStatus;
pub use tracking::{TrackingNumber, TrackingNumberError};
