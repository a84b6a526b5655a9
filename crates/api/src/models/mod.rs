//! Domain models for the API.
//!
//! These are plain data holders, separate from database row types and from
//! the wire views in [`crate::views`].

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{Category, NewCategory, NewProduct, Product, ProductPatch};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use user::{NewUser, User, UserPatch};
