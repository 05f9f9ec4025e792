//! Domain models for the Olive Edge API.
//!
//! These types represent validated domain objects separate from database
//! row types. The `Order` model additionally carries the pure state
//! transition guards so the lifecycle rules are testable without a
//! database.

pub mod order;
pub mod product;
pub mod user;

pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderStateError, PaymentResult, ShippingAddress,
};
pub use product::{Product, ProductInput, Review};
pub use user::{CurrentUser, User, session_keys};
