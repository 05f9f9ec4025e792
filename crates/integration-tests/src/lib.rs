//! Integration tests for Olive Edge.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p olive-edge-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `payment_signature` - End-to-end signature verification against
//!   gateway-style signatures
//! - `order_pricing` - The pricing rules across crate boundaries
//! - `order_lifecycle` - Transition guards and the tracking projection
//!
//! The suites exercise the crates' public APIs the way the running system
//! composes them; none of them needs a live database or gateway.
