//! Business services: authentication, order lifecycle, payments, email.

pub mod auth;
pub mod notifications;
pub mod orders;
pub mod razorpay;
