//! Request middleware: authentication, CSRF validation and rate limiting.

pub mod auth;
pub mod csrf;
pub mod rate_limit;
