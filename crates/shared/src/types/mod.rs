//! Common types used across the application.

pub mod pagination;
pub mod patch;

#[cfg(test)]
mod pagination_tests;

pub use pagination::{PageMeta, PageRequest, PageResponse};
pub use patch::double_option;
