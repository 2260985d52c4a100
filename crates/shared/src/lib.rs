//! Shared types, errors, and configuration for Gestor.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod error_tests;
#[cfg(test)]
mod jwt_tests;

pub use auth::{AlterarSenhaRequest, Claims, LoginRequest, RefreshRequest, TokenPair, TokenType};
pub use config::{AppConfig, CrmConfig, CrmProviderKind, SecurityConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use types::{PageMeta, PageRequest, PageResponse};
