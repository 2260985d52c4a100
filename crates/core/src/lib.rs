//! Core business rules for Gestor.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Validation, totals, settlement rules and report calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing and strength rules
//! - `validation` - Field validation (CPF, CNPJ, e-mail, CEP, UF)
//! - `permissions` - Permission catalog and level hierarchy
//! - `security` - Rate-limit and CSRF policies
//! - `vendas` - Sale totals, installments and status transitions
//! - `financeiro` - Payable/receivable settlement
//! - `frota` - Fleet fuel consumption

pub mod auth;
pub mod financeiro;
pub mod frota;
pub mod permissions;
pub mod security;
pub mod validation;
pub mod vendas;
