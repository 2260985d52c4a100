//! Sale totals, installment schedules and status transitions.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::VendaError;
pub use service::VendaService;
pub use types::{ItemCalculado, ItemInput, Parcela, StatusVenda, TotaisVenda};
