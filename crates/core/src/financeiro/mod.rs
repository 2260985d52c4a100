//! Payable (pagamento) and receivable (recebimento) settlement rules.
//!
//! Both kinds share the same lifecycle and differ only in the label of the settled
//! status: `pago` for payables, `recebido` for receivables.

mod service;
mod types;

pub use service::{FinanceiroError, FinanceiroService};
pub use types::{Baixa, ResumoFinanceiro, StatusTitulo, TipoTitulo, Titulo};
