//! Sale error types.

use gestor_shared::AppError;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Sale-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VendaError {
    /// Item fields failed validation.
    #[error("invalid sale: {0}")]
    Invalida(FieldErrors),

    /// Installment count outside `1..=max_parcelas`.
    #[error("installments must be between 1 and {max}")]
    ParcelasExcedidas {
        /// Maximum allowed by the payment method.
        max: i32,
    },

    /// Status change not allowed.
    #[error("cannot change sale from {de} to {para}")]
    TransicaoInvalida {
        /// Current status.
        de: &'static str,
        /// Requested status.
        para: &'static str,
    },

    /// Only `observacoes` may change once a sale is no longer open.
    #[error("sale is {0} and cannot be edited")]
    NaoEditavel(&'static str),

    /// A settled receivable blocks cancellation.
    #[error("sale has settled receivables")]
    RecebimentoLiquidado,
}

impl From<VendaError> for AppError {
    fn from(err: VendaError) -> Self {
        match err {
            VendaError::Invalida(errors) => errors.into(),
            VendaError::ParcelasExcedidas { .. } => Self::Validation(err.to_string()),
            other => Self::BusinessRule(other.to_string()),
        }
    }
}
