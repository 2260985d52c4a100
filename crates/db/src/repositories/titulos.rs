//! Pieces shared by the payable and receivable repositories.

use chrono::{NaiveDate, Utc};
use gestor_core::financeiro::{FinanceiroService, StatusTitulo, TipoTitulo, Titulo};
use gestor_core::validation::FieldErrors;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::RepositoryError;

/// Body of the `baixar` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BaixaInput {
    /// Amount settled now.
    pub valor: Decimal,
    /// Settlement date; defaults to today.
    pub data: Option<NaiveDate>,
    /// Account that moved the money.
    pub conta_bancaria_id: Option<Uuid>,
}

/// A stored row plus its derived `situacao` (`vencido` when overdue).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComSituacao<M> {
    /// The row.
    #[serde(flatten)]
    pub registro: M,
    /// Stored status or `vencido`.
    pub situacao: &'static str,
}

/// Hoje, in UTC.
#[must_use]
pub fn hoje() -> NaiveDate {
    Utc::now().date_naive()
}

/// Builds the settlement view of a stored row.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidState` for an unknown stored status.
pub fn titulo(
    valor: Decimal,
    valor_liquidado: Decimal,
    status: &str,
    vencimento: NaiveDate,
) -> Result<Titulo, RepositoryError> {
    let status = StatusTitulo::parse(status)
        .ok_or_else(|| RepositoryError::InvalidState(format!("unknown status '{status}'")))?;
    Ok(Titulo {
        valor,
        valor_liquidado,
        status,
        vencimento,
    })
}

/// Attaches `situacao` to a row.
pub fn com_situacao<M>(
    registro: M,
    titulo: &Titulo,
    tipo: TipoTitulo,
    hoje: NaiveDate,
) -> ComSituacao<M> {
    ComSituacao {
        registro,
        situacao: FinanceiroService::situacao(titulo, tipo, hoje),
    }
}

/// Parses the `status` list filter. `vencido` is accepted and means
/// "open and past due".
///
/// # Errors
///
/// Returns a validation error for unknown values.
pub fn filtro_status(valor: &str, tipo: TipoTitulo) -> Result<FiltroStatus, RepositoryError> {
    if valor == "vencido" {
        return Ok(FiltroStatus::Vencido);
    }
    match StatusTitulo::parse(valor) {
        Some(status) if status.as_str(tipo) == valor => Ok(FiltroStatus::Armazenado(status)),
        _ => Err(FieldErrors::single("status", format!("status desconhecido: {valor}")).into()),
    }
}

/// Parsed `status` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiltroStatus {
    /// Stored status.
    Armazenado(StatusTitulo),
    /// Derived overdue state.
    Vencido,
}

/// Stored values of the open statuses.
#[must_use]
pub fn status_abertos(tipo: TipoTitulo) -> [&'static str; 2] {
    [
        StatusTitulo::Pendente.as_str(tipo),
        StatusTitulo::Parcial.as_str(tipo),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_filter_matches_the_kind() {
        assert_eq!(
            filtro_status("pago", TipoTitulo::Pagamento).unwrap(),
            FiltroStatus::Armazenado(StatusTitulo::Liquidado)
        );
        assert!(filtro_status("pago", TipoTitulo::Recebimento).is_err());
        assert_eq!(
            filtro_status("vencido", TipoTitulo::Recebimento).unwrap(),
            FiltroStatus::Vencido
        );
        assert!(filtro_status("aberto", TipoTitulo::Pagamento).is_err());
    }

    #[test]
    fn test_situacao_is_derived() {
        let dia = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let t = titulo(dec!(10), dec!(0), "pendente", dia).unwrap();
        let view = com_situacao((), &t, TipoTitulo::Pagamento, dia.succ_opt().unwrap());
        assert_eq!(view.situacao, "vencido");
        let view = com_situacao((), &t, TipoTitulo::Pagamento, dia);
        assert_eq!(view.situacao, "pendente");
    }

    #[test]
    fn test_unknown_stored_status() {
        let dia = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(matches!(
            titulo(dec!(1), dec!(0), "???", dia),
            Err(RepositoryError::InvalidState(_))
        ));
    }
}
