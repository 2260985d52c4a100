use chrono::NaiveDate;
use gestor_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{Baixa, ResumoFinanceiro, StatusTitulo, TipoTitulo, Titulo};

/// Settlement errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinanceiroError {
    /// Settlement value must be positive.
    #[error("settlement value must be greater than zero")]
    ValorInvalido,

    /// Settlement values are stored in cents.
    #[error("settlement value must have at most 2 decimal places")]
    CasasDecimais,

    /// Value above the open balance.
    #[error("settlement value {valor} exceeds open balance {saldo}")]
    ValorAcimaDoSaldo {
        /// Requested value.
        valor: Decimal,
        /// Open balance.
        saldo: Decimal,
    },

    /// Cancelled items accept no operation.
    #[error("item is cancelled")]
    Cancelado,

    /// Fully settled items cannot be settled again.
    #[error("item is already settled")]
    JaLiquidado,

    /// Nothing to reverse.
    #[error("item has no settlement to reverse")]
    SemLiquidacao,

    /// Cancellation requires no settled amount.
    #[error("item has settled amounts and cannot be cancelled")]
    PossuiLiquidacao,
}

impl From<FinanceiroError> for AppError {
    fn from(err: FinanceiroError) -> Self {
        match err {
            FinanceiroError::ValorInvalido
            | FinanceiroError::CasasDecimais
            | FinanceiroError::ValorAcimaDoSaldo { .. } => {
                Self::Validation(err.to_string())
            }
            other => Self::BusinessRule(other.to_string()),
        }
    }
}

/// Stateless settlement rules.
pub struct FinanceiroService;

impl FinanceiroService {
    /// Settles `valor` against the open balance.
    ///
    /// # Errors
    ///
    /// Fails for cancelled or fully settled items, non-positive values, values
    /// with sub-cent precision and values above the open balance.
    pub fn baixar(titulo: &Titulo, valor: Decimal) -> Result<Baixa, FinanceiroError> {
        match titulo.status {
            StatusTitulo::Cancelado => return Err(FinanceiroError::Cancelado),
            StatusTitulo::Liquidado => return Err(FinanceiroError::JaLiquidado),
            StatusTitulo::Pendente | StatusTitulo::Parcial => {}
        }
        if valor <= Decimal::ZERO {
            return Err(FinanceiroError::ValorInvalido);
        }
        if valor.normalize().scale() > 2 {
            return Err(FinanceiroError::CasasDecimais);
        }
        let saldo = titulo.saldo();
        if valor > saldo {
            return Err(FinanceiroError::ValorAcimaDoSaldo { valor, saldo });
        }

        let valor_liquidado = titulo.valor_liquidado + valor;
        let status = if valor_liquidado >= titulo.valor {
            StatusTitulo::Liquidado
        } else {
            StatusTitulo::Parcial
        };
        Ok(Baixa {
            valor_liquidado,
            status,
        })
    }

    /// Reverts every settlement.
    ///
    /// # Errors
    ///
    /// Fails for cancelled items and items with nothing settled.
    pub fn estornar(titulo: &Titulo) -> Result<Baixa, FinanceiroError> {
        if titulo.status == StatusTitulo::Cancelado {
            return Err(FinanceiroError::Cancelado);
        }
        if titulo.valor_liquidado <= Decimal::ZERO {
            return Err(FinanceiroError::SemLiquidacao);
        }
        Ok(Baixa {
            valor_liquidado: Decimal::ZERO,
            status: StatusTitulo::Pendente,
        })
    }

    /// Checks that an item may be cancelled.
    ///
    /// # Errors
    ///
    /// Fails when already cancelled or when anything was settled.
    pub fn validar_cancelamento(titulo: &Titulo) -> Result<(), FinanceiroError> {
        if titulo.status == StatusTitulo::Cancelado {
            return Err(FinanceiroError::Cancelado);
        }
        if titulo.valor_liquidado > Decimal::ZERO {
            return Err(FinanceiroError::PossuiLiquidacao);
        }
        Ok(())
    }

    /// True when open and past due.
    #[must_use]
    pub fn vencido(titulo: &Titulo, hoje: NaiveDate) -> bool {
        titulo.status.em_aberto() && titulo.vencimento < hoje
    }

    /// Status shown to clients: the stored one, or `vencido` when overdue.
    #[must_use]
    pub fn situacao(titulo: &Titulo, tipo: TipoTitulo, hoje: NaiveDate) -> &'static str {
        if Self::vencido(titulo, hoje) {
            "vencido"
        } else {
            titulo.status.as_str(tipo)
        }
    }

    /// Aggregates open, overdue and settled totals. Cancelled items are ignored.
    #[must_use]
    pub fn resumir<'a>(
        titulos: impl IntoIterator<Item = &'a Titulo>,
        hoje: NaiveDate,
    ) -> ResumoFinanceiro {
        titulos
            .into_iter()
            .filter(|t| t.status != StatusTitulo::Cancelado)
            .fold(ResumoFinanceiro::default(), |mut acc, t| {
                acc.total_liquidado += t.valor_liquidado;
                if t.status.em_aberto() {
                    acc.total_aberto += t.saldo();
                    acc.quantidade_aberta += 1;
                    if Self::vencido(t, hoje) {
                        acc.total_vencido += t.saldo();
                        acc.quantidade_vencida += 1;
                    }
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn hoje() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn titulo(valor: Decimal, liquidado: Decimal, status: StatusTitulo, dia: u32) -> Titulo {
        Titulo {
            valor,
            valor_liquidado: liquidado,
            status,
            vencimento: NaiveDate::from_ymd_opt(2024, 6, dia).unwrap(),
        }
    }

    #[test]
    fn test_partial_then_full_settlement() {
        let mut t = titulo(dec!(100), dec!(0), StatusTitulo::Pendente, 20);

        let baixa = FinanceiroService::baixar(&t, dec!(40)).unwrap();
        assert_eq!(baixa.valor_liquidado, dec!(40));
        assert_eq!(baixa.status, StatusTitulo::Parcial);

        t.valor_liquidado = baixa.valor_liquidado;
        t.status = baixa.status;
        let baixa = FinanceiroService::baixar(&t, dec!(60)).unwrap();
        assert_eq!(baixa.status, StatusTitulo::Liquidado);
        assert_eq!(baixa.status.as_str(TipoTitulo::Recebimento), "recebido");
        assert_eq!(baixa.status.as_str(TipoTitulo::Pagamento), "pago");
    }

    #[rstest]
    #[case(dec!(0), FinanceiroError::ValorInvalido)]
    #[case(dec!(-5), FinanceiroError::ValorInvalido)]
    #[case(dec!(99.999), FinanceiroError::CasasDecimais)]
    #[case(dec!(0.001), FinanceiroError::CasasDecimais)]
    #[case(dec!(100.01), FinanceiroError::ValorAcimaDoSaldo { valor: dec!(100.01), saldo: dec!(100) })]
    fn test_settlement_value_rules(#[case] valor: Decimal, #[case] expected: FinanceiroError) {
        let t = titulo(dec!(100), dec!(0), StatusTitulo::Pendente, 20);
        assert_eq!(FinanceiroService::baixar(&t, valor), Err(expected));
    }

    #[test]
    fn test_trailing_zeros_settle_in_full() {
        let t = titulo(dec!(100), dec!(0), StatusTitulo::Pendente, 20);
        let baixa = FinanceiroService::baixar(&t, dec!(100.000)).unwrap();
        assert_eq!(baixa.valor_liquidado, dec!(100));
        assert_eq!(baixa.status, StatusTitulo::Liquidado);
    }

    #[test]
    fn test_cancelled_and_settled_items_reject_settlement() {
        let cancelado = titulo(dec!(10), dec!(0), StatusTitulo::Cancelado, 20);
        assert_eq!(
            FinanceiroService::baixar(&cancelado, dec!(1)),
            Err(FinanceiroError::Cancelado)
        );
        let pago = titulo(dec!(10), dec!(10), StatusTitulo::Liquidado, 20);
        assert_eq!(
            FinanceiroService::baixar(&pago, dec!(1)),
            Err(FinanceiroError::JaLiquidado)
        );
    }

    #[test]
    fn test_reversal() {
        let parcial = titulo(dec!(10), dec!(4), StatusTitulo::Parcial, 20);
        let baixa = FinanceiroService::estornar(&parcial).unwrap();
        assert_eq!(baixa.valor_liquidado, Decimal::ZERO);
        assert_eq!(baixa.status, StatusTitulo::Pendente);

        let pendente = titulo(dec!(10), dec!(0), StatusTitulo::Pendente, 20);
        assert_eq!(
            FinanceiroService::estornar(&pendente),
            Err(FinanceiroError::SemLiquidacao)
        );
    }

    #[test]
    fn test_cancel_requires_nothing_settled() {
        let parcial = titulo(dec!(10), dec!(4), StatusTitulo::Parcial, 20);
        assert_eq!(
            FinanceiroService::validar_cancelamento(&parcial),
            Err(FinanceiroError::PossuiLiquidacao)
        );
        let pendente = titulo(dec!(10), dec!(0), StatusTitulo::Pendente, 20);
        assert!(FinanceiroService::validar_cancelamento(&pendente).is_ok());
    }

    #[rstest]
    #[case(StatusTitulo::Pendente, 10, "vencido")]
    #[case(StatusTitulo::Parcial, 10, "vencido")]
    #[case(StatusTitulo::Pendente, 15, "pendente")]
    #[case(StatusTitulo::Liquidado, 10, "pago")]
    #[case(StatusTitulo::Cancelado, 1, "cancelado")]
    fn test_situacao(#[case] status: StatusTitulo, #[case] dia: u32, #[case] expected: &str) {
        let t = titulo(dec!(10), dec!(0), status, dia);
        assert_eq!(
            FinanceiroService::situacao(&t, TipoTitulo::Pagamento, hoje()),
            expected
        );
    }

    #[test]
    fn test_summary() {
        let titulos = [
            titulo(dec!(100), dec!(0), StatusTitulo::Pendente, 10),
            titulo(dec!(50), dec!(20), StatusTitulo::Parcial, 20),
            titulo(dec!(30), dec!(30), StatusTitulo::Liquidado, 1),
            titulo(dec!(999), dec!(0), StatusTitulo::Cancelado, 1),
        ];
        let resumo = FinanceiroService::resumir(&titulos, hoje());

        assert_eq!(resumo.total_aberto, dec!(130));
        assert_eq!(resumo.total_vencido, dec!(100));
        assert_eq!(resumo.total_liquidado, dec!(50));
        assert_eq!(resumo.quantidade_aberta, 2);
        assert_eq!(resumo.quantidade_vencida, 1);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(StatusTitulo::parse("recebido"), Some(StatusTitulo::Liquidado));
        assert_eq!(StatusTitulo::parse("pago"), Some(StatusTitulo::Liquidado));
        assert_eq!(StatusTitulo::parse("vencido"), None);
    }
}
