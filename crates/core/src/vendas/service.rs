//! Sale calculations.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::VendaError;
use super::types::{ItemCalculado, ItemInput, Parcela, StatusVenda, TotaisVenda};
use crate::validation::{self, FieldErrors};

/// Monetary rounding used for every stored amount.
fn arredondar(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest amount a `NUMERIC(15, 2)` column holds.
fn limite_valor() -> Decimal {
    Decimal::new(999_999_999_999_999, 2)
}

/// Largest quantity a `NUMERIC(15, 3)` column holds.
fn limite_quantidade() -> Decimal {
    Decimal::new(999_999_999_999_999, 3)
}

const FORA_DO_LIMITE: &str = "valor fora do limite";

/// Stateless sale rules.
pub struct VendaService;

impl VendaService {
    /// Prices one line, recording problems under `itens[index].<campo>`.
    pub fn calcular_item(
        index: usize,
        item: &ItemInput,
        errors: &mut FieldErrors,
    ) -> Option<ItemCalculado> {
        let campo = |nome: &str| format!("itens[{index}].{nome}");
        let before = errors.len();

        validation::text(errors, &campo("descricao"), &item.descricao, 255);
        validation::positive(errors, &campo("quantidade"), item.quantidade);
        validation::non_negative(errors, &campo("preco_unitario"), item.preco_unitario);
        validation::non_negative(errors, &campo("desconto"), item.desconto);
        if item.produto_id.is_some() && item.servico_id.is_some() {
            errors.add(&campo("produto_id"), "informe produto ou servico, nao ambos");
        }

        if item.quantidade > limite_quantidade() {
            errors.add(&campo("quantidade"), FORA_DO_LIMITE);
        }
        if item.preco_unitario > limite_valor() {
            errors.add(&campo("preco_unitario"), FORA_DO_LIMITE);
        }
        if errors.len() > before {
            return None;
        }

        let Some(bruto) = item
            .quantidade
            .checked_mul(item.preco_unitario)
            .map(arredondar)
            .filter(|bruto| *bruto <= limite_valor())
        else {
            errors.add(&campo("quantidade"), FORA_DO_LIMITE);
            return None;
        };
        if item.desconto > bruto {
            errors.add(&campo("desconto"), "desconto maior que o valor do item");
            return None;
        }
        Some(ItemCalculado {
            item: item.clone(),
            total: arredondar(bruto - item.desconto),
        })
    }

    /// Prices every line and the sale.
    ///
    /// # Errors
    ///
    /// Returns `VendaError::Invalida` listing every invalid field.
    pub fn calcular_totais(itens: &[ItemInput], desconto: Decimal) -> Result<TotaisVenda, VendaError> {
        let mut errors = FieldErrors::new();
        if itens.is_empty() {
            errors.add("itens", "informe ao menos um item");
        }

        let calculados: Vec<ItemCalculado> = itens
            .iter()
            .enumerate()
            .filter_map(|(i, item)| Self::calcular_item(i, item, &mut errors))
            .collect();

        validation::non_negative(&mut errors, "desconto", desconto);
        let subtotal = calculados
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.total))
            .filter(|subtotal| *subtotal <= limite_valor());
        match subtotal {
            None => errors.add("itens", FORA_DO_LIMITE),
            Some(subtotal) if errors.is_empty() && desconto > subtotal => {
                errors.add("desconto", "desconto maior que o subtotal");
            }
            Some(_) => {}
        }
        errors.into_result().map_err(VendaError::Invalida)?;
        let subtotal = subtotal.unwrap_or_default();

        let desconto = arredondar(desconto);
        Ok(TotaisVenda {
            itens: calculados,
            subtotal,
            desconto,
            total: subtotal - desconto,
        })
    }

    /// Splits `total` into `quantidade` installments.
    ///
    /// Every installment gets the same whole-cent amount and the first absorbs
    /// the leftover cents. Installment `i` is due `i` months after
    /// `primeiro_vencimento`; short months clamp to their last day.
    ///
    /// # Errors
    ///
    /// Returns `VendaError::ParcelasExcedidas` when `quantidade` is outside
    /// `1..=max_parcelas`.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    /// use gestor_core::vendas::VendaService;
    ///
    /// let inicio = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    /// let parcelas = VendaService::gerar_parcelas(dec!(100), 3, 12, inicio).unwrap();
    /// assert_eq!(parcelas[0].valor, dec!(33.34));
    /// assert_eq!(parcelas[1].vencimento, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    /// ```
    pub fn gerar_parcelas(
        total: Decimal,
        quantidade: i32,
        max_parcelas: i32,
        primeiro_vencimento: NaiveDate,
    ) -> Result<Vec<Parcela>, VendaError> {
        let max = max_parcelas.max(1);
        if quantidade < 1 || quantidade > max {
            return Err(VendaError::ParcelasExcedidas { max });
        }

        let total = arredondar(total);
        let n = Decimal::from(quantidade);
        let base = (total / n).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let sobra = total - base * n;

        let parcelas = (0..quantidade)
            .map(|i| {
                let meses = Months::new(u32::try_from(i).unwrap_or(0));
                Parcela {
                    numero: i + 1,
                    valor: if i == 0 { base + sobra } else { base },
                    vencimento: primeiro_vencimento
                        .checked_add_months(meses)
                        .unwrap_or(NaiveDate::MAX),
                }
            })
            .collect();
        Ok(parcelas)
    }

    /// Checks a status change.
    ///
    /// # Errors
    ///
    /// Returns `VendaError::TransicaoInvalida` unless the change is
    /// `aberta -> concluida`, `aberta -> cancelada` or `concluida -> cancelada`.
    pub fn validar_transicao(atual: StatusVenda, nova: StatusVenda) -> Result<(), VendaError> {
        use StatusVenda::{Aberta, Cancelada, Concluida};
        match (atual, nova) {
            (Aberta, Concluida | Cancelada) | (Concluida, Cancelada) => Ok(()),
            (de, para) => Err(VendaError::TransicaoInvalida {
                de: de.as_str(),
                para: para.as_str(),
            }),
        }
    }

    /// Only open sales accept changes beyond `observacoes`.
    ///
    /// # Errors
    ///
    /// Returns `VendaError::NaoEditavel` when other fields change on a closed sale.
    pub fn validar_edicao(status: StatusVenda, altera_outros_campos: bool) -> Result<(), VendaError> {
        if status != StatusVenda::Aberta && altera_outros_campos {
            return Err(VendaError::NaoEditavel(status.as_str()));
        }
        Ok(())
    }
}
