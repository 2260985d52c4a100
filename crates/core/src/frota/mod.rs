//! Fleet fuel consumption.
//!
//! Consumption is measured tank-to-tank: each fill tops the tank up, so the liters
//! of a fill are what was burned since the previous one. The first fill of a
//! period only marks the starting odometer and its liters are not counted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::validation::FieldErrors;

/// Fuel types accepted in `abastecimentos.combustivel`.
pub const COMBUSTIVEIS: [&str; 5] = ["gasolina", "etanol", "diesel", "gnv", "flex"];

/// One fill as loaded for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abastecimento {
    /// Vehicle.
    pub veiculo_id: Uuid,
    /// Fill date.
    pub data: NaiveDate,
    /// Odometer reading in km.
    pub odometro: Decimal,
    /// Liters filled.
    pub litros: Decimal,
    /// Amount paid.
    pub valor_total: Decimal,
}

/// Report line of one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumoVeiculo {
    /// Vehicle.
    pub veiculo_id: Uuid,
    /// Number of fills in the period.
    pub abastecimentos: u32,
    /// Liters over every fill.
    pub litros_total: Decimal,
    /// Cost over every fill.
    pub custo_total: Decimal,
    /// Last odometer minus first odometer.
    pub km_rodados: Decimal,
    /// Tank-to-tank average, km per liter.
    pub consumo_medio_km_l: Option<Decimal>,
    /// Tank-to-tank cost per km.
    pub custo_por_km: Option<Decimal>,
    /// `custo_total / litros_total`.
    pub preco_medio_litro: Option<Decimal>,
}

fn arredondar(value: Decimal, casas: u32) -> Decimal {
    value.round_dp_with_strategy(casas, RoundingStrategy::MidpointAwayFromZero)
}

fn dividir(numerador: Decimal, denominador: Decimal, casas: u32) -> Option<Decimal> {
    (denominador > Decimal::ZERO).then(|| arredondar(numerador / denominador, casas))
}

fn consumo_de(veiculo_id: Uuid, mut fills: Vec<&Abastecimento>) -> ConsumoVeiculo {
    fills.sort_by(|a, b| a.data.cmp(&b.data).then(a.odometro.cmp(&b.odometro)));

    let litros_total: Decimal = fills.iter().map(|a| a.litros).sum();
    let custo_total: Decimal = fills.iter().map(|a| a.valor_total).sum();
    let (km_rodados, litros_consumidos, custo_consumido) = match (fills.first(), fills.last()) {
        (Some(primeiro), Some(ultimo)) if fills.len() > 1 => (
            ultimo.odometro - primeiro.odometro,
            litros_total - primeiro.litros,
            custo_total - primeiro.valor_total,
        ),
        _ => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };

    let (consumo_medio_km_l, custo_por_km) = if fills.len() > 1 && km_rodados > Decimal::ZERO {
        (
            dividir(km_rodados, litros_consumidos, 2),
            dividir(custo_consumido, km_rodados, 4),
        )
    } else {
        (None, None)
    };

    ConsumoVeiculo {
        veiculo_id,
        abastecimentos: u32::try_from(fills.len()).unwrap_or(u32::MAX),
        litros_total,
        custo_total,
        km_rodados,
        consumo_medio_km_l,
        custo_por_km,
        preco_medio_litro: dividir(custo_total, litros_total, 3),
    }
}

/// Groups fills by vehicle and computes consumption figures, ordered by vehicle id.
#[must_use]
pub fn relatorio_consumo(abastecimentos: &[Abastecimento]) -> Vec<ConsumoVeiculo> {
    let mut por_veiculo: BTreeMap<Uuid, Vec<&Abastecimento>> = BTreeMap::new();
    for a in abastecimentos {
        por_veiculo.entry(a.veiculo_id).or_default().push(a);
    }
    por_veiculo
        .into_iter()
        .map(|(veiculo_id, fills)| consumo_de(veiculo_id, fills))
        .collect()
}

/// Checks a new reading against the closest readings before and after its date.
pub fn validar_odometro(
    errors: &mut FieldErrors,
    novo: Decimal,
    anterior: Option<Decimal>,
    posterior: Option<Decimal>,
) {
    if novo < Decimal::ZERO {
        errors.add("odometro", "nao pode ser negativo");
    } else if anterior.is_some_and(|a| novo < a) {
        errors.add("odometro", "menor que o do abastecimento anterior");
    } else if posterior.is_some_and(|p| novo > p) {
        errors.add("odometro", "maior que o do abastecimento posterior");
    }
}

/// Brazilian plates: old `ABC1234` or Mercosul `ABC1D23`. Hyphen and case ignored.
#[must_use]
pub fn placa_valida(placa: &str) -> bool {
    let normalizada = normalizar_placa(placa);
    let c: Vec<char> = normalizada.chars().collect();
    c.len() == 7
        && c[..3].iter().all(char::is_ascii_uppercase)
        && c[3].is_ascii_digit()
        && (c[4].is_ascii_digit() || c[4].is_ascii_uppercase())
        && c[5..].iter().all(char::is_ascii_digit)
}

/// Uppercase plate without separators.
#[must_use]
pub fn normalizar_placa(placa: &str) -> String {
    placa
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn fill(veiculo: Uuid, dia: u32, odometro: Decimal, litros: Decimal, valor: Decimal) -> Abastecimento {
        Abastecimento {
            veiculo_id: veiculo,
            data: NaiveDate::from_ymd_opt(2024, 3, dia).unwrap(),
            odometro,
            litros,
            valor_total: valor,
        }
    }

    #[test]
    fn test_tank_to_tank_consumption() {
        let v = Uuid::new_v4();
        let fills = vec![
            fill(v, 10, dec!(10400), dec!(35), dec!(210)),
            fill(v, 1, dec!(10000), dec!(40), dec!(240)),
            fill(v, 20, dec!(10850), dec!(40), dec!(236)),
        ];
        let relatorio = relatorio_consumo(&fills);
        let linha = &relatorio[0];

        assert_eq!(linha.abastecimentos, 3);
        assert_eq!(linha.km_rodados, dec!(850));
        assert_eq!(linha.litros_total, dec!(115));
        assert_eq!(linha.custo_total, dec!(686));
        // 850 km / (35 + 40) l
        assert_eq!(linha.consumo_medio_km_l, Some(dec!(11.33)));
        // (210 + 236) / 850
        assert_eq!(linha.custo_por_km, Some(dec!(0.5247)));
        assert_eq!(linha.preco_medio_litro, Some(dec!(5.965)));
    }

    #[test]
    fn test_single_fill_has_no_consumption() {
        let v = Uuid::new_v4();
        let relatorio = relatorio_consumo(&[fill(v, 1, dec!(500), dec!(30), dec!(180))]);
        assert_eq!(relatorio[0].km_rodados, Decimal::ZERO);
        assert_eq!(relatorio[0].consumo_medio_km_l, None);
        assert_eq!(relatorio[0].custo_por_km, None);
        assert_eq!(relatorio[0].preco_medio_litro, Some(dec!(6)));
    }

    #[test]
    fn test_groups_by_vehicle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fills = vec![
            fill(a, 1, dec!(0), dec!(10), dec!(50)),
            fill(b, 1, dec!(0), dec!(10), dec!(50)),
            fill(a, 2, dec!(100), dec!(10), dec!(50)),
        ];
        let relatorio = relatorio_consumo(&fills);
        assert_eq!(relatorio.len(), 2);
        let linha_a = relatorio.iter().find(|l| l.veiculo_id == a).unwrap();
        assert_eq!(linha_a.consumo_medio_km_l, Some(dec!(10)));
        assert!(relatorio_consumo(&[]).is_empty());
    }

    #[test]
    fn test_odometer_must_not_go_backwards() {
        let mut errors = FieldErrors::new();
        validar_odometro(&mut errors, dec!(900), Some(dec!(1000)), None);
        assert!(errors.contains("odometro"));

        let mut errors = FieldErrors::new();
        validar_odometro(&mut errors, dec!(1500), Some(dec!(1000)), Some(dec!(1200)));
        assert!(errors.contains("odometro"));

        let mut errors = FieldErrors::new();
        validar_odometro(&mut errors, dec!(1000), Some(dec!(1000)), Some(dec!(1200)));
        assert!(errors.is_empty());
    }

    #[rstest]
    #[case("ABC1234", true)]
    #[case("abc-1234", true)]
    #[case("BRA2E19", true)]
    #[case("AB12345", false)]
    #[case("ABC12345", false)]
    #[case("ABC1D2X", false)]
    fn test_plates(#[case] placa: &str, #[case] expected: bool) {
        assert_eq!(placa_valida(placa), expected);
    }

    proptest! {
        /// Total liters and cost always cover every fill of every vehicle.
        #[test]
        fn test_totals_cover_all_fills(
            entradas in prop::collection::vec((0u8..3, 1i64..100_000, 1i64..10_000), 1..30),
        ) {
            let veiculos = [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)];
            let fills: Vec<Abastecimento> = entradas
                .iter()
                .enumerate()
                .map(|(i, (v, litros, valor))| Abastecimento {
                    veiculo_id: veiculos[usize::from(*v)],
                    data: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    odometro: Decimal::from(i64::try_from(i).unwrap() * 100),
                    litros: Decimal::new(*litros, 2),
                    valor_total: Decimal::new(*valor, 2),
                })
                .collect();

            let relatorio = relatorio_consumo(&fills);
            let litros: Decimal = relatorio.iter().map(|l| l.litros_total).sum();
            let custo: Decimal = relatorio.iter().map(|l| l.custo_total).sum();
            let quantidade: u32 = relatorio.iter().map(|l| l.abastecimentos).sum();

            prop_assert_eq!(litros, fills.iter().map(|f| f.litros).sum::<Decimal>());
            prop_assert_eq!(custo, fills.iter().map(|f| f.valor_total).sum::<Decimal>());
            prop_assert_eq!(quantidade as usize, fills.len());
            prop_assert!(relatorio.iter().all(|l| l.km_rodados >= Decimal::ZERO));
        }
    }
}
