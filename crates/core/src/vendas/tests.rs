//! Tests for sale calculations.

use chrono::NaiveDate;
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::*;

fn item(quantidade: Decimal, preco: Decimal, desconto: Decimal) -> ItemInput {
    ItemInput {
        produto_id: Some(Uuid::new_v4()),
        servico_id: None,
        descricao: "Parafuso".to_string(),
        quantidade,
        preco_unitario: preco,
        desconto,
    }
}

fn data(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_totals() {
    let itens = vec![
        item(dec!(3), dec!(10.005), dec!(0)),
        item(dec!(1), dec!(50), dec!(5)),
    ];
    let totais = VendaService::calcular_totais(&itens, dec!(10)).unwrap();

    assert_eq!(totais.itens[0].total, dec!(30.02));
    assert_eq!(totais.itens[1].total, dec!(45));
    assert_eq!(totais.subtotal, dec!(75.02));
    assert_eq!(totais.total, dec!(65.02));
}

#[test]
fn test_empty_sale_rejected() {
    let Err(VendaError::Invalida(errors)) = VendaService::calcular_totais(&[], dec!(0)) else {
        panic!("expected validation error");
    };
    assert!(errors.contains("itens"));
}

#[test]
fn test_item_errors_are_indexed() {
    let mut ruim = item(dec!(0), dec!(-1), dec!(0));
    ruim.servico_id = Some(Uuid::new_v4());
    let itens = vec![item(dec!(1), dec!(10), dec!(0)), ruim];

    let Err(VendaError::Invalida(errors)) = VendaService::calcular_totais(&itens, dec!(0)) else {
        panic!("expected validation error");
    };
    assert!(errors.contains("itens[1].quantidade"));
    assert!(errors.contains("itens[1].preco_unitario"));
    assert!(errors.contains("itens[1].produto_id"));
    assert!(!errors.contains("itens[0].quantidade"));
}

#[rstest]
#[case(item(dec!(1), dec!(10), dec!(10.01)), "itens[0].desconto")]
#[case(item(dec!(1), dec!(10), dec!(-1)), "itens[0].desconto")]
fn test_item_discount_limits(#[case] linha: ItemInput, #[case] campo: &str) {
    let Err(VendaError::Invalida(errors)) = VendaService::calcular_totais(&[linha], dec!(0)) else {
        panic!("expected validation error");
    };
    assert!(errors.contains(campo));
}

#[rstest]
#[case(item(Decimal::MAX, dec!(2), dec!(0)), "itens[0].quantidade")]
#[case(item(dec!(1), Decimal::MAX, dec!(0)), "itens[0].preco_unitario")]
#[case(item(dec!(999999999999.999), dec!(9999999999999.99), dec!(0)), "itens[0].quantidade")]
fn test_item_amounts_out_of_range(#[case] linha: ItemInput, #[case] campo: &str) {
    let Err(VendaError::Invalida(errors)) = VendaService::calcular_totais(&[linha], dec!(0)) else {
        panic!("expected validation error");
    };
    assert!(errors.contains(campo));
}

#[test]
fn test_subtotal_out_of_range() {
    let itens = vec![
        item(dec!(1), dec!(9000000000000), dec!(0)),
        item(dec!(1), dec!(9000000000000), dec!(0)),
    ];
    let Err(VendaError::Invalida(errors)) = VendaService::calcular_totais(&itens, dec!(0)) else {
        panic!("expected validation error");
    };
    assert!(errors.contains("itens"));
}

#[test]
fn test_sale_discount_cannot_exceed_subtotal() {
    let result = VendaService::calcular_totais(&[item(dec!(2), dec!(5), dec!(0))], dec!(10.01));
    assert!(matches!(result, Err(VendaError::Invalida(e)) if e.contains("desconto")));
}

#[test]
fn test_installments_remainder_on_first() {
    let parcelas = VendaService::gerar_parcelas(dec!(100), 3, 6, data(2024, 1, 15)).unwrap();
    let valores: Vec<_> = parcelas.iter().map(|p| p.valor).collect();
    assert_eq!(valores, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    assert_eq!(parcelas[2].numero, 3);
    assert_eq!(parcelas[2].vencimento, data(2024, 3, 15));
}

#[test]
fn test_installments_clamp_end_of_month() {
    let parcelas = VendaService::gerar_parcelas(dec!(90), 4, 12, data(2023, 1, 31)).unwrap();
    let datas: Vec<_> = parcelas.iter().map(|p| p.vencimento).collect();
    assert_eq!(
        datas,
        vec![data(2023, 1, 31), data(2023, 2, 28), data(2023, 3, 31), data(2023, 4, 30)]
    );
}

#[rstest]
#[case(0, 3)]
#[case(4, 3)]
#[case(-1, 3)]
fn test_installment_count_limits(#[case] quantidade: i32, #[case] max: i32) {
    assert_eq!(
        VendaService::gerar_parcelas(dec!(10), quantidade, max, data(2024, 5, 1)),
        Err(VendaError::ParcelasExcedidas { max })
    );
}

#[rstest]
#[case(StatusVenda::Aberta, StatusVenda::Concluida, true)]
#[case(StatusVenda::Aberta, StatusVenda::Cancelada, true)]
#[case(StatusVenda::Concluida, StatusVenda::Cancelada, true)]
#[case(StatusVenda::Cancelada, StatusVenda::Aberta, false)]
#[case(StatusVenda::Cancelada, StatusVenda::Concluida, false)]
#[case(StatusVenda::Concluida, StatusVenda::Aberta, false)]
#[case(StatusVenda::Aberta, StatusVenda::Aberta, false)]
fn test_transitions(#[case] de: StatusVenda, #[case] para: StatusVenda, #[case] ok: bool) {
    assert_eq!(VendaService::validar_transicao(de, para).is_ok(), ok);
}

#[test]
fn test_closed_sale_only_accepts_notes() {
    assert!(VendaService::validar_edicao(StatusVenda::Aberta, true).is_ok());
    assert!(VendaService::validar_edicao(StatusVenda::Concluida, false).is_ok());
    assert_eq!(
        VendaService::validar_edicao(StatusVenda::Concluida, true),
        Err(VendaError::NaoEditavel("concluida"))
    );
}

#[test]
fn test_status_round_trip_from_storage() {
    assert_eq!("cancelada".parse::<StatusVenda>(), Ok(StatusVenda::Cancelada));
    assert!("perdida".parse::<StatusVenda>().is_err());
}

proptest! {
    /// Installments always add up to the total and differ by at most the leftover cents.
    #[test]
    fn test_installments_sum_to_total(
        centavos in 1i64..100_000_000,
        quantidade in 1i32..=24,
    ) {
        let total = Decimal::new(centavos, 2);
        let parcelas = VendaService::gerar_parcelas(total, quantidade, 24, data(2024, 1, 31)).unwrap();

        prop_assert_eq!(parcelas.len(), usize::try_from(quantidade).unwrap());
        prop_assert_eq!(parcelas.iter().map(|p| p.valor).sum::<Decimal>(), total);

        let base = parcelas.last().unwrap().valor;
        prop_assert!(parcelas.iter().skip(1).all(|p| p.valor == base));
        prop_assert!(parcelas[0].valor >= base);
        prop_assert!(parcelas[0].valor - base < Decimal::new(i64::from(quantidade), 2));
    }

    /// Sale total equals the sum of line totals minus the sale discount.
    #[test]
    fn test_total_is_subtotal_minus_discount(
        linhas in prop::collection::vec((1i64..1_000, 0i64..100_000), 1..10),
    ) {
        let itens: Vec<ItemInput> = linhas
            .iter()
            .map(|(q, p)| item(Decimal::from(*q), Decimal::new(*p, 2), Decimal::ZERO))
            .collect();
        let totais = VendaService::calcular_totais(&itens, Decimal::ZERO).unwrap();
        let soma: Decimal = totais.itens.iter().map(|i| i.total).sum();
        prop_assert_eq!(totais.subtotal, soma);
        prop_assert_eq!(totais.total, totais.subtotal);
    }
}
