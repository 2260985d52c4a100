//! Fleet repository tests: plate normalization, odometer ordering and the
//! consumption report.

mod common;

use chrono::NaiveDate;
use common::setup_db;
use gestor_db::repositories::{
    Ator, CreateAbastecimentoInput, CreateVeiculoInput, FrotaRepository, RepositoryError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn dia(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn fill(veiculo_id: Uuid, d: u32, odometro: Decimal, litros: Decimal) -> CreateAbastecimentoInput {
    CreateAbastecimentoInput {
        veiculo_id,
        colaborador_id: None,
        data: dia(d),
        odometro,
        litros,
        valor_total: litros * dec!(6),
        combustivel: "Diesel".to_string(),
        posto: None,
    }
}

async fn veiculo(repo: &FrotaRepository, placa: &str) -> Uuid {
    repo.create_veiculo(
        &Ator::sistema(),
        CreateVeiculoInput {
            placa: placa.to_string(),
            modelo: "Caminhao 3/4".to_string(),
            ano: Some(2020),
            ativo: true,
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_plate_is_normalized_and_unique() {
    let db = setup_db().await;
    let repo = FrotaRepository::new(db.clone());

    let id = veiculo(&repo, "abc-1d23").await;
    assert_eq!(repo.find_veiculo(id, false).await.unwrap().placa, "ABC1D23");

    let err = repo
        .create_veiculo(
            &Ator::sistema(),
            CreateVeiculoInput {
                placa: "ABC1D23".to_string(),
                modelo: "Outro".to_string(),
                ano: None,
                ativo: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate { campo: "placa", .. }));
}

#[tokio::test]
async fn test_odometer_cannot_go_backwards() {
    let db = setup_db().await;
    let repo = FrotaRepository::new(db.clone());
    let ator = Ator::sistema();
    let id = veiculo(&repo, "QWE1234").await;

    repo.create_abastecimento(&ator, fill(id, 5, dec!(10000), dec!(40)))
        .await
        .unwrap();
    repo.create_abastecimento(&ator, fill(id, 20, dec!(12000), dec!(50)))
        .await
        .unwrap();

    let antes = repo
        .create_abastecimento(&ator, fill(id, 10, dec!(10000) - dec!(1), dec!(10)))
        .await
        .unwrap_err();
    let RepositoryError::Validation(errors) = antes else {
        panic!("expected validation error, got {antes:?}");
    };
    assert!(errors.contains("odometro"));

    let depois = repo
        .create_abastecimento(&ator, fill(id, 10, dec!(12500), dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(depois, RepositoryError::Validation(_)));

    // A reading between its neighbours is accepted.
    let meio = repo
        .create_abastecimento(&ator, fill(id, 10, dec!(11000), dec!(20)))
        .await
        .unwrap();
    assert_eq!(meio.combustivel, "diesel");
}

#[tokio::test]
async fn test_consumption_report() {
    let db = setup_db().await;
    let repo = FrotaRepository::new(db.clone());
    let ator = Ator::sistema();
    let id = veiculo(&repo, "ZZZ9999").await;

    repo.create_abastecimento(&ator, fill(id, 1, dec!(10000), dec!(40)))
        .await
        .unwrap();
    repo.create_abastecimento(&ator, fill(id, 8, dec!(10400), dec!(40)))
        .await
        .unwrap();
    repo.create_abastecimento(&ator, fill(id, 15, dec!(10800), dec!(40)))
        .await
        .unwrap();

    let linhas = repo.relatorio_consumo(dia(1), dia(31), None).await.unwrap();
    assert_eq!(linhas.len(), 1);
    let linha = &linhas[0];
    assert_eq!(linha.placa, "ZZZ9999");
    assert_eq!(linha.consumo.abastecimentos, 3);
    assert_eq!(linha.consumo.km_rodados, dec!(800));
    assert_eq!(linha.consumo.litros_total, dec!(120));
    assert_eq!(linha.consumo.consumo_medio_km_l, Some(dec!(10)));

    assert!(matches!(
        repo.relatorio_consumo(dia(10), dia(1), None).await,
        Err(RepositoryError::Validation(_))
    ));
}

#[tokio::test]
async fn test_deleted_fill_leaves_report() {
    let db = setup_db().await;
    let repo = FrotaRepository::new(db.clone());
    let ator = Ator::sistema();
    let id = veiculo(&repo, "KKK1111").await;

    let a = repo
        .create_abastecimento(&ator, fill(id, 2, dec!(20000), dec!(30)))
        .await
        .unwrap();
    repo.delete_abastecimento(&ator, a.id).await.unwrap();

    assert!(repo.relatorio_consumo(dia(1), dia(31), Some(id)).await.unwrap().is_empty());
}
