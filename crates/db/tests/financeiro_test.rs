//! Payable/receivable repository tests: settlement, reversal, cancellation,
//! overdue filtering and summaries.

mod common;

use chrono::{Duration, Utc};
use common::setup_db;
use gestor_core::financeiro::FinanceiroError;
use gestor_db::repositories::{
    Ator, BaixaInput, CreatePagamentoInput, CreateRecebimentoInput, PagamentoFilter,
    PagamentoRepository, RecebimentoRepository, RepositoryError, UpdatePagamentoInput,
};
use gestor_shared::PageRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn pagamento(descricao: &str, valor: Decimal, dias: i64) -> CreatePagamentoInput {
    CreatePagamentoInput {
        descricao: descricao.to_string(),
        fornecedor_id: None,
        centro_custo_id: None,
        conta_bancaria_id: None,
        forma_pagamento_id: None,
        documento: Some("NF-100".to_string()),
        valor,
        data_vencimento: Utc::now().date_naive() + Duration::days(dias),
        observacoes: None,
    }
}

fn baixa(valor: Decimal) -> BaixaInput {
    BaixaInput {
        valor,
        data: None,
        conta_bancaria_id: None,
    }
}

#[tokio::test]
async fn test_partial_then_full_payment() {
    let db = setup_db().await;
    let repo = PagamentoRepository::new(db.clone());
    let ator = Ator::sistema();
    let p = repo.create(&ator, pagamento("Aluguel", dec!(100), 5)).await.unwrap();
    assert_eq!(p.situacao, "pendente");

    let parcial = repo.baixar(&ator, p.registro.id, baixa(dec!(40))).await.unwrap();
    assert_eq!(parcial.registro.status, "parcial");
    assert_eq!(parcial.registro.valor_pago, dec!(40));
    assert!(parcial.registro.data_pagamento.is_some());

    let err = repo
        .baixar(&ator, p.registro.id, baixa(dec!(60.01)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Financeiro(FinanceiroError::ValorAcimaDoSaldo { .. })
    ));

    let pago = repo.baixar(&ator, p.registro.id, baixa(dec!(60))).await.unwrap();
    assert_eq!(pago.registro.status, "pago");
    assert_eq!(pago.situacao, "pago");

    assert!(matches!(
        repo.baixar(&ator, p.registro.id, baixa(dec!(1))).await,
        Err(RepositoryError::Financeiro(FinanceiroError::JaLiquidado))
    ));
}

#[tokio::test]
async fn test_reversal_and_cancel() {
    let db = setup_db().await;
    let repo = PagamentoRepository::new(db.clone());
    let ator = Ator::sistema();
    let p = repo.create(&ator, pagamento("Energia", dec!(80), 5)).await.unwrap();
    let id = p.registro.id;

    repo.baixar(&ator, id, baixa(dec!(30))).await.unwrap();
    assert!(matches!(
        repo.cancelar(&ator, id).await,
        Err(RepositoryError::Financeiro(FinanceiroError::PossuiLiquidacao))
    ));

    let estornado = repo.estornar(&ator, id).await.unwrap();
    assert_eq!(estornado.registro.status, "pendente");
    assert_eq!(estornado.registro.valor_pago, Decimal::ZERO);
    assert!(estornado.registro.data_pagamento.is_none());

    let cancelado = repo.cancelar(&ator, id).await.unwrap();
    assert_eq!(cancelado.registro.status, "cancelado");

    assert!(matches!(
        repo.baixar(&ator, id, baixa(dec!(1))).await,
        Err(RepositoryError::Financeiro(FinanceiroError::Cancelado))
    ));
    assert!(matches!(
        repo.update(&ator, id, UpdatePagamentoInput::default()).await,
        Err(RepositoryError::Financeiro(FinanceiroError::Cancelado))
    ));
}

#[tokio::test]
async fn test_value_locked_after_payment() {
    let db = setup_db().await;
    let repo = PagamentoRepository::new(db.clone());
    let ator = Ator::sistema();
    let p = repo.create(&ator, pagamento("Frete", dec!(50), 5)).await.unwrap();
    repo.baixar(&ator, p.registro.id, baixa(dec!(10))).await.unwrap();

    let err = repo
        .update(
            &ator,
            p.registro.id,
            UpdatePagamentoInput {
                valor: Some(dec!(70)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidState(_)));
}

#[tokio::test]
async fn test_overdue_listing_and_summary() {
    let db = setup_db().await;
    let repo = PagamentoRepository::new(db.clone());
    let ator = Ator::sistema();

    let vencido = repo.create(&ator, pagamento("Atrasado", dec!(100), -3)).await.unwrap();
    assert_eq!(vencido.situacao, "vencido");
    let futuro = repo.create(&ator, pagamento("Futuro", dec!(50), 10)).await.unwrap();
    repo.baixar(&ator, futuro.registro.id, baixa(dec!(20))).await.unwrap();
    let cancelado = repo.create(&ator, pagamento("Cancelado", dec!(999), -10)).await.unwrap();
    repo.cancelar(&ator, cancelado.registro.id).await.unwrap();

    let filtro = PagamentoFilter {
        somente_vencidos: true,
        ..Default::default()
    };
    let pagina = repo.list(&filtro, PageRequest::default()).await.unwrap();
    assert_eq!(pagina.meta.total, 1);
    assert_eq!(pagina.data[0].registro.id, vencido.registro.id);
    assert_eq!(pagina.data[0].situacao, "vencido");

    let por_status = PagamentoFilter {
        status: Some("vencido".to_string()),
        ..Default::default()
    };
    assert_eq!(
        repo.list(&por_status, PageRequest::default()).await.unwrap().meta.total,
        1
    );

    let resumo = repo.resumo(&PagamentoFilter::default()).await.unwrap();
    assert_eq!(resumo.total_aberto, dec!(130));
    assert_eq!(resumo.total_vencido, dec!(100));
    assert_eq!(resumo.total_liquidado, dec!(20));
    assert_eq!(resumo.quantidade_aberta, 2);
    assert_eq!(resumo.quantidade_vencida, 1);
}

#[tokio::test]
async fn test_unknown_status_filter_is_rejected() {
    let db = setup_db().await;
    let repo = PagamentoRepository::new(db.clone());
    let filtro = PagamentoFilter {
        status: Some("recebido".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        repo.list(&filtro, PageRequest::default()).await,
        Err(RepositoryError::Validation(_))
    ));
}

#[tokio::test]
async fn test_manual_receivable_lifecycle() {
    let db = setup_db().await;
    let repo = RecebimentoRepository::new(db.clone());
    let ator = Ator::sistema();

    let r = repo
        .create(
            &ator,
            CreateRecebimentoInput {
                descricao: "Consultoria".to_string(),
                cliente_id: None,
                centro_custo_id: None,
                conta_bancaria_id: None,
                forma_pagamento_id: None,
                valor: dec!(250),
                data_vencimento: Utc::now().date_naive(),
                observacoes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(r.registro.parcela, 1);
    assert_eq!(r.registro.total_parcelas, 1);

    let recebido = repo.baixar(&ator, r.registro.id, baixa(dec!(250))).await.unwrap();
    assert_eq!(recebido.registro.status, "recebido");
    assert_eq!(recebido.registro.valor_recebido, dec!(250));

    repo.estornar(&ator, r.registro.id).await.unwrap();
    repo.delete(&ator, r.registro.id).await.unwrap();
    let restaurado = repo.restore(&ator, r.registro.id).await.unwrap();
    assert_eq!(restaurado.registro.status, "pendente");
}
