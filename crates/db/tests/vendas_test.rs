//! Sale repository tests: totals, installment schedule, numbering and the
//! status lifecycle with its receivables.

mod common;

use chrono::NaiveDate;
use common::{Base, auditoria_de, seed_base, setup_db};
use gestor_core::vendas::{ItemInput, VendaError};
use gestor_db::repositories::{
    BaixaInput, CreateVendaInput, RecebimentoRepository, RepositoryError, UpdateVendaInput,
    VendaDetalhe, VendaFilter, VendaRepository,
};
use gestor_shared::PageRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

fn data(dia: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, dia).unwrap()
}

fn item(descricao: &str, quantidade: Decimal, preco: Decimal) -> ItemInput {
    ItemInput {
        produto_id: None,
        servico_id: None,
        descricao: descricao.to_string(),
        quantidade,
        preco_unitario: preco,
        desconto: Decimal::ZERO,
    }
}

fn venda_input(base: &Base, parcelas: i32) -> CreateVendaInput {
    CreateVendaInput {
        cliente_id: base.cliente_id,
        colaborador_id: None,
        forma_pagamento_id: base.forma_pagamento_id,
        data_venda: Some(data(10)),
        desconto: dec!(10),
        parcelas,
        primeiro_vencimento: Some(data(31)),
        observacoes: None,
        external_id: None,
        itens: vec![
            item("Caixa de som", dec!(2), dec!(30)),
            item("Instalacao", dec!(1), dec!(40)),
        ],
    }
}

async fn criar_venda(db: &DatabaseConnection, base: &Base, parcelas: i32) -> VendaDetalhe {
    VendaRepository::new(db.clone())
        .create(&base.ator(), venda_input(base, parcelas))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_sale_with_installments() {
    let db = setup_db().await;
    let base = seed_base(&db).await;

    let venda = criar_venda(&db, &base, 3).await;

    assert_eq!(venda.venda.numero, 1);
    assert_eq!(venda.venda.status, "aberta");
    assert_eq!(venda.venda.colaborador_id, base.colaborador_id);
    assert_eq!(venda.venda.subtotal, dec!(100));
    assert_eq!(venda.venda.total, dec!(90));
    assert_eq!(venda.itens.len(), 2);

    let valores: Vec<Decimal> = venda.recebimentos.iter().map(|r| r.valor).collect();
    assert_eq!(valores, [dec!(30), dec!(30), dec!(30)]);
    let soma: Decimal = valores.iter().sum();
    assert_eq!(soma, venda.venda.total);
    assert!(venda.recebimentos.iter().all(|r| r.status == "pendente"));
    assert_eq!(venda.recebimentos[0].data_vencimento, data(31));
    assert_eq!(
        venda.recebimentos[1].data_vencimento,
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    );

    let acoes: Vec<String> = auditoria_de(&db, venda.venda.id)
        .await
        .into_iter()
        .map(|r| r.acao)
        .collect();
    assert_eq!(acoes, ["criar"]);
}

#[tokio::test]
async fn test_sale_numbers_increase() {
    let db = setup_db().await;
    let base = seed_base(&db).await;

    let primeira = criar_venda(&db, &base, 1).await;
    let segunda = criar_venda(&db, &base, 1).await;
    assert_eq!(primeira.venda.numero + 1, segunda.venda.numero);

    let pagina = VendaRepository::new(db.clone())
        .list(&VendaFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(pagina.data[0].numero, segunda.venda.numero);
}

#[tokio::test]
async fn test_installments_above_payment_method_limit() {
    let db = setup_db().await;
    let base = seed_base(&db).await;

    let err = VendaRepository::new(db.clone())
        .create(&base.ator(), venda_input(&base, 13))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Venda(VendaError::ParcelasExcedidas { max: 12 })
    ));
}

#[tokio::test]
async fn test_cancel_cancels_pending_receivables() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let venda = criar_venda(&db, &base, 2).await;

    let cancelada = VendaRepository::new(db.clone())
        .cancelar(&base.ator(), venda.venda.id)
        .await
        .unwrap();

    assert_eq!(cancelada.venda.status, "cancelada");
    assert!(cancelada.recebimentos.iter().all(|r| r.status == "cancelado"));
}

#[tokio::test]
async fn test_cancel_blocked_by_settled_receivable() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let venda = criar_venda(&db, &base, 2).await;

    RecebimentoRepository::new(db.clone())
        .baixar(
            &base.ator(),
            venda.recebimentos[0].id,
            BaixaInput {
                valor: dec!(10),
                data: Some(data(20)),
                conta_bancaria_id: None,
            },
        )
        .await
        .unwrap();

    let repo = VendaRepository::new(db.clone());
    let err = repo.cancelar(&base.ator(), venda.venda.id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Venda(VendaError::RecebimentoLiquidado)
    ));

    let atual = repo.find(venda.venda.id, false).await.unwrap();
    assert_eq!(atual.venda.status, "aberta");
    assert_eq!(atual.recebimentos[1].status, "pendente");
}

#[tokio::test]
async fn test_completed_sale_only_accepts_notes() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = VendaRepository::new(db.clone());
    let venda = criar_venda(&db, &base, 1).await;

    repo.concluir(&base.ator(), venda.venda.id).await.unwrap();

    let err = repo
        .update(
            &base.ator(),
            venda.venda.id,
            UpdateVendaInput {
                data_venda: Some(data(11)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Venda(VendaError::NaoEditavel(_))));

    let atualizada = repo
        .update(
            &base.ator(),
            venda.venda.id,
            UpdateVendaInput {
                observacoes: Some(Some("Entregue".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(atualizada.venda.observacoes.as_deref(), Some("Entregue"));

    let cancelada = repo.cancelar(&base.ator(), venda.venda.id).await.unwrap();
    assert_eq!(cancelada.venda.status, "cancelada");
    assert!(matches!(
        repo.cancelar(&base.ator(), venda.venda.id).await,
        Err(RepositoryError::Venda(VendaError::TransicaoInvalida { .. }))
    ));
}

#[tokio::test]
async fn test_only_cancelled_sales_are_deleted() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = VendaRepository::new(db.clone());
    let venda = criar_venda(&db, &base, 2).await;

    assert!(matches!(
        repo.delete(&base.ator(), venda.venda.id).await,
        Err(RepositoryError::InvalidState(_))
    ));

    repo.cancelar(&base.ator(), venda.venda.id).await.unwrap();
    repo.delete(&base.ator(), venda.venda.id).await.unwrap();

    let deletada = repo.find(venda.venda.id, true).await.unwrap();
    assert!(deletada.venda.deletado_em.is_some());
    assert!(deletada.recebimentos.iter().all(|r| r.deletado_em.is_some()));
}
