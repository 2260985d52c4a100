//! Repository tests for the registration verticals: validation, uniqueness,
//! soft delete, restore and the audit trail.

mod common;

use common::{auditoria_de, cliente_input, seed_base, setup_db};
use gestor_db::repositories::{
    Ator, ClienteFilter, ClienteRepository, CreateGrupoProdutoInput, CreateProdutoInput,
    CreateServicoInput, GrupoProdutoRepository, ProdutoRepository, RepositoryError,
    ServicoFilter, ServicoRepository, UpdateClienteInput,
};
use gestor_shared::PageRequest;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_cliente_document_is_normalized_and_unique() {
    let db = setup_db().await;
    let repo = ClienteRepository::new(db.clone());
    let ator = Ator::sistema();

    let cliente = repo
        .create(&ator, cliente_input("Padaria Sol", "11.444.777/0001-61"))
        .await
        .unwrap();
    assert_eq!(cliente.documento, "11444777000161");

    let err = repo
        .create(&ator, cliente_input("Outra", "11444777000161"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Duplicate {
            campo: "documento",
            ..
        }
    ));
}

#[tokio::test]
async fn test_cliente_rejects_invalid_document() {
    let db = setup_db().await;
    let repo = ClienteRepository::new(db.clone());

    let mut input = cliente_input("Joao", "123.456.789-00");
    input.tipo_pessoa = "F".to_string();
    let err = repo.create(&Ator::sistema(), input).await.unwrap_err();
    let RepositoryError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.contains("documento"));
}

#[tokio::test]
async fn test_soft_delete_hides_row_until_restored() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = ClienteRepository::new(db.clone());
    let ator = base.ator();

    repo.delete(&ator, base.cliente_id).await.unwrap();

    assert!(matches!(
        repo.find(base.cliente_id, false).await,
        Err(RepositoryError::NotFound { .. })
    ));
    let deletado = repo.find(base.cliente_id, true).await.unwrap();
    assert!(deletado.deletado_em.is_some());

    let pagina = repo
        .list(&ClienteFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(pagina.meta.total, 0);

    let restaurado = repo.restore(&ator, base.cliente_id).await.unwrap();
    assert!(restaurado.deletado_em.is_none());

    // Restoring a live row is a state error.
    assert!(matches!(
        repo.restore(&ator, base.cliente_id).await,
        Err(RepositoryError::InvalidState(_))
    ));

    let acoes: Vec<String> = auditoria_de(&db, base.cliente_id)
        .await
        .into_iter()
        .map(|r| r.acao)
        .collect();
    assert_eq!(acoes, ["criar", "excluir", "restaurar"]);
}

#[tokio::test]
async fn test_update_records_before_and_after() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = ClienteRepository::new(db.clone());

    let atualizado = repo
        .update(
            &base.ator(),
            base.cliente_id,
            UpdateClienteInput {
                email: Some(Some("  Compras@Mercado.COM ".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(atualizado.email.as_deref(), Some("compras@mercado.com"));

    let registro = auditoria_de(&db, base.cliente_id)
        .await
        .into_iter()
        .find(|r| r.acao == "atualizar")
        .expect("update audit row");
    assert_eq!(registro.colaborador_id, Some(base.colaborador_id));
    assert_eq!(registro.ip.as_deref(), Some("127.0.0.1"));
    let antes = registro.dados_anteriores.expect("before");
    let depois = registro.dados_novos.expect("after");
    assert_eq!(antes["email"], serde_json::Value::Null);
    assert_eq!(depois["email"], "compras@mercado.com");
}

#[tokio::test]
async fn test_produto_code_uppercase_and_group_in_use() {
    let db = setup_db().await;
    let ator = Ator::sistema();
    let grupos = GrupoProdutoRepository::new(db.clone());
    let produtos = ProdutoRepository::new(db.clone());

    let grupo = grupos
        .create(
            &ator,
            CreateGrupoProdutoInput {
                nome: "Bebidas".to_string(),
                descricao: None,
                ativo: true,
            },
        )
        .await
        .unwrap();
    let produto = produtos
        .create(
            &ator,
            CreateProdutoInput {
                codigo: " ref-001 ".to_string(),
                nome: "Agua mineral".to_string(),
                grupo_id: Some(grupo.id),
                unidade: "UN".to_string(),
                preco_custo: dec!(1.10),
                preco_venda: dec!(2.50),
                estoque: dec!(100),
                ativo: true,
                external_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(produto.codigo, "REF-001");

    assert!(matches!(
        grupos.delete(&ator, grupo.id).await,
        Err(RepositoryError::InUse(_))
    ));

    produtos.delete(&ator, produto.id).await.unwrap();
    grupos.delete(&ator, grupo.id).await.unwrap();
}

#[tokio::test]
async fn test_produto_rejects_negative_price() {
    let db = setup_db().await;
    let err = ProdutoRepository::new(db.clone())
        .create(
            &Ator::sistema(),
            CreateProdutoInput {
                codigo: "X1".to_string(),
                nome: "Item".to_string(),
                grupo_id: None,
                unidade: "UN".to_string(),
                preco_custo: dec!(0),
                preco_venda: dec!(-1),
                estoque: dec!(0),
                ativo: true,
                external_id: None,
            },
        )
        .await
        .unwrap_err();
    let RepositoryError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.contains("preco_venda"));
}

#[tokio::test]
async fn test_pages_cover_live_rows_once() {
    use std::collections::HashSet;

    let db = setup_db().await;
    let repo = ServicoRepository::new(db.clone());
    let ator = Ator::sistema();

    let mut ids = Vec::new();
    for i in 1..=25 {
        let servico = repo
            .create(
                &ator,
                CreateServicoInput {
                    nome: format!("Servico {i:02}"),
                    descricao: None,
                    preco: dec!(10),
                    ativo: true,
                },
            )
            .await
            .unwrap();
        ids.push(servico.id);
    }
    repo.delete(&ator, ids[7]).await.unwrap();

    let filtro = ServicoFilter::default();
    let mut vistos = HashSet::new();
    for pagina in 1..=3 {
        let resposta = repo.list(&filtro, PageRequest::new(pagina, 10)).await.unwrap();
        assert_eq!(resposta.meta.total, 24);
        assert_eq!(resposta.meta.total_pages, 3);
        assert_eq!(resposta.data.len(), if pagina == 3 { 4 } else { 10 });
        for servico in resposta.data {
            assert!(servico.deletado_em.is_none());
            assert!(vistos.insert(servico.id), "row repeated across pages");
        }
    }
    assert_eq!(vistos.len(), 24);
    assert!(!vistos.contains(&ids[7]));

    let alem = repo.list(&filtro, PageRequest::new(4, 10)).await.unwrap();
    assert!(alem.data.is_empty());
    assert_eq!(alem.meta.total, 24);

    let minima = repo
        .list(&filtro, PageRequest { page: 1, per_page: 0 })
        .await
        .unwrap();
    assert_eq!(minima.meta.per_page, 1);
    assert_eq!(minima.data.len(), 1);
    assert_eq!(minima.meta.total_pages, 24);

    let maxima = repo
        .list(&filtro, PageRequest { page: 1, per_page: 1000 })
        .await
        .unwrap();
    assert_eq!(maxima.meta.per_page, 100);
    assert_eq!(maxima.data.len(), 24);
    assert_eq!(maxima.meta.total_pages, 1);
}
