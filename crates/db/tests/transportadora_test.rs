//! Repository tests for carriers: the carrier row and its contacts and
//! addresses are written together.

mod common;

use common::{auditoria_de, setup_db};
use gestor_db::repositories::{
    Ator, ContatoInput, CreateTransportadoraInput, EnderecoInput, RepositoryError,
    TransportadoraRepository, UpdateTransportadoraInput,
};

fn contato(nome: &str) -> ContatoInput {
    ContatoInput {
        nome: nome.to_string(),
        email: Some(format!("{}@transportes.test", nome.to_lowercase())),
        telefone: None,
        cargo: Some("Comercial".to_string()),
    }
}

fn endereco(logradouro: &str, principal: bool) -> EnderecoInput {
    EnderecoInput {
        logradouro: logradouro.to_string(),
        numero: Some("100".to_string()),
        complemento: None,
        bairro: Some("Centro".to_string()),
        cidade_id: None,
        cep: Some("01310-100".to_string()),
        principal,
    }
}

fn input(cnpj: &str) -> CreateTransportadoraInput {
    CreateTransportadoraInput {
        razao_social: "Rapido Sul Transportes Ltda".to_string(),
        nome_fantasia: Some("Rapido Sul".to_string()),
        cnpj: cnpj.to_string(),
        inscricao_estadual: None,
        rntrc: Some("123456789".to_string()),
        ativo: true,
        external_id: None,
        contatos: vec![contato("Bruno"), contato("Carla")],
        enderecos: vec![endereco("Rua A", false), endereco("Rua B", false)],
    }
}

#[tokio::test]
async fn test_create_writes_children_and_first_address_is_main() {
    let db = setup_db().await;
    let repo = TransportadoraRepository::new(db.clone());

    let detalhe = repo
        .create(&Ator::sistema(), input("12.345.678/0001-95"))
        .await
        .unwrap();

    assert_eq!(detalhe.transportadora.cnpj, "12345678000195");
    assert_eq!(detalhe.contatos.len(), 2);
    assert_eq!(detalhe.contatos[0].email.as_deref(), Some("bruno@transportes.test"));
    assert_eq!(detalhe.enderecos.len(), 2);
    assert_eq!(detalhe.enderecos.iter().filter(|e| e.principal).count(), 1);
    assert_eq!(detalhe.enderecos[0].logradouro, "Rua A");
    assert!(detalhe.enderecos[0].principal);
    assert_eq!(detalhe.enderecos[0].cep.as_deref(), Some("01310100"));

    let auditoria = auditoria_de(&db, detalhe.transportadora.id).await;
    assert_eq!(auditoria.len(), 1);
    assert_eq!(auditoria[0].acao, "criar");
}

#[tokio::test]
async fn test_explicit_main_address_is_kept() {
    let db = setup_db().await;
    let repo = TransportadoraRepository::new(db.clone());

    let mut dados = input("12345678000195");
    dados.enderecos = vec![endereco("Rua A", false), endereco("Rua B", true)];
    let detalhe = repo.create(&Ator::sistema(), dados).await.unwrap();

    let principal: Vec<_> = detalhe.enderecos.iter().filter(|e| e.principal).collect();
    assert_eq!(principal.len(), 1);
    assert_eq!(principal[0].logradouro, "Rua B");
}

#[tokio::test]
async fn test_update_replaces_only_provided_collections() {
    let db = setup_db().await;
    let repo = TransportadoraRepository::new(db.clone());
    let ator = Ator::sistema();
    let criada = repo.create(&ator, input("12345678000195")).await.unwrap();
    let id = criada.transportadora.id;

    let atualizada = repo
        .update(
            &ator,
            id,
            UpdateTransportadoraInput {
                contatos: Some(vec![contato("Daniel")]),
                ..UpdateTransportadoraInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(atualizada.contatos.len(), 1);
    assert_eq!(atualizada.contatos[0].nome, "Daniel");
    // Addresses were not sent and stay as stored.
    assert_eq!(atualizada.enderecos.len(), 2);

    let atualizada = repo
        .update(
            &ator,
            id,
            UpdateTransportadoraInput {
                razao_social: Some("Rapido Sul Logistica".to_string()),
                enderecos: Some(vec![endereco("Avenida Nova", false)]),
                ..UpdateTransportadoraInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(atualizada.transportadora.razao_social, "Rapido Sul Logistica");
    assert_eq!(atualizada.enderecos.len(), 1);
    assert_eq!(atualizada.enderecos[0].logradouro, "Avenida Nova");
    assert!(atualizada.enderecos[0].principal);
    assert_eq!(atualizada.contatos.len(), 1);

    let recarregada = repo.find(id, false).await.unwrap();
    assert_eq!(recarregada.enderecos.len(), 1);
    assert_eq!(recarregada.contatos.len(), 1);
}

#[tokio::test]
async fn test_two_main_addresses_are_rejected() {
    let db = setup_db().await;
    let repo = TransportadoraRepository::new(db.clone());
    let ator = Ator::sistema();

    let mut dados = input("12345678000195");
    dados.enderecos = vec![endereco("Rua A", true), endereco("Rua B", true)];
    let err = repo.create(&ator, dados).await.unwrap_err();
    let RepositoryError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.contains("enderecos"));

    let criada = repo.create(&ator, input("12345678000195")).await.unwrap();
    let err = repo
        .update(
            &ator,
            criada.transportadora.id,
            UpdateTransportadoraInput {
                enderecos: Some(vec![endereco("Rua C", true), endereco("Rua D", true)]),
                ..UpdateTransportadoraInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    // The failed update left the stored addresses untouched.
    let atual = repo.find(criada.transportadora.id, false).await.unwrap();
    assert_eq!(atual.enderecos.len(), 2);
}

#[tokio::test]
async fn test_duplicate_cnpj_is_rejected_even_when_deleted() {
    let db = setup_db().await;
    let repo = TransportadoraRepository::new(db.clone());
    let ator = Ator::sistema();
    let criada = repo.create(&ator, input("12345678000195")).await.unwrap();

    let err = repo
        .create(&ator, input("12.345.678/0001-95"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate { campo: "cnpj", .. }));

    repo.delete(&ator, criada.transportadora.id).await.unwrap();
    let err = repo.create(&ator, input("12345678000195")).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate { campo: "cnpj", .. }));

    let outra = repo.create(&ator, input("98765432000198")).await.unwrap();
    let err = repo
        .update(
            &ator,
            outra.transportadora.id,
            UpdateTransportadoraInput {
                cnpj: Some("12345678000195".to_string()),
                ..UpdateTransportadoraInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate { campo: "cnpj", .. }));
}
