//! End-to-end tests of the HTTP layer.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::{ADMIN_EMAIL, ATENDENTE_EMAIL, TestApp, json_request};
use gestor_crm::{CrmContato, CrmError, CrmPagina, CrmProvider, CrmRegistro};
use serde_json::{Value, json};

fn novo_cliente() -> Value {
    json!({
        "nome": "Mercado Central",
        "tipo_pessoa": "J",
        "documento": "11.222.333/0001-81",
        "email": "compras@mercado.test"
    })
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = TestApp::new().await;
    let (status, _, body) = app
        .send(json_request(Method::GET, "/api/v1/health", None, None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_login_returns_tokens_and_cookies() {
    let app = TestApp::new().await;
    let (status, cookies, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": ADMIN_EMAIL, "senha": common::SENHA })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["csrf_token"].is_string());
    assert_eq!(body["colaborador"]["email"], ADMIN_EMAIL);
    assert!(body["colaborador"].get("senha_hash").is_none());
    assert!(cookies.iter().any(|c| c.starts_with("gestor_access=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("gestor_refresh=")));
}

#[tokio::test]
async fn test_repeated_failed_logins_are_blocked() {
    let app = TestApp::new().await;
    let tentativa = || {
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": ADMIN_EMAIL, "senha": "errada" })),
        )
    };

    for _ in 0..4 {
        let (status, _, body) = app.send(tentativa()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
    }
    let (status, _, body) = app.send(tentativa()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["retry_after"].as_u64().unwrap() > 0);

    // Even the right password is refused while blocked.
    let (status, _, _) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": ADMIN_EMAIL, "senha": common::SENHA })),
        ))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_unknown_email_fails_like_wrong_password() {
    let app = TestApp::new().await;
    let login = |email: &str| {
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": email, "senha": "errada123" })),
        )
    };

    let (status_conhecido, cookies, body_conhecido) = app.send(login(ADMIN_EMAIL)).await;
    let (status_desconhecido, _, body_desconhecido) =
        app.send(login("ninguem@gestor.test")).await;

    assert_eq!(status_conhecido, StatusCode::UNAUTHORIZED);
    assert_eq!(status_desconhecido, status_conhecido);
    assert_eq!(body_desconhecido, body_conhecido);
    assert!(cookies.is_empty());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;
    let (status, _, body) = app
        .send(json_request(Method::GET, "/api/v1/clientes", None, None))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, _, body) = app
        .send(json_request(Method::GET, "/api/v1/clientes", Some("nao.e.jwt"), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_mutation_without_csrf_is_rejected() {
    let app = TestApp::new().await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/clientes",
            Some(&login.access_token),
            Some(&novo_cliente()),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "csrf_invalido");

    // Reads do not need the header.
    let (status, _, _) = app
        .send(json_request(
            Method::GET,
            "/api/v1/clientes",
            Some(&login.access_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cliente_lifecycle() {
    let app = TestApp::new().await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, criado) = app
        .call(&login, Method::POST, "/api/v1/clientes", Some(&novo_cliente()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{criado}");
    assert_eq!(criado["documento"], "11222333000181");
    let id = criado["id"].as_str().unwrap().to_string();

    let (status, pagina) = app.call(&login, Method::GET, "/api/v1/clientes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pagina["data"].as_array().unwrap().len(), 1);
    assert_eq!(pagina["meta"]["total"], 1);
    assert_eq!(pagina["meta"]["page"], 1);

    let (status, _) = app
        .call(&login, Method::DELETE, &format!("/api/v1/clientes/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, pagina) = app.call(&login, Method::GET, "/api/v1/clientes", None).await;
    assert_eq!(pagina["meta"]["total"], 0);
    let (_, pagina) = app
        .call(&login, Method::GET, "/api/v1/clientes?incluir_deletados=true", None)
        .await;
    assert_eq!(pagina["meta"]["total"], 1);

    let (status, restaurado) = app
        .call(
            &login,
            Method::POST,
            &format!("/api/v1/clientes/{id}/restaurar"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(restaurado["deletado_em"].is_null());
}

#[tokio::test]
async fn test_validation_errors_have_details() {
    let app = TestApp::new().await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, body) = app
        .call(
            &login,
            Method::POST,
            "/api/v1/clientes",
            Some(&json!({ "nome": "X", "tipo_pessoa": "F", "documento": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"]["documento"].is_array());
}

#[tokio::test]
async fn test_permissions_are_enforced() {
    let app = TestApp::new().await;
    let login = app.login(ATENDENTE_EMAIL).await;

    let (status, _) = app.call(&login, Method::GET, "/api/v1/clientes", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(&login, Method::POST, "/api/v1/clientes", Some(&novo_cliente()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "sem_permissao");

    // Deleted rows need the delete permission.
    let (status, _) = app
        .call(&login, Method::GET, "/api/v1/clientes?incluir_deletados=true", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(&login, Method::GET, "/api/v1/vendas", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_lists_effective_permissions() {
    let app = TestApp::new().await;
    let login = app.login(ATENDENTE_EMAIL).await;

    let (status, body) = app.call(&login, Method::GET, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["colaborador"]["email"], ATENDENTE_EMAIL);
    assert_eq!(body["nivel"]["grau"], 10);
    assert_eq!(body["permissoes"], json!(["clientes.visualizar"]));
}

#[tokio::test]
async fn test_level_rule_blocks_higher_levels() {
    let app = TestApp::new().await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, body) = app
        .call(
            &login,
            Method::POST,
            "/api/v1/niveis",
            Some(&json!({ "nome": "Conselho", "grau": 200 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "nivel_insuficiente");

    let (status, _) = app
        .call(
            &login,
            Method::POST,
            "/api/v1/niveis",
            Some(&json!({ "nome": "Supervisao", "grau": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = TestApp::new().await;
    let (_, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": ADMIN_EMAIL, "senha": common::SENHA })),
        ))
        .await;
    let login = common::Login {
        access_token: body["access_token"].as_str().unwrap().to_string(),
        csrf_token: body["csrf_token"].as_str().unwrap().to_string(),
    };
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            &login,
            Method::POST,
            "/api/v1/auth/logout",
            Some(&json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(&json!({ "refresh_token": refresh_token })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "session_revoked");
}

#[tokio::test]
async fn test_crm_endpoints_need_a_provider() {
    let app = TestApp::new().await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, body) = app
        .call(&login, Method::POST, "/api/v1/crm/clientes/importar", None)
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "crm_desabilitado");
}

/// Serves a fixed two-page listing.
struct CrmFixo;

fn registro(id: &str, nome: &str, documento: Option<&str>) -> CrmRegistro {
    CrmRegistro {
        external_id: id.to_string(),
        contato: CrmContato {
            nome: nome.to_string(),
            email: Some(format!("{id}@crm.test")),
            telefone: None,
            documento: documento.map(str::to_string),
            empresa: None,
        },
    }
}

#[async_trait]
impl CrmProvider for CrmFixo {
    fn nome(&self) -> &'static str {
        "fixo"
    }

    async fn criar(&self, _contato: &CrmContato) -> Result<String, CrmError> {
        Ok("novo-1".to_string())
    }

    async fn atualizar(&self, _id: &str, _contato: &CrmContato) -> Result<(), CrmError> {
        Ok(())
    }

    async fn buscar(&self, _id: &str) -> Result<Option<CrmRegistro>, CrmError> {
        Ok(None)
    }

    async fn listar(&self, cursor: Option<&str>) -> Result<CrmPagina, CrmError> {
        Ok(match cursor {
            None => CrmPagina {
                itens: vec![
                    registro("c1", "Joana Prado", Some("52998224725")),
                    registro("c2", "Sem Documento", None),
                ],
                proximo_cursor: Some("p2".to_string()),
            },
            Some(_) => CrmPagina {
                itens: vec![registro("c3", "   ", Some("11222333000181"))],
                proximo_cursor: None,
            },
        })
    }

    async fn remover(&self, _id: &str) -> Result<(), CrmError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_crm_import_and_sync() {
    let app = TestApp::with_crm(Some(Arc::new(CrmFixo))).await;
    let login = app.login(ADMIN_EMAIL).await;

    let (status, resumo) = app
        .call(&login, Method::POST, "/api/v1/crm/clientes/importar", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{resumo}");
    assert_eq!(resumo, json!({ "criados": 1, "atualizados": 0, "ignorados": 2 }));

    // A second run matches by external_id.
    let (_, resumo) = app
        .call(&login, Method::POST, "/api/v1/crm/clientes/importar", None)
        .await;
    assert_eq!(resumo["atualizados"], 1);
    assert_eq!(resumo["criados"], 0);

    let (_, criado) = app
        .call(&login, Method::POST, "/api/v1/clientes", Some(&novo_cliente()))
        .await;
    let id = criado["id"].as_str().unwrap();
    let (status, sincronizado) = app
        .call(
            &login,
            Method::POST,
            &format!("/api/v1/crm/clientes/{id}/sincronizar"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sincronizado["external_id"], "novo-1");

    let (status, desvinculado) = app
        .call(
            &login,
            Method::DELETE,
            &format!("/api/v1/crm/clientes/{id}/vinculo"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(desvinculado["external_id"].is_null());
}
