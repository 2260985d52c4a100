//! Test harness: the full router over an in-memory SQLite database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use gestor_api::{AppState, create_router};
use gestor_crm::CrmProvider;
use gestor_db::entities::{
    abastecimentos, centros_custo, cidades, clientes, colaboradores, contas_bancarias,
    csrf_tokens, formas_pagamento, fornecedores, grupos_produtos, loja_informacoes, niveis,
    pagamentos, permissoes, produtos, rate_limits, recebimentos, registros_auditoria,
    role_permissoes, roles, servicos, sessoes, transportadora_contatos,
    transportadora_enderecos, transportadoras, veiculos, venda_itens, vendas,
};
use gestor_db::repositories::{
    Ator, ColaboradorRepository, CreateColaboradorInput, CreateNivelInput, CreateRoleInput,
    RbacRepository,
};
use gestor_shared::{JwtConfig, JwtService, SecurityConfig};
use http_body_util::BodyExt;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@gestor.test";
pub const ATENDENTE_EMAIL: &str = "atendente@gestor.test";
pub const SENHA: &str = "segredo123";

async fn criar_tabela<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) {
    let backend = db.get_database_backend();
    db.execute(backend.build(&schema.create_table_from_entity(entity)))
        .await
        .expect("create table");
}

async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    let schema = Schema::new(db.get_database_backend());

    criar_tabela(&db, &schema, niveis::Entity).await;
    criar_tabela(&db, &schema, roles::Entity).await;
    criar_tabela(&db, &schema, permissoes::Entity).await;
    criar_tabela(&db, &schema, role_permissoes::Entity).await;
    criar_tabela(&db, &schema, colaboradores::Entity).await;
    criar_tabela(&db, &schema, sessoes::Entity).await;
    criar_tabela(&db, &schema, csrf_tokens::Entity).await;
    criar_tabela(&db, &schema, rate_limits::Entity).await;
    criar_tabela(&db, &schema, registros_auditoria::Entity).await;
    criar_tabela(&db, &schema, cidades::Entity).await;
    criar_tabela(&db, &schema, clientes::Entity).await;
    criar_tabela(&db, &schema, fornecedores::Entity).await;
    criar_tabela(&db, &schema, transportadoras::Entity).await;
    criar_tabela(&db, &schema, transportadora_contatos::Entity).await;
    criar_tabela(&db, &schema, transportadora_enderecos::Entity).await;
    criar_tabela(&db, &schema, grupos_produtos::Entity).await;
    criar_tabela(&db, &schema, produtos::Entity).await;
    criar_tabela(&db, &schema, servicos::Entity).await;
    criar_tabela(&db, &schema, centros_custo::Entity).await;
    criar_tabela(&db, &schema, contas_bancarias::Entity).await;
    criar_tabela(&db, &schema, formas_pagamento::Entity).await;
    criar_tabela(&db, &schema, loja_informacoes::Entity).await;
    criar_tabela(&db, &schema, vendas::Entity).await;
    criar_tabela(&db, &schema, venda_itens::Entity).await;
    criar_tabela(&db, &schema, pagamentos::Entity).await;
    criar_tabela(&db, &schema, recebimentos::Entity).await;
    criar_tabela(&db, &schema, veiculos::Entity).await;
    criar_tabela(&db, &schema, abastecimentos::Entity).await;
    db
}

/// Two colaboradores: a super admin at degree 100 and an attendant at degree 10
/// who may only view clientes.
async fn seed(db: &DatabaseConnection) {
    let sistema = Ator::sistema();
    let rbac = RbacRepository::new(db.clone());
    rbac.sincronizar_catalogo().await.expect("catalogo");

    let diretoria = rbac
        .create_nivel(
            &sistema,
            CreateNivelInput {
                nome: "Diretoria".to_string(),
                grau: 100,
            },
        )
        .await
        .expect("nivel");
    let operacional = rbac
        .create_nivel(
            &sistema,
            CreateNivelInput {
                nome: "Operacional".to_string(),
                grau: 10,
            },
        )
        .await
        .expect("nivel");

    let admin = rbac
        .create_role(
            &sistema,
            CreateRoleInput {
                nome: "Administrador".to_string(),
                descricao: None,
                nivel_id: diretoria.id,
                super_admin: true,
                ativo: true,
            },
        )
        .await
        .expect("role");
    let atendente = rbac
        .create_role(
            &sistema,
            CreateRoleInput {
                nome: "Atendente".to_string(),
                descricao: None,
                nivel_id: operacional.id,
                super_admin: false,
                ativo: true,
            },
        )
        .await
        .expect("role");
    rbac.substituir_permissoes(&sistema, atendente.id, &["clientes.visualizar".to_string()])
        .await
        .expect("permissoes");

    let colaboradores = ColaboradorRepository::new(db.clone());
    for (nome, email, cpf, role_id) in [
        ("Admin", ADMIN_EMAIL, "529.982.247-25", admin.id),
        ("Bruno Lima", ATENDENTE_EMAIL, "111.444.777-35", atendente.id),
    ] {
        colaboradores
            .create(
                &sistema,
                CreateColaboradorInput {
                    nome: nome.to_string(),
                    email: email.to_string(),
                    cpf: cpf.to_string(),
                    telefone: None,
                    cargo: None,
                    senha: SENHA.to_string(),
                    role_id,
                    ativo: true,
                    external_id: None,
                },
            )
            .await
            .expect("colaborador");
    }
}

/// Router plus its database.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// Tokens of a logged-in colaborador.
pub struct Login {
    pub access_token: String,
    pub csrf_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_crm(None).await
    }

    pub async fn with_crm(crm: Option<Arc<dyn CrmProvider>>) -> Self {
        let db = setup_db().await;
        seed(&db).await;
        let state = AppState {
            db: Arc::new(db.clone()),
            jwt_service: Arc::new(JwtService::new(JwtConfig {
                secret: "segredo-de-teste".to_string(),
                ..JwtConfig::default()
            })),
            security: Arc::new(SecurityConfig::default()),
            crm,
        };
        Self {
            router: create_router(state),
            db,
        }
    }

    /// Sends a request and returns status, headers-derived `Set-Cookie` values and the JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<String>, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("ascii cookie").to_string())
            .collect();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, cookies, body)
    }

    pub async fn login(&self, email: &str) -> Login {
        let (status, _, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(&serde_json::json!({ "email": email, "senha": SENHA })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        Login {
            access_token: body["access_token"].as_str().expect("access").to_string(),
            csrf_token: body["csrf_token"].as_str().expect("csrf").to_string(),
        }
    }

    /// Authenticated request carrying the CSRF header.
    pub async fn call(
        &self,
        login: &Login,
        method: Method,
        uri: &str,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let mut request = json_request(method, uri, Some(&login.access_token), body);
        request.headers_mut().insert(
            "x-csrf-token",
            login.csrf_token.parse().expect("header value"),
        );
        let (status, _, body) = self.send(request).await;
        (status, body)
    }
}

/// Builds a JSON request, optionally with a bearer token.
pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
