//! API route definitions.

use axum::{Router, middleware};

use crate::AppState;
use crate::middleware::{
    auth::auth_middleware, csrf::csrf_middleware, rate_limit::rate_limit_middleware,
};

pub mod auditoria;
pub mod auth;
pub mod centros_custo;
pub mod cidades;
pub mod clientes;
pub mod colaboradores;
pub mod contas_bancarias;
pub mod crm;
pub mod formas_pagamento;
pub mod fornecedores;
pub mod frota;
pub mod grupos_produtos;
pub mod health;
pub mod loja;
pub mod pagamentos;
pub mod produtos;
pub mod rbac;
pub mod recebimentos;
pub mod servicos;
pub mod transportadoras;
pub mod vendas;

/// Routes that need an authenticated colaborador.
fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::protected_routes())
        .merge(cidades::routes())
        .merge(loja::routes())
        .merge(servicos::routes())
        .merge(clientes::routes())
        .merge(colaboradores::routes())
        .merge(fornecedores::routes())
        .merge(transportadoras::routes())
        .merge(grupos_produtos::routes())
        .merge(produtos::routes())
        .merge(centros_custo::routes())
        .merge(contas_bancarias::routes())
        .merge(formas_pagamento::routes())
        .merge(vendas::routes())
        .merge(pagamentos::routes())
        .merge(recebimentos::routes())
        .merge(rbac::routes())
        .merge(auditoria::routes())
        .merge(crm::routes())
        .merge(frota::routes())
}

/// Creates the API router; middleware that needs state is attached here.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Public auth routes share the per-IP limit.
    let public_routes = auth::public_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_middleware,
    ));

    // Layers run bottom-up: authentication before CSRF.
    let protected_routes = protected_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(public_routes)
        .merge(protected_routes)
}
