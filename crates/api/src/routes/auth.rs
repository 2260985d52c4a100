//! Authentication routes: login, token refresh, logout, CSRF and password change.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use gestor_core::auth::{verify_password, verify_password_without_account};
use gestor_core::security::{RateLimitPolicy, RateLimitStatus, chave_login};
use gestor_core::validation::FieldErrors;
use gestor_db::entities::{colaboradores, roles};
use gestor_db::repositories::{
    Ator, AuditoriaRepository, ColaboradorRepository, CsrfRepository, Evento,
    RateLimitRepository, RbacRepository, SessionMeta, SessionRepository,
};
use gestor_shared::{
    AlterarSenhaRequest, AppError, LoginRequest, RefreshRequest, SecurityConfig, TokenPair,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};

use crate::extractors::Sessao;
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::{ACAO_LOGIN, politica_login};
use crate::{ApiError, AppState};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes for an authenticated colaborador.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/csrf", get(csrf))
        .route("/auth/senha", put(alterar_senha))
}

fn cookie(nome: &str, valor: String, security: &SecurityConfig) -> Cookie<'static> {
    Cookie::build((nome.to_string(), valor))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Strict)
        .build()
}

fn com_tokens(jar: CookieJar, pair: &TokenPair, security: &SecurityConfig) -> CookieJar {
    jar.add(cookie(&security.access_cookie, pair.access_token.clone(), security))
        .add(cookie(&security.refresh_cookie, pair.refresh_token.clone(), security))
}

fn sem_tokens(jar: CookieJar, security: &SecurityConfig) -> CookieJar {
    jar.remove(Cookie::build(security.access_cookie.clone()).path("/"))
        .remove(Cookie::build(security.refresh_cookie.clone()).path("/"))
}

/// Parses an optional JSON body; an empty body yields the default.
fn corpo_opcional<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "invalid_body", e.to_string()))
}

fn ttl(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
}

/// Role and level degree for token claims; inactive roles cannot sign in.
async fn role_ativa(
    state: &AppState,
    colaborador: &colaboradores::Model,
) -> Result<(roles::Model, i32), ApiError> {
    let rbac = RbacRepository::new(state.conn());
    let role = rbac.find_role(colaborador.role_id, false).await?;
    if !role.ativo {
        return Err(ApiError::forbidden("role_inativa", "Perfil de acesso inativo"));
    }
    let grau = rbac.find_nivel(role.nivel_id).await?.grau;
    Ok((role, grau))
}

fn emitir_tokens(
    state: &AppState,
    colaborador: &colaboradores::Model,
    grau: i32,
) -> Result<TokenPair, ApiError> {
    state
        .jwt_service
        .generate_token_pair(colaborador.id, colaborador.role_id, grau)
        .map_err(|e| AppError::Internal(e.to_string()).into())
}

/// Records a failed attempt and builds the matching error.
async fn falha_login(
    state: &AppState,
    limites: &RateLimitRepository,
    policy: &RateLimitPolicy,
    chave: &str,
    meta: &SessionMeta,
) -> ApiError {
    let agora = Utc::now();
    let status = match limites.registrar(policy, chave, ACAO_LOGIN, agora).await {
        Ok(status) => status,
        Err(e) => return e.into(),
    };
    let ator = Ator {
        colaborador_id: None,
        ip: meta.ip.clone(),
    };
    if let Err(e) = AuditoriaRepository::new(state.conn())
        .registrar(&ator, Evento::sem_registro("login_falhou", "colaboradores"))
        .await
    {
        return e.into();
    }

    match status {
        RateLimitStatus::Liberado => {
            ApiError::unauthorized("invalid_credentials", "E-mail ou senha invalidos")
        }
        bloqueado => {
            warn!(chave, "login blocked after repeated failures");
            ApiError::too_many_requests(bloqueado.retry_after_secs(agora))
        }
    }
}

/// POST /auth/login - Authenticate a colaborador and open a session.
async fn login(
    State(state): State<AppState>,
    Sessao(meta): Sessao,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chave = chave_login(&payload.email, meta.ip.as_deref().unwrap_or("desconhecido"));
    let policy = politica_login(&state.security);
    let limites = RateLimitRepository::new(state.conn());

    let agora = Utc::now();
    let status = limites.status(&policy, &chave, ACAO_LOGIN, agora).await?;
    if status != RateLimitStatus::Liberado {
        warn!(%chave, "login attempt while blocked");
        return Err(ApiError::too_many_requests(status.retry_after_secs(agora)));
    }

    let colaboradores = ColaboradorRepository::new(state.conn());
    let encontrado = colaboradores.find_by_email(&payload.email).await?;
    let senha_ok = match &encontrado {
        Some(c) => verify_password(&payload.senha, &c.senha_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        None => verify_password_without_account(&payload.senha),
    };
    let Some(colaborador) = encontrado.filter(|c| senha_ok && c.ativo) else {
        info!(email = %payload.email, "failed login attempt");
        return Err(falha_login(&state, &limites, &policy, &chave, &meta).await);
    };

    let (_, grau) = role_ativa(&state, &colaborador).await?;
    limites.limpar(&chave, ACAO_LOGIN).await?;
    colaboradores.registrar_login(colaborador.id).await?;

    let pair = emitir_tokens(&state, &colaborador, grau)?;
    let expira = Utc::now() + Duration::seconds(state.jwt_service.refresh_token_expires_in());
    SessionRepository::new(state.conn())
        .create(colaborador.id, &pair.refresh_token, expira, &meta)
        .await?;
    let csrf_token = CsrfRepository::new(state.conn())
        .issue(colaborador.id, ttl(state.security.csrf_ttl_secs))
        .await?;

    let ator = Ator::new(colaborador.id, meta.ip.clone());
    AuditoriaRepository::new(state.conn())
        .registrar(&ator, Evento::new("login", "colaboradores", colaborador.id))
        .await?;
    info!(colaborador_id = %colaborador.id, "colaborador logged in");

    let jar = com_tokens(jar, &pair, &state.security);
    Ok((
        jar,
        Json(json!({
            "colaborador": colaborador,
            "access_token": pair.access_token,
            "refresh_token": pair.refresh_token,
            "csrf_token": csrf_token,
            "expires_in": pair.expires_in,
        })),
    ))
}

/// POST /auth/refresh - Rotate the refresh token and issue a new pair.
async fn refresh(
    State(state): State<AppState>,
    Sessao(meta): Sessao,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: RefreshRequest = corpo_opcional(&body)?;
    let token = payload
        .refresh_token
        .or_else(|| jar.get(&state.security.refresh_cookie).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError::unauthorized("missing_token", "Refresh token is required"))?;

    let claims = state
        .jwt_service
        .validate_refresh_token(&token)
        .map_err(|_| ApiError::unauthorized("invalid_token", "Invalid or expired refresh token"))?;

    let sessoes = SessionRepository::new(state.conn());
    let sessao = sessoes
        .find_active_by_token(&token)
        .await?
        .filter(|s| s.colaborador_id == claims.sub)
        .ok_or_else(|| ApiError::unauthorized("session_revoked", "Session is no longer active"))?;

    let colaborador = ColaboradorRepository::new(state.conn())
        .find(claims.sub, false)
        .await?;
    if !colaborador.ativo {
        sessoes.revoke_by_token(&token).await?;
        return Err(ApiError::unauthorized("account_disabled", "Colaborador inativo"));
    }
    let (_, grau) = role_ativa(&state, &colaborador).await?;

    let pair = emitir_tokens(&state, &colaborador, grau)?;
    let expira = Utc::now() + Duration::seconds(state.jwt_service.refresh_token_expires_in());
    sessoes.rotate(&sessao, &pair.refresh_token, expira, &meta).await?;
    info!(colaborador_id = %colaborador.id, "session refreshed");

    let jar = com_tokens(jar, &pair, &state.security);
    Ok((jar, Json(pair)))
}

/// POST /auth/logout - Revoke the session and CSRF tokens, clear cookies.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: RefreshRequest = corpo_opcional(&body)?;
    let token = payload
        .refresh_token
        .or_else(|| jar.get(&state.security.refresh_cookie).map(|c| c.value().to_string()));

    let sessoes = SessionRepository::new(state.conn());
    match token {
        Some(token) => {
            sessoes.revoke_by_token(&token).await?;
        }
        None => {
            sessoes.revoke_all(auth.colaborador_id(), None).await?;
        }
    }
    CsrfRepository::new(state.conn())
        .revoke_all(auth.colaborador_id())
        .await?;
    AuditoriaRepository::new(state.conn())
        .registrar(
            &auth.ator(),
            Evento::new("logout", "colaboradores", auth.colaborador_id()),
        )
        .await?;
    info!(colaborador_id = %auth.colaborador_id(), "colaborador logged out");

    Ok((sem_tokens(jar, &state.security), StatusCode::NO_CONTENT))
}

/// GET /auth/me - The authenticated colaborador with role and permissions.
async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    let colaborador = ColaboradorRepository::new(state.conn())
        .find(auth.colaborador_id(), false)
        .await?;
    let rbac = RbacRepository::new(state.conn());
    let role = rbac.find_role(colaborador.role_id, true).await?;
    let nivel = rbac.find_nivel(role.nivel_id).await?;
    let permissoes = rbac.codigos_efetivos(&role).await?;

    Ok(Json(json!({
        "colaborador": colaborador,
        "role": role,
        "nivel": nivel,
        "permissoes": permissoes,
    })))
}

/// GET /auth/csrf - Issue a fresh CSRF token.
async fn csrf(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    let token = CsrfRepository::new(state.conn())
        .issue(auth.colaborador_id(), ttl(state.security.csrf_ttl_secs))
        .await?;
    Ok(Json(json!({
        "csrf_token": token,
        "expires_in": state.security.csrf_ttl_secs,
    })))
}

/// PUT /auth/senha - Change the own password and end other sessions.
async fn alterar_senha(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    Json(payload): Json<AlterarSenhaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ColaboradorRepository::new(state.conn());
    let colaborador = repo.find(auth.colaborador_id(), false).await?;
    let confere = verify_password(&payload.senha_atual, &colaborador.senha_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !confere {
        return Err(FieldErrors::single("senha_atual", "senha atual incorreta").into());
    }

    repo.alterar_senha(&auth.ator(), colaborador.id, &payload.nova_senha)
        .await?;

    let sessoes = SessionRepository::new(state.conn());
    let atual = match jar.get(&state.security.refresh_cookie) {
        Some(c) => sessoes.find_active_by_token(c.value()).await?.map(|s| s.id),
        None => None,
    };
    let revogadas = sessoes.revoke_all(colaborador.id, atual).await?;
    info!(colaborador_id = %colaborador.id, revogadas, "other sessions revoked");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_defaults() {
        let payload: RefreshRequest = corpo_opcional(&Bytes::new()).unwrap();
        assert!(payload.refresh_token.is_none());

        let payload: RefreshRequest =
            corpo_opcional(&Bytes::from_static(br#"{"refresh_token":"abc"}"#)).unwrap();
        assert_eq!(payload.refresh_token.as_deref(), Some("abc"));

        let err = corpo_opcional::<RefreshRequest>(&Bytes::from_static(b"{")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_cookies_are_http_only() {
        let security = SecurityConfig::default();
        let c = cookie("gestor_access", "tok".to_string(), &security);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Strict));
        assert_eq!(c.path(), Some("/"));
    }
}
