//! Unit tests for JWT functionality.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{Claims, TokenType};
use crate::jwt::{JwtConfig, JwtError, JwtService};

fn test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_secs: 900,
        refresh_token_expires_secs: 3600,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let colaborador = Uuid::new_v4();
    let role = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(1);
    let before = Utc::now().timestamp();

    let claims = Claims::new(colaborador, role, 50, TokenType::Access, expires_at);

    assert_eq!(claims.colaborador_id(), colaborador);
    assert_eq!(claims.role_id(), role);
    assert_eq!(claims.nivel, 50);
    assert_eq!(claims.typ, TokenType::Access);
    assert!(claims.iat >= before);
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_claims_get_distinct_token_ids() {
    let expires_at = Utc::now() + Duration::hours(1);
    let first = Claims::new(Uuid::nil(), Uuid::nil(), 1, TokenType::Refresh, expires_at);
    let second = Claims::new(Uuid::nil(), Uuid::nil(), 1, TokenType::Refresh, expires_at);

    assert_ne!(first.jti, second.jti);
}

#[test]
fn test_access_token_round_trip() {
    let service = test_service();
    let colaborador = Uuid::new_v4();
    let role = Uuid::new_v4();

    let token = service
        .generate_access_token(colaborador, role, 100)
        .expect("token");
    let claims = service.validate_access_token(&token).expect("valid token");

    assert_eq!(claims.sub, colaborador);
    assert_eq!(claims.role, role);
    assert_eq!(claims.nivel, 100);
}

#[test]
fn test_refresh_token_rejected_as_access() {
    let service = test_service();
    let token = service
        .generate_refresh_token(Uuid::new_v4(), Uuid::new_v4(), 10)
        .expect("token");

    assert!(matches!(
        service.validate_access_token(&token),
        Err(JwtError::WrongType)
    ));
    assert!(service.validate_refresh_token(&token).is_ok());
}

#[test]
fn test_token_pair_uses_configured_expiry() {
    let service = test_service();
    let pair = service
        .generate_token_pair(Uuid::new_v4(), Uuid::new_v4(), 10)
        .expect("pair");

    assert_eq!(pair.expires_in, 900);
    assert_ne!(pair.access_token, pair.refresh_token);
}

#[test]
fn test_expired_token() {
    let service = JwtService::new(JwtConfig {
        secret: "s".to_string(),
        access_token_expires_secs: -600,
        refresh_token_expires_secs: 3600,
    });
    let token = service
        .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), 1)
        .expect("token");

    assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        ..JwtConfig::default()
    });
    let token = other
        .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), 1)
        .expect("token");

    assert!(matches!(
        test_service().validate_token(&token),
        Err(JwtError::DecodingError(_))
    ));
}

#[test]
fn test_invalid_token() {
    let result = test_service().validate_token("invalid.token.here");
    assert!(result.is_err());
}
