//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent on every request.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (colaborador ID).
    pub sub: Uuid,
    /// Role ID of the colaborador.
    pub role: Uuid,
    /// Degree of the role's level (`niveis.grau`).
    pub nivel: i32,
    /// Token type.
    pub typ: TokenType,
    /// Unique token ID.
    pub jti: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a colaborador.
    #[must_use]
    pub fn new(
        colaborador_id: Uuid,
        role_id: Uuid,
        nivel: i32,
        typ: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: colaborador_id,
            role: role_id,
            nivel,
            typ,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the colaborador ID from claims.
    #[must_use]
    pub const fn colaborador_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the role ID from claims.
    #[must_use]
    pub const fn role_id(&self) -> Uuid {
        self.role
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login e-mail.
    pub email: String,
    /// Plain password.
    pub senha: String,
}

/// `POST /auth/refresh` and `POST /auth/logout` body; the cookie is used when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `PUT /auth/senha` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AlterarSenhaRequest {
    /// Current password.
    pub senha_atual: String,
    /// New password.
    pub nova_senha: String,
}
