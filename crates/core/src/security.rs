//! Brute-force guard and CSRF token policies.
//!
//! The guard is a bounded counter with a timeout: attempts inside a window are
//! counted and, once the threshold is reached, the identifier is blocked until a
//! deadline. Storage lives in the database layer; the decisions live here.

use chrono::{DateTime, Duration, Utc};

/// Thresholds for one guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed inside the window; reaching it blocks.
    pub max_tentativas: u32,
    /// Counting window.
    pub janela: Duration,
    /// How long a block lasts.
    pub bloqueio: Duration,
}

/// Outcome of checking an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    /// The identifier may proceed.
    Liberado,
    /// Blocked until the deadline.
    Bloqueado {
        /// Deadline of the block.
        ate: DateTime<Utc>,
    },
}

impl RateLimitStatus {
    /// Seconds until the block ends (0 when free), rounded up.
    #[must_use]
    pub fn retry_after_secs(&self, agora: DateTime<Utc>) -> u64 {
        match self {
            Self::Liberado => 0,
            Self::Bloqueado { ate } => {
                let millis = (*ate - agora).num_milliseconds().max(0);
                u64::try_from(millis).unwrap_or(0).div_ceil(1000)
            }
        }
    }
}

impl RateLimitPolicy {
    /// Builds a policy from second-based settings.
    #[must_use]
    pub fn from_secs(max_tentativas: u32, janela_secs: u64, bloqueio_secs: u64) -> Self {
        Self {
            max_tentativas: max_tentativas.max(1),
            janela: Duration::seconds(i64::try_from(janela_secs).unwrap_or(i64::MAX / 1000)),
            bloqueio: Duration::seconds(i64::try_from(bloqueio_secs).unwrap_or(i64::MAX / 1000)),
        }
    }

    /// Start of the counting window ending at `agora`.
    #[must_use]
    pub fn inicio_janela(&self, agora: DateTime<Utc>) -> DateTime<Utc> {
        agora - self.janela
    }

    /// True when `tentativas` inside the window reached the threshold.
    #[must_use]
    pub const fn deve_bloquear(&self, tentativas: u64) -> bool {
        tentativas >= self.max_tentativas as u64
    }

    /// Deadline of a block starting at `agora`.
    #[must_use]
    pub fn bloqueado_ate(&self, agora: DateTime<Utc>) -> DateTime<Utc> {
        agora + self.bloqueio
    }

    /// Derives the status from the latest stored deadline.
    #[must_use]
    pub fn status(
        &self,
        bloqueio_ativo: Option<DateTime<Utc>>,
        agora: DateTime<Utc>,
    ) -> RateLimitStatus {
        match bloqueio_ativo {
            Some(ate) if ate > agora => RateLimitStatus::Bloqueado { ate },
            _ => RateLimitStatus::Liberado,
        }
    }
}

/// Identifier for the login guard: e-mail (case-insensitive) plus client IP.
#[must_use]
pub fn chave_login(email: &str, ip: &str) -> String {
    format!("{}|{ip}", email.trim().to_lowercase())
}

/// HTTP methods that change state and therefore require a CSRF token.
#[must_use]
pub fn metodo_exige_csrf(method: &str) -> bool {
    matches!(
        method.to_ascii_uppercase().as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::from_secs(5, 900, 600)
    }

    #[test]
    fn test_threshold() {
        let p = policy();
        assert!(!p.deve_bloquear(4));
        assert!(p.deve_bloquear(5));
        assert!(p.deve_bloquear(6));
    }

    #[test]
    fn test_zero_threshold_is_clamped_to_one() {
        let p = RateLimitPolicy::from_secs(0, 60, 60);
        assert!(!p.deve_bloquear(0));
        assert!(p.deve_bloquear(1));
    }

    #[test]
    fn test_window_and_deadline() {
        let p = policy();
        let agora = Utc::now();
        assert_eq!(p.inicio_janela(agora), agora - Duration::seconds(900));
        assert_eq!(p.bloqueado_ate(agora), agora + Duration::seconds(600));
    }

    #[test]
    fn test_status_from_deadline() {
        let p = policy();
        let agora = Utc::now();

        assert_eq!(p.status(None, agora), RateLimitStatus::Liberado);
        assert_eq!(
            p.status(Some(agora - Duration::seconds(1)), agora),
            RateLimitStatus::Liberado
        );

        let ate = agora + Duration::milliseconds(30_500);
        let status = p.status(Some(ate), agora);
        assert_eq!(status, RateLimitStatus::Bloqueado { ate });
        assert_eq!(status.retry_after_secs(agora), 31);
    }

    #[test]
    fn test_login_key_is_normalized() {
        assert_eq!(
            chave_login("  Maria@Loja.COM ", "10.0.0.1"),
            "maria@loja.com|10.0.0.1"
        );
    }

    #[test]
    fn test_csrf_methods() {
        assert!(metodo_exige_csrf("POST"));
        assert!(metodo_exige_csrf("delete"));
        assert!(!metodo_exige_csrf("GET"));
        assert!(!metodo_exige_csrf("OPTIONS"));
    }
}
