//! Rate-limit guard storage.
//!
//! Each attempt is a row. Reaching the policy threshold inside the window stamps
//! `bloqueado_ate` on the identifier's rows; [`RateLimitRepository::status`]
//! reads the latest deadline back. Attempts older than the window are purged
//! on the next attempt once no block is active on them.

use chrono::{DateTime, Utc};
use gestor_core::security::{RateLimitPolicy, RateLimitStatus};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::rate_limits;

/// Rate-limit repository.
#[derive(Debug, Clone)]
pub struct RateLimitRepository {
    db: DatabaseConnection,
}

impl RateLimitRepository {
    /// Creates a new rate-limit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current status of `identificador` for `acao`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn status(
        &self,
        policy: &RateLimitPolicy,
        identificador: &str,
        acao: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitStatus, DbErr> {
        let latest = rate_limits::Entity::find()
            .filter(rate_limits::Column::Identificador.eq(identificador))
            .filter(rate_limits::Column::Acao.eq(acao))
            .filter(rate_limits::Column::BloqueadoAte.gt(now.fixed_offset()))
            .order_by_desc(rate_limits::Column::BloqueadoAte)
            .one(&self.db)
            .await?;

        Ok(policy.status(
            latest
                .and_then(|row| row.bloqueado_ate)
                .map(|ate| ate.with_timezone(&Utc)),
            now,
        ))
    }

    /// Records an attempt and blocks the identifier when the threshold is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn registrar(
        &self,
        policy: &RateLimitPolicy,
        identificador: &str,
        acao: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitStatus, DbErr> {
        let inicio = policy.inicio_janela(now).fixed_offset();
        rate_limits::Entity::delete_many()
            .filter(rate_limits::Column::Identificador.eq(identificador))
            .filter(rate_limits::Column::Acao.eq(acao))
            .filter(rate_limits::Column::CriadoEm.lte(inicio))
            .filter(
                Condition::any()
                    .add(rate_limits::Column::BloqueadoAte.is_null())
                    .add(rate_limits::Column::BloqueadoAte.lte(now.fixed_offset())),
            )
            .exec(&self.db)
            .await?;

        rate_limits::ActiveModel {
            id: Set(Uuid::new_v4()),
            identificador: Set(identificador.to_string()),
            acao: Set(acao.to_string()),
            criado_em: Set(now.fixed_offset()),
            bloqueado_ate: Set(None),
        }
        .insert(&self.db)
        .await?;

        let tentativas = rate_limits::Entity::find()
            .filter(rate_limits::Column::Identificador.eq(identificador))
            .filter(rate_limits::Column::Acao.eq(acao))
            .filter(rate_limits::Column::CriadoEm.gt(inicio))
            .count(&self.db)
            .await?;

        if !policy.deve_bloquear(tentativas) {
            return Ok(RateLimitStatus::Liberado);
        }

        let ate = policy.bloqueado_ate(now);
        rate_limits::Entity::update_many()
            .col_expr(rate_limits::Column::BloqueadoAte, Expr::value(ate.fixed_offset()))
            .filter(rate_limits::Column::Identificador.eq(identificador))
            .filter(rate_limits::Column::Acao.eq(acao))
            .exec(&self.db)
            .await?;

        warn!(identificador, acao, tentativas, %ate, "rate limit reached, blocking");
        Ok(RateLimitStatus::Bloqueado { ate })
    }

    /// Forgets every attempt of the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn limpar(&self, identificador: &str, acao: &str) -> Result<u64, DbErr> {
        let result = rate_limits::Entity::delete_many()
            .filter(rate_limits::Column::Identificador.eq(identificador))
            .filter(rate_limits::Column::Acao.eq(acao))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
