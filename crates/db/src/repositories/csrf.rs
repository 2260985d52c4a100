//! CSRF token repository.

use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::common::agora;
use super::tokens::{gerar_token, hash_token};
use crate::entities::csrf_tokens;

/// CSRF token repository.
#[derive(Debug, Clone)]
pub struct CsrfRepository {
    db: DatabaseConnection,
}

impl CsrfRepository {
    /// Creates a new CSRF repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issues a token valid for `ttl` and returns it raw. Expired tokens are purged.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn issue(&self, colaborador_id: Uuid, ttl: Duration) -> Result<String, DbErr> {
        let now = agora();
        csrf_tokens::Entity::delete_many()
            .filter(csrf_tokens::Column::ExpiraEm.lte(now))
            .exec(&self.db)
            .await?;

        let token = gerar_token();
        csrf_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            colaborador_id: Set(colaborador_id),
            token_hash: Set(hash_token(&token)),
            expira_em: Set(now + ttl),
            criado_em: Set(now),
        }
        .insert(&self.db)
        .await?;
        Ok(token)
    }

    /// True when `token` is an unexpired token of `colaborador_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn validate(&self, colaborador_id: Uuid, token: &str) -> Result<bool, DbErr> {
        let count = csrf_tokens::Entity::find()
            .filter(csrf_tokens::Column::ColaboradorId.eq(colaborador_id))
            .filter(csrf_tokens::Column::TokenHash.eq(hash_token(token)))
            .filter(csrf_tokens::Column::ExpiraEm.gt(agora()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Deletes every token of a colaborador.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn revoke_all(&self, colaborador_id: Uuid) -> Result<u64, DbErr> {
        let result = csrf_tokens::Entity::delete_many()
            .filter(csrf_tokens::Column::ColaboradorId.eq(colaborador_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
