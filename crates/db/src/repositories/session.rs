//! Session repository: refresh tokens stored as SHA-256 hashes.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::common::agora;
use super::tokens::hash_token;
use crate::entities::sessoes;

/// Client metadata stored with a session.
#[derive(Debug, Clone, Default)]
pub struct SessionMeta {
    /// `User-Agent` header.
    pub user_agent: Option<String>,
    /// Client IP.
    pub ip: Option<String>,
}

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a session for `refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        colaborador_id: Uuid,
        refresh_token: &str,
        expira_em: DateTime<Utc>,
        meta: &SessionMeta,
    ) -> Result<sessoes::Model, DbErr> {
        let now = agora();
        sessoes::ActiveModel {
            id: Set(Uuid::new_v4()),
            colaborador_id: Set(colaborador_id),
            refresh_token_hash: Set(hash_token(refresh_token)),
            user_agent: Set(meta.user_agent.clone()),
            ip: Set(meta.ip.clone()),
            expira_em: Set(expira_em.fixed_offset()),
            revogada_em: Set(None),
            criado_em: Set(now),
            atualizado_em: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Finds the live (not revoked, not expired) session of a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessoes::Model>, DbErr> {
        sessoes::Entity::find()
            .filter(sessoes::Column::RefreshTokenHash.eq(hash_token(refresh_token)))
            .filter(sessoes::Column::RevogadaEm.is_null())
            .filter(sessoes::Column::ExpiraEm.gt(agora()))
            .one(&self.db)
            .await
    }

    /// Revokes `old` and creates a session for the new refresh token atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn rotate(
        &self,
        old: &sessoes::Model,
        new_refresh_token: &str,
        expira_em: DateTime<Utc>,
        meta: &SessionMeta,
    ) -> Result<sessoes::Model, DbErr> {
        let txn = self.db.begin().await?;
        let now = agora();

        sessoes::ActiveModel {
            id: Set(old.id),
            revogada_em: Set(Some(now)),
            atualizado_em: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        let created = sessoes::ActiveModel {
            id: Set(Uuid::new_v4()),
            colaborador_id: Set(old.colaborador_id),
            refresh_token_hash: Set(hash_token(new_refresh_token)),
            user_agent: Set(meta.user_agent.clone()),
            ip: Set(meta.ip.clone()),
            expira_em: Set(expira_em.fixed_offset()),
            revogada_em: Set(None),
            criado_em: Set(now),
            atualizado_em: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    /// Revokes the session of a refresh token. Returns false if none was live.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> Result<bool, DbErr> {
        let now = agora();
        let result = sessoes::Entity::update_many()
            .col_expr(sessoes::Column::RevogadaEm, Expr::value(now))
            .col_expr(sessoes::Column::AtualizadoEm, Expr::value(now))
            .filter(sessoes::Column::RefreshTokenHash.eq(hash_token(refresh_token)))
            .filter(sessoes::Column::RevogadaEm.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Revokes every live session of a colaborador, optionally keeping one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all(
        &self,
        colaborador_id: Uuid,
        keep: Option<Uuid>,
    ) -> Result<u64, DbErr> {
        let now = agora();
        let mut update = sessoes::Entity::update_many()
            .col_expr(sessoes::Column::RevogadaEm, Expr::value(now))
            .col_expr(sessoes::Column::AtualizadoEm, Expr::value(now))
            .filter(sessoes::Column::ColaboradorId.eq(colaborador_id))
            .filter(sessoes::Column::RevogadaEm.is_null());
        if let Some(id) = keep {
            update = update.filter(sessoes::Column::Id.ne(id));
        }
        Ok(update.exec(&self.db).await?.rows_affected)
    }
}
