//! Helpers shared by every repository: errors, actor context, pagination and
//! soft delete.

use chrono::Utc;
use gestor_core::auth::PasswordError;
use gestor_core::financeiro::FinanceiroError;
use gestor_core::validation::FieldErrors;
use gestor_core::vendas::VendaError;
use gestor_shared::{AppError, PageRequest, PageResponse};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Select, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use crate::entities::{SoftDelete, cidades};

/// Errors returned by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Row does not exist (or is soft deleted).
    #[error("{entidade} not found: {id}")]
    NotFound {
        /// Table name.
        entidade: &'static str,
        /// Requested id.
        id: Uuid,
    },

    /// Unique key already taken.
    #[error("{campo} '{valor}' already exists")]
    Duplicate {
        /// Field name.
        campo: &'static str,
        /// Offending value.
        valor: String,
    },

    /// A referenced row does not exist or is deleted.
    #[error("{campo} references a missing row: {id}")]
    ReferenceNotFound {
        /// Field name.
        campo: &'static str,
        /// Referenced id.
        id: Uuid,
    },

    /// Row is referenced by active rows and cannot be removed.
    #[error("in use: {0}")]
    InUse(String),

    /// Operation not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Sale rule violated.
    #[error(transparent)]
    Venda(#[from] VendaError),

    /// Settlement rule violated.
    #[error(transparent)]
    Financeiro(#[from] FinanceiroError),

    /// Password hashing failed.
    #[error(transparent)]
    Senha(#[from] PasswordError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FieldErrors> for RepositoryError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::Duplicate { .. } | RepositoryError::InUse(_) => {
                Self::Conflict(err.to_string())
            }
            RepositoryError::ReferenceNotFound { .. } => Self::Validation(err.to_string()),
            RepositoryError::InvalidState(msg) => Self::BusinessRule(msg),
            RepositoryError::Validation(errors) => errors.into(),
            RepositoryError::Venda(e) => e.into(),
            RepositoryError::Financeiro(e) => e.into(),
            RepositoryError::Senha(e) => Self::Internal(e.to_string()),
            RepositoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Who performs a write; recorded in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ator {
    /// Authenticated colaborador, `None` for system tasks.
    pub colaborador_id: Option<Uuid>,
    /// Client IP address.
    pub ip: Option<String>,
}

impl Ator {
    /// Actor for an authenticated request.
    #[must_use]
    pub fn new(colaborador_id: Uuid, ip: Option<String>) -> Self {
        Self {
            colaborador_id: Some(colaborador_id),
            ip,
        }
    }

    /// Actor for seeders and batch jobs.
    #[must_use]
    pub fn sistema() -> Self {
        Self::default()
    }
}

/// Current timestamp in the stored representation.
#[must_use]
pub fn agora() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

/// Trims a value and maps blanks to `None`.
#[must_use]
pub fn limpar(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Runs `query` for one page and counts the whole result set.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn paginar<E, C>(
    conn: &C,
    query: Select<E>,
    page: PageRequest,
) -> Result<PageResponse<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let page = page.normalized();
    let total = query.clone().count(conn).await?;
    let data = query
        .offset(page.offset())
        .limit(page.limit())
        .all(conn)
        .await?;
    Ok(PageResponse::new(data, page.page, page.per_page, total))
}

/// Hides soft-deleted rows unless asked otherwise.
#[must_use]
pub fn filtrar_deletados<E: SoftDelete>(query: Select<E>, incluir_deletados: bool) -> Select<E> {
    if incluir_deletados {
        query
    } else {
        query.filter(E::coluna_deletado_em().is_null())
    }
}

/// Loads a row by id.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when the row is missing or deleted (unless
/// `incluir_deletados`).
pub async fn buscar<E, C>(
    conn: &C,
    id: Uuid,
    incluir_deletados: bool,
) -> Result<E::Model, RepositoryError>
where
    E: SoftDelete,
    C: ConnectionTrait,
{
    filtrar_deletados(
        E::find().filter(E::coluna_id().eq(id)),
        incluir_deletados,
    )
    .one(conn)
    .await?
    .ok_or(RepositoryError::NotFound {
        entidade: E::ENTIDADE,
        id,
    })
}

/// Checks that an optional foreign key points at a live row.
///
/// # Errors
///
/// Returns `RepositoryError::ReferenceNotFound` when it does not.
pub async fn garantir_referencia<E, C>(
    conn: &C,
    campo: &'static str,
    id: Option<Uuid>,
) -> Result<(), RepositoryError>
where
    E: SoftDelete,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(());
    };
    let existe = E::find()
        .filter(E::coluna_id().eq(id))
        .filter(E::coluna_deletado_em().is_null())
        .count(conn)
        .await?
        > 0;
    if existe {
        Ok(())
    } else {
        Err(RepositoryError::ReferenceNotFound { campo, id })
    }
}

/// Checks an optional city reference. Cities have no soft delete.
///
/// # Errors
///
/// Returns `RepositoryError::ReferenceNotFound` when the city does not exist.
pub async fn garantir_cidade<C: ConnectionTrait>(
    conn: &C,
    cidade_id: Option<Uuid>,
) -> Result<(), RepositoryError> {
    let Some(id) = cidade_id else {
        return Ok(());
    };
    if cidades::Entity::find_by_id(id).count(conn).await? > 0 {
        Ok(())
    } else {
        Err(RepositoryError::ReferenceNotFound {
            campo: "cidade_id",
            id,
        })
    }
}

/// Fails with `Duplicate` when another row (deleted ones included) already has
/// `valor` in `coluna`.
///
/// # Errors
///
/// Returns `RepositoryError::Duplicate` or a database error.
pub async fn garantir_unico<E, C, V>(
    conn: &C,
    coluna: E::Column,
    valor: V,
    ignorar_id: Option<Uuid>,
    campo: &'static str,
) -> Result<(), RepositoryError>
where
    E: SoftDelete,
    E::Model: Sync,
    C: ConnectionTrait,
    V: Into<sea_orm::Value> + ToString,
{
    let exibir = valor.to_string();
    let mut query = E::find().filter(coluna.eq(valor));
    if let Some(id) = ignorar_id {
        query = query.filter(E::coluna_id().ne(id));
    }
    if query.count(conn).await? > 0 {
        return Err(RepositoryError::Duplicate {
            campo,
            valor: exibir,
        });
    }
    Ok(())
}

/// Soft deletes a live row and records the audit entry in one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when the row is missing or already deleted.
pub async fn excluir<E>(db: &DatabaseConnection, ator: &Ator, id: Uuid) -> Result<(), RepositoryError>
where
    E: SoftDelete,
    E::Model: Serialize,
{
    let txn = db.begin().await?;
    let atual = buscar::<E, _>(&txn, id, false).await?;
    let momento = agora();

    E::update_many()
        .col_expr(E::coluna_deletado_em(), Expr::value(momento))
        .col_expr(E::coluna_atualizado_em(), Expr::value(momento))
        .filter(E::coluna_id().eq(id))
        .exec(&txn)
        .await?;

    auditoria::registrar(
        &txn,
        ator,
        Evento::new("excluir", E::ENTIDADE, id).antes(&atual),
    )
    .await?;
    txn.commit().await?;
    Ok(())
}

/// Clears `deletado_em` of a deleted row and records the audit entry.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when the row does not exist and
/// `RepositoryError::InvalidState` when it is not deleted.
pub async fn restaurar<E>(
    db: &DatabaseConnection,
    ator: &Ator,
    id: Uuid,
) -> Result<E::Model, RepositoryError>
where
    E: SoftDelete,
    E::Model: Serialize,
{
    let txn = db.begin().await?;
    let atual = buscar::<E, _>(&txn, id, true).await?;
    let live = buscar::<E, _>(&txn, id, false).await;
    if live.is_ok() {
        return Err(RepositoryError::InvalidState(format!(
            "{} {id} is not deleted",
            E::ENTIDADE
        )));
    }

    E::update_many()
        .col_expr(
            E::coluna_deletado_em(),
            Expr::value(Option::<DateTimeWithTimeZone>::None),
        )
        .col_expr(E::coluna_atualizado_em(), Expr::value(agora()))
        .filter(E::coluna_id().eq(id))
        .exec(&txn)
        .await?;

    let restaurado = buscar::<E, _>(&txn, id, false).await?;
    auditoria::registrar(
        &txn,
        ator,
        Evento::new("restaurar", E::ENTIDADE, id)
            .antes(&atual)
            .depois(&restaurado),
    )
    .await?;
    txn.commit().await?;
    Ok(restaurado)
}
