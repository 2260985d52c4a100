//! Audit trail repository.
//!
//! Writes happen inside the caller's transaction through [`registrar`], so an
//! audit row exists exactly when the audited change was committed.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use gestor_shared::{PageRequest, PageResponse};

use super::common::{Ator, agora, paginar};
use crate::entities::registros_auditoria;

/// One audited change.
#[derive(Debug, Clone)]
pub struct Evento<'a> {
    acao: &'a str,
    entidade: &'a str,
    entidade_id: Option<Uuid>,
    antes: Option<Value>,
    depois: Option<Value>,
}

impl<'a> Evento<'a> {
    /// Event about one row.
    #[must_use]
    pub fn new(acao: &'a str, entidade: &'a str, entidade_id: Uuid) -> Self {
        Self {
            acao,
            entidade,
            entidade_id: Some(entidade_id),
            antes: None,
            depois: None,
        }
    }

    /// Event not tied to a row (e.g. a failed login).
    #[must_use]
    pub fn sem_registro(acao: &'a str, entidade: &'a str) -> Self {
        Self {
            acao,
            entidade,
            entidade_id: None,
            antes: None,
            depois: None,
        }
    }

    /// State before the change.
    #[must_use]
    pub fn antes(mut self, dados: &impl Serialize) -> Self {
        self.antes = serde_json::to_value(dados).ok();
        self
    }

    /// State after the change.
    #[must_use]
    pub fn depois(mut self, dados: &impl Serialize) -> Self {
        self.depois = serde_json::to_value(dados).ok();
        self
    }
}

/// Inserts an audit row using `conn` (usually the caller's transaction).
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn registrar<C: ConnectionTrait>(
    conn: &C,
    ator: &Ator,
    evento: Evento<'_>,
) -> Result<(), DbErr> {
    registros_auditoria::ActiveModel {
        id: Set(Uuid::new_v4()),
        colaborador_id: Set(ator.colaborador_id),
        acao: Set(evento.acao.to_string()),
        entidade: Set(evento.entidade.to_string()),
        entidade_id: Set(evento.entidade_id),
        dados_anteriores: Set(evento.antes),
        dados_novos: Set(evento.depois),
        ip: Set(ator.ip.clone()),
        criado_em: Set(agora()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Filters for the audit listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditoriaFilter {
    /// Table name.
    pub entidade: Option<String>,
    /// Row id.
    pub entidade_id: Option<Uuid>,
    /// Actor.
    pub colaborador_id: Option<Uuid>,
    /// Action (`criar`, `atualizar`, ...).
    pub acao: Option<String>,
}

/// Read side of the audit trail.
#[derive(Debug, Clone)]
pub struct AuditoriaRepository {
    db: DatabaseConnection,
}

impl AuditoriaRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists audit rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &AuditoriaFilter,
        page: PageRequest,
    ) -> Result<PageResponse<registros_auditoria::Model>, DbErr> {
        let mut query = registros_auditoria::Entity::find();
        if let Some(entidade) = &filter.entidade {
            query = query.filter(registros_auditoria::Column::Entidade.eq(entidade.as_str()));
        }
        if let Some(id) = filter.entidade_id {
            query = query.filter(registros_auditoria::Column::EntidadeId.eq(id));
        }
        if let Some(id) = filter.colaborador_id {
            query = query.filter(registros_auditoria::Column::ColaboradorId.eq(id));
        }
        if let Some(acao) = &filter.acao {
            query = query.filter(registros_auditoria::Column::Acao.eq(acao.as_str()));
        }

        let query = query
            .order_by_desc(registros_auditoria::Column::CriadoEm)
            .order_by_desc(registros_auditoria::Column::Id);
        paginar(&self.db, query, page).await
    }

    /// Records an event outside any other write (login, logout, CRM calls).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn registrar(&self, ator: &Ator, evento: Evento<'_>) -> Result<(), DbErr> {
        registrar(&self.db, ator, evento).await
    }
}
