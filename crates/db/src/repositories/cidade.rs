//! Cidade (city) lookups. Cities are reference data loaded by the seeder.

use gestor_core::validation;
use gestor_shared::{PageRequest, PageResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{RepositoryError, limpar, paginar};
use crate::entities::cidades;

/// Filter options for listing cities.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CidadeFilter {
    /// State abbreviation.
    pub uf: Option<String>,
    /// Name search.
    pub busca: Option<String>,
}

/// City repository (read-only).
#[derive(Debug, Clone)]
pub struct CidadeRepository {
    db: DatabaseConnection,
}

impl CidadeRepository {
    /// Creates a new city repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists cities ordered by state and name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for an unknown `uf`.
    pub async fn list(
        &self,
        filter: &CidadeFilter,
        page: PageRequest,
    ) -> Result<PageResponse<cidades::Model>, RepositoryError> {
        let mut query = cidades::Entity::find();
        if let Some(uf) = limpar(filter.uf.clone()) {
            let uf = uf.to_uppercase();
            if !validation::UFS.contains(&uf.as_str()) {
                return Err(validation::FieldErrors::single("uf", "UF invalida").into());
            }
            query = query.filter(cidades::Column::Uf.eq(uf));
        }
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(cidades::Column::Nome.contains(&busca));
        }
        let query = query
            .order_by_asc(cidades::Column::Uf)
            .order_by_asc(cidades::Column::Nome);
        Ok(paginar(&self.db, query, page).await?)
    }

    /// Finds a city by id.
    pub async fn find(&self, id: Uuid) -> Result<cidades::Model, RepositoryError> {
        cidades::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound {
                entidade: "cidades",
                id,
            })
    }
}
