//! Centro de custo (cost center) repository.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_unico, limpar,
    paginar, restaurar,
};
use crate::entities::centros_custo;

/// Input for creating a cost center.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCentroCustoInput {
    /// Unique code.
    pub codigo: String,
    /// Name.
    pub nome: String,
    /// Description.
    pub descricao: Option<String>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a cost center.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCentroCustoInput {
    /// Code.
    pub codigo: Option<String>,
    /// Name.
    pub nome: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing cost centers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CentroCustoFilter {
    /// Matches code or name.
    pub busca: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

/// Cost center repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CentroCustoRepository {
    db: DatabaseConnection,
}

impl CentroCustoRepository {
    /// Creates a new cost center repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists cost centers ordered by code.
    pub async fn list(
        &self,
        filter: &CentroCustoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<centros_custo::Model>, RepositoryError> {
        let mut query = filtrar_deletados(centros_custo::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                Condition::any()
                    .add(centros_custo::Column::Codigo.contains(&busca))
                    .add(centros_custo::Column::Nome.contains(&busca)),
            );
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(centros_custo::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(centros_custo::Column::Codigo), page).await?)
    }

    /// Finds a cost center by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<centros_custo::Model, RepositoryError> {
        buscar::<centros_custo::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a cost center.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateCentroCustoInput,
    ) -> Result<centros_custo::Model, RepositoryError> {
        let codigo = input.codigo.trim().to_string();
        let nome = input.nome.trim().to_string();

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "codigo", &codigo, 20);
        validation::text(&mut errors, "nome", &nome, 100);
        errors.into_result()?;

        garantir_unico::<centros_custo::Entity, _, _>(
            &self.db,
            centros_custo::Column::Codigo,
            codigo.clone(),
            None,
            "codigo",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let centro = centros_custo::ActiveModel {
            id: Set(Uuid::new_v4()),
            codigo: Set(codigo),
            nome: Set(nome),
            descricao: Set(limpar(input.descricao)),
            ativo: Set(input.ativo),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "centros_custo", centro.id).depois(&centro),
        )
        .await?;
        txn.commit().await?;

        info!(centro_custo_id = %centro.id, codigo = %centro.codigo, "centro de custo created");
        Ok(centro)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateCentroCustoInput,
    ) -> Result<centros_custo::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let codigo = input.codigo.map(|c| c.trim().to_string());
        let nome = input.nome.map(|n| n.trim().to_string());

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "codigo", codigo.as_deref(), 20);
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 100);
        errors.into_result()?;

        if let Some(codigo) = &codigo {
            garantir_unico::<centros_custo::Entity, _, _>(
                &self.db,
                centros_custo::Column::Codigo,
                codigo.clone(),
                Some(id),
                "codigo",
            )
            .await?;
        }

        let mut active: centros_custo::ActiveModel = atual.clone().into();
        if let Some(codigo) = codigo {
            active.codigo = Set(codigo);
        }
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(descricao) = input.descricao {
            active.descricao = Set(limpar(descricao));
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let centro = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "centros_custo", id)
                .antes(&atual)
                .depois(&centro),
        )
        .await?;
        txn.commit().await?;
        Ok(centro)
    }

    /// Soft deletes a cost center.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<centros_custo::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted cost center.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<centros_custo::Model, RepositoryError> {
        restaurar::<centros_custo::Entity>(&self.db, ator, id).await
    }
}
