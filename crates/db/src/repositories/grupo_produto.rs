//! Product group repository.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
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
use crate::entities::{grupos_produtos, produtos};

/// Input for creating a group.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGrupoProdutoInput {
    /// Unique name.
    pub nome: String,
    /// Description.
    pub descricao: Option<String>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGrupoProdutoInput {
    /// Unique name.
    pub nome: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing groups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrupoProdutoFilter {
    /// Name search.
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

/// Product group repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct GrupoProdutoRepository {
    db: DatabaseConnection,
}

impl GrupoProdutoRepository {
    /// Creates a new product group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists groups ordered by name.
    pub async fn list(
        &self,
        filter: &GrupoProdutoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<grupos_produtos::Model>, RepositoryError> {
        let mut query =
            filtrar_deletados(grupos_produtos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(grupos_produtos::Column::Nome.contains(&busca));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(grupos_produtos::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(grupos_produtos::Column::Nome), page).await?)
    }

    /// Finds a group by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<grupos_produtos::Model, RepositoryError> {
        buscar::<grupos_produtos::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a group.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateGrupoProdutoInput,
    ) -> Result<grupos_produtos::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 100);
        errors.into_result()?;

        garantir_unico::<grupos_produtos::Entity, _, _>(
            &self.db,
            grupos_produtos::Column::Nome,
            nome.clone(),
            None,
            "nome",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let grupo = grupos_produtos::ActiveModel {
            id: Set(Uuid::new_v4()),
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
            Evento::new("criar", "grupos_produtos", grupo.id).depois(&grupo),
        )
        .await?;
        txn.commit().await?;

        info!(grupo_id = %grupo.id, "grupo de produtos created");
        Ok(grupo)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateGrupoProdutoInput,
    ) -> Result<grupos_produtos::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 100);
        errors.into_result()?;

        if let Some(nome) = &nome {
            garantir_unico::<grupos_produtos::Entity, _, _>(
                &self.db,
                grupos_produtos::Column::Nome,
                nome.clone(),
                Some(id),
                "nome",
            )
            .await?;
        }

        let mut active: grupos_produtos::ActiveModel = atual.clone().into();
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
        let grupo = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "grupos_produtos", id)
                .antes(&atual)
                .depois(&grupo),
        )
        .await?;
        txn.commit().await?;
        Ok(grupo)
    }

    /// Soft deletes a group that has no active products.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        let produtos_ativos = produtos::Entity::find()
            .filter(produtos::Column::GrupoId.eq(id))
            .filter(produtos::Column::DeletadoEm.is_null())
            .filter(produtos::Column::Ativo.eq(true))
            .count(&self.db)
            .await?;
        if produtos_ativos > 0 {
            return Err(RepositoryError::InUse(format!(
                "grupo has {produtos_ativos} active produto(s)"
            )));
        }
        excluir::<grupos_produtos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted group.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<grupos_produtos::Model, RepositoryError> {
        restaurar::<grupos_produtos::Entity>(&self.db, ator, id).await
    }
}
