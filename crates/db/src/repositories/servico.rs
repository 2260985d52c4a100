//! Servico (service catalog) repository.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_unico, limpar,
    paginar, restaurar,
};
use crate::entities::servicos;

/// Input for creating a service.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServicoInput {
    /// Unique name.
    pub nome: String,
    /// Description.
    pub descricao: Option<String>,
    /// Price, >= 0.
    pub preco: Decimal,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServicoInput {
    /// Unique name.
    pub nome: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    /// Price.
    pub preco: Option<Decimal>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicoFilter {
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

/// Servico repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ServicoRepository {
    db: DatabaseConnection,
}

impl ServicoRepository {
    /// Creates a new servico repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists services ordered by name.
    pub async fn list(
        &self,
        filter: &ServicoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<servicos::Model>, RepositoryError> {
        let mut query = filtrar_deletados(servicos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(servicos::Column::Nome.contains(&busca));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(servicos::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(servicos::Column::Nome), page).await?)
    }

    /// Finds a service by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<servicos::Model, RepositoryError> {
        buscar::<servicos::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a service.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateServicoInput,
    ) -> Result<servicos::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let descricao = limpar(input.descricao);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 150);
        validation::non_negative(&mut errors, "preco", input.preco);
        errors.into_result()?;

        garantir_unico::<servicos::Entity, _, _>(
            &self.db,
            servicos::Column::Nome,
            nome.clone(),
            None,
            "nome",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let servico = servicos::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            descricao: Set(descricao),
            preco: Set(input.preco),
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
            Evento::new("criar", "servicos", servico.id).depois(&servico),
        )
        .await?;
        txn.commit().await?;

        info!(servico_id = %servico.id, "servico created");
        Ok(servico)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateServicoInput,
    ) -> Result<servicos::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 150);
        if let Some(preco) = input.preco {
            validation::non_negative(&mut errors, "preco", preco);
        }
        errors.into_result()?;

        if let Some(nome) = &nome {
            garantir_unico::<servicos::Entity, _, _>(
                &self.db,
                servicos::Column::Nome,
                nome.clone(),
                Some(id),
                "nome",
            )
            .await?;
        }

        let mut active: servicos::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(descricao) = input.descricao {
            active.descricao = Set(limpar(descricao));
        }
        if let Some(preco) = input.preco {
            active.preco = Set(preco);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let servico = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "servicos", id)
                .antes(&atual)
                .depois(&servico),
        )
        .await?;
        txn.commit().await?;
        Ok(servico)
    }

    /// Soft deletes a service.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<servicos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted service.
    pub async fn restore(&self, ator: &Ator, id: Uuid) -> Result<servicos::Model, RepositoryError> {
        restaurar::<servicos::Entity>(&self.db, ator, id).await
    }
}
