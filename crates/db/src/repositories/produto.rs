//! Produto (product) repository.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_referencia,
    garantir_unico, limpar, paginar, restaurar,
};
use crate::entities::{grupos_produtos, produtos};

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProdutoInput {
    /// Unique SKU.
    pub codigo: String,
    /// Name.
    pub nome: String,
    /// Group.
    pub grupo_id: Option<Uuid>,
    /// Unit of measure.
    #[serde(default = "unidade_padrao")]
    pub unidade: String,
    /// Cost price, >= 0.
    #[serde(default)]
    pub preco_custo: Decimal,
    /// Sale price, >= 0.
    pub preco_venda: Decimal,
    /// Stock on hand.
    #[serde(default)]
    pub estoque: Decimal,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    /// CRM id.
    pub external_id: Option<String>,
}

/// Input for updating a product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProdutoInput {
    /// SKU.
    pub codigo: Option<String>,
    /// Name.
    pub nome: Option<String>,
    /// Group.
    #[serde(default, deserialize_with = "double_option")]
    pub grupo_id: Option<Option<Uuid>>,
    /// Unit of measure.
    pub unidade: Option<String>,
    /// Cost price.
    pub preco_custo: Option<Decimal>,
    /// Sale price.
    pub preco_venda: Option<Decimal>,
    /// Stock on hand.
    pub estoque: Option<Decimal>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
}

/// Filter options for listing products.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProdutoFilter {
    /// Matches name or code.
    pub busca: Option<String>,
    /// Group.
    pub grupo_id: Option<Uuid>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

fn unidade_padrao() -> String {
    "UN".to_string()
}

/// Produto repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ProdutoRepository {
    db: DatabaseConnection,
}

impl ProdutoRepository {
    /// Creates a new produto repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists products ordered by name.
    pub async fn list(
        &self,
        filter: &ProdutoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<produtos::Model>, RepositoryError> {
        let mut query = filtrar_deletados(produtos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                Condition::any()
                    .add(produtos::Column::Nome.contains(&busca))
                    .add(produtos::Column::Codigo.contains(busca.to_uppercase())),
            );
        }
        if let Some(grupo_id) = filter.grupo_id {
            query = query.filter(produtos::Column::GrupoId.eq(grupo_id));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(produtos::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(produtos::Column::Nome), page).await?)
    }

    /// Finds a product by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<produtos::Model, RepositoryError> {
        buscar::<produtos::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a product.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateProdutoInput,
    ) -> Result<produtos::Model, RepositoryError> {
        let codigo = input.codigo.trim().to_uppercase();
        let nome = input.nome.trim().to_string();
        let unidade = input.unidade.trim().to_uppercase();

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "codigo", &codigo, 40);
        validation::text(&mut errors, "nome", &nome, 150);
        validation::text(&mut errors, "unidade", &unidade, 6);
        validation::non_negative(&mut errors, "preco_custo", input.preco_custo);
        validation::non_negative(&mut errors, "preco_venda", input.preco_venda);
        errors.into_result()?;

        garantir_referencia::<grupos_produtos::Entity, _>(&self.db, "grupo_id", input.grupo_id)
            .await?;
        garantir_unico::<produtos::Entity, _, _>(
            &self.db,
            produtos::Column::Codigo,
            codigo.clone(),
            None,
            "codigo",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let produto = produtos::ActiveModel {
            id: Set(Uuid::new_v4()),
            codigo: Set(codigo),
            nome: Set(nome),
            grupo_id: Set(input.grupo_id),
            unidade: Set(unidade),
            preco_custo: Set(input.preco_custo),
            preco_venda: Set(input.preco_venda),
            estoque: Set(input.estoque),
            ativo: Set(input.ativo),
            external_id: Set(limpar(input.external_id)),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "produtos", produto.id).depois(&produto),
        )
        .await?;
        txn.commit().await?;

        info!(produto_id = %produto.id, codigo = %produto.codigo, "produto created");
        Ok(produto)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateProdutoInput,
    ) -> Result<produtos::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let codigo = input.codigo.map(|c| c.trim().to_uppercase());
        let nome = input.nome.map(|n| n.trim().to_string());
        let unidade = input.unidade.map(|u| u.trim().to_uppercase());

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "codigo", codigo.as_deref(), 40);
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 150);
        validation::optional_text(&mut errors, "unidade", unidade.as_deref(), 6);
        if let Some(preco) = input.preco_custo {
            validation::non_negative(&mut errors, "preco_custo", preco);
        }
        if let Some(preco) = input.preco_venda {
            validation::non_negative(&mut errors, "preco_venda", preco);
        }
        errors.into_result()?;

        if let Some(grupo_id) = input.grupo_id {
            garantir_referencia::<grupos_produtos::Entity, _>(&self.db, "grupo_id", grupo_id)
                .await?;
        }
        if let Some(codigo) = &codigo {
            garantir_unico::<produtos::Entity, _, _>(
                &self.db,
                produtos::Column::Codigo,
                codigo.clone(),
                Some(id),
                "codigo",
            )
            .await?;
        }

        let mut active: produtos::ActiveModel = atual.clone().into();
        if let Some(codigo) = codigo {
            active.codigo = Set(codigo);
        }
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(grupo_id) = input.grupo_id {
            active.grupo_id = Set(grupo_id);
        }
        if let Some(unidade) = unidade {
            active.unidade = Set(unidade);
        }
        if let Some(preco) = input.preco_custo {
            active.preco_custo = Set(preco);
        }
        if let Some(preco) = input.preco_venda {
            active.preco_venda = Set(preco);
        }
        if let Some(estoque) = input.estoque {
            active.estoque = Set(estoque);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let produto = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "produtos", id)
                .antes(&atual)
                .depois(&produto),
        )
        .await?;
        txn.commit().await?;
        Ok(produto)
    }

    /// Soft deletes a product.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<produtos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted product.
    pub async fn restore(&self, ator: &Ator, id: Uuid) -> Result<produtos::Model, RepositoryError> {
        restaurar::<produtos::Entity>(&self.db, ator, id).await
    }
}
