//! Forma de pagamento (payment method) repository.

use gestor_core::validation::{self, FieldErrors};
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
use crate::entities::formas_pagamento;

/// Accepted payment kinds.
pub const TIPOS_PAGAMENTO: [&str; 6] = [
    "dinheiro",
    "pix",
    "cartao_credito",
    "cartao_debito",
    "boleto",
    "transferencia",
];

/// Input for creating a payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormaPagamentoInput {
    /// Unique name.
    pub nome: String,
    /// One of [`TIPOS_PAGAMENTO`].
    pub tipo: String,
    /// Installments allowed, >= 1.
    #[serde(default = "max_parcelas_padrao")]
    pub max_parcelas: i32,
    /// Fee percentage, 0..=100.
    #[serde(default)]
    pub taxa_percentual: Decimal,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a payment method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFormaPagamentoInput {
    /// Unique name.
    pub nome: Option<String>,
    /// Kind.
    pub tipo: Option<String>,
    /// Installments allowed.
    pub max_parcelas: Option<i32>,
    /// Fee percentage.
    pub taxa_percentual: Option<Decimal>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing payment methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormaPagamentoFilter {
    /// Name search.
    pub busca: Option<String>,
    /// Kind.
    pub tipo: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

const fn max_parcelas_padrao() -> i32 {
    1
}

fn validar_valores(errors: &mut FieldErrors, max_parcelas: Option<i32>, taxa: Option<Decimal>) {
    if max_parcelas.is_some_and(|m| !(1..=120).contains(&m)) {
        errors.add("max_parcelas", "deve estar entre 1 e 120");
    }
    if let Some(taxa) = taxa
        && (taxa < Decimal::ZERO || taxa > Decimal::ONE_HUNDRED)
    {
        errors.add("taxa_percentual", "deve estar entre 0 e 100");
    }
}

/// Payment method repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct FormaPagamentoRepository {
    db: DatabaseConnection,
}

impl FormaPagamentoRepository {
    /// Creates a new payment method repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists payment methods ordered by name.
    pub async fn list(
        &self,
        filter: &FormaPagamentoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<formas_pagamento::Model>, RepositoryError> {
        let mut query =
            filtrar_deletados(formas_pagamento::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(formas_pagamento::Column::Nome.contains(&busca));
        }
        if let Some(tipo) = limpar(filter.tipo.clone()) {
            query = query.filter(formas_pagamento::Column::Tipo.eq(tipo));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(formas_pagamento::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(formas_pagamento::Column::Nome), page).await?)
    }

    /// Finds a payment method by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<formas_pagamento::Model, RepositoryError> {
        buscar::<formas_pagamento::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a payment method.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateFormaPagamentoInput,
    ) -> Result<formas_pagamento::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let tipo = input.tipo.trim().to_lowercase();

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 60);
        validation::one_of(&mut errors, "tipo", &tipo, &TIPOS_PAGAMENTO);
        validar_valores(&mut errors, Some(input.max_parcelas), Some(input.taxa_percentual));
        errors.into_result()?;

        garantir_unico::<formas_pagamento::Entity, _, _>(
            &self.db,
            formas_pagamento::Column::Nome,
            nome.clone(),
            None,
            "nome",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let forma = formas_pagamento::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            tipo: Set(tipo),
            max_parcelas: Set(input.max_parcelas),
            taxa_percentual: Set(input.taxa_percentual),
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
            Evento::new("criar", "formas_pagamento", forma.id).depois(&forma),
        )
        .await?;
        txn.commit().await?;

        info!(forma_pagamento_id = %forma.id, "forma de pagamento created");
        Ok(forma)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateFormaPagamentoInput,
    ) -> Result<formas_pagamento::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        let tipo = input.tipo.map(|t| t.trim().to_lowercase());

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 60);
        if let Some(tipo) = &tipo {
            validation::one_of(&mut errors, "tipo", tipo, &TIPOS_PAGAMENTO);
        }
        validar_valores(&mut errors, input.max_parcelas, input.taxa_percentual);
        errors.into_result()?;

        if let Some(nome) = &nome {
            garantir_unico::<formas_pagamento::Entity, _, _>(
                &self.db,
                formas_pagamento::Column::Nome,
                nome.clone(),
                Some(id),
                "nome",
            )
            .await?;
        }

        let mut active: formas_pagamento::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(tipo) = tipo {
            active.tipo = Set(tipo);
        }
        if let Some(max) = input.max_parcelas {
            active.max_parcelas = Set(max);
        }
        if let Some(taxa) = input.taxa_percentual {
            active.taxa_percentual = Set(taxa);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let forma = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "formas_pagamento", id)
                .antes(&atual)
                .depois(&forma),
        )
        .await?;
        txn.commit().await?;
        Ok(forma)
    }

    /// Soft deletes a payment method.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<formas_pagamento::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted payment method.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<formas_pagamento::Model, RepositoryError> {
        restaurar::<formas_pagamento::Entity>(&self.db, ator, id).await
    }
}
