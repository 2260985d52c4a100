//! Fornecedor (supplier) repository.

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
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_cidade,
    garantir_unico, limpar, paginar, restaurar,
};
use crate::entities::fornecedores;

/// Input for creating a fornecedor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFornecedorInput {
    /// Company name.
    pub razao_social: String,
    /// Trade name.
    pub nome_fantasia: Option<String>,
    /// CNPJ, punctuation allowed.
    pub cnpj: String,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub telefone: Option<String>,
    /// City.
    pub cidade_id: Option<Uuid>,
    /// Street address.
    pub endereco: Option<String>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    /// CRM id.
    pub external_id: Option<String>,
}

/// Input for updating a fornecedor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFornecedorInput {
    /// Company name.
    pub razao_social: Option<String>,
    /// Trade name.
    #[serde(default, deserialize_with = "double_option")]
    pub nome_fantasia: Option<Option<String>>,
    /// CNPJ.
    pub cnpj: Option<String>,
    /// E-mail.
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    /// Phone.
    #[serde(default, deserialize_with = "double_option")]
    pub telefone: Option<Option<String>>,
    /// City.
    #[serde(default, deserialize_with = "double_option")]
    pub cidade_id: Option<Option<Uuid>>,
    /// Street address.
    #[serde(default, deserialize_with = "double_option")]
    pub endereco: Option<Option<String>>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
}

/// Filter options for listing fornecedores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FornecedorFilter {
    /// Matches company name, trade name or CNPJ.
    pub busca: Option<String>,
    /// City.
    pub cidade_id: Option<Uuid>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

/// Fornecedor repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct FornecedorRepository {
    db: DatabaseConnection,
}

impl FornecedorRepository {
    /// Creates a new fornecedor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists fornecedores ordered by company name.
    pub async fn list(
        &self,
        filter: &FornecedorFilter,
        page: PageRequest,
    ) -> Result<PageResponse<fornecedores::Model>, RepositoryError> {
        let mut query = filtrar_deletados(fornecedores::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            let mut cond = Condition::any()
                .add(fornecedores::Column::RazaoSocial.contains(&busca))
                .add(fornecedores::Column::NomeFantasia.contains(&busca));
            let digitos = validation::somente_digitos(&busca);
            if !digitos.is_empty() {
                cond = cond.add(fornecedores::Column::Cnpj.contains(digitos));
            }
            query = query.filter(cond);
        }
        if let Some(cidade_id) = filter.cidade_id {
            query = query.filter(fornecedores::Column::CidadeId.eq(cidade_id));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(fornecedores::Column::Ativo.eq(ativo));
        }
        Ok(paginar(
            &self.db,
            query.order_by_asc(fornecedores::Column::RazaoSocial),
            page,
        )
        .await?)
    }

    /// Finds a fornecedor by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<fornecedores::Model, RepositoryError> {
        buscar::<fornecedores::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Creates a fornecedor.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateFornecedorInput,
    ) -> Result<fornecedores::Model, RepositoryError> {
        let razao_social = input.razao_social.trim().to_string();
        let nome_fantasia = limpar(input.nome_fantasia);
        let cnpj = validation::somente_digitos(&input.cnpj);
        let email = limpar(input.email).map(|e| e.to_lowercase());
        let telefone = limpar(input.telefone);
        let endereco = limpar(input.endereco);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "razao_social", &razao_social, 150);
        validation::optional_text(&mut errors, "nome_fantasia", nome_fantasia.as_deref(), 150);
        validation::cnpj(&mut errors, "cnpj", &cnpj);
        validation::optional_email(&mut errors, "email", email.as_deref());
        validation::optional_telefone(&mut errors, "telefone", telefone.as_deref());
        validation::optional_text(&mut errors, "endereco", endereco.as_deref(), 255);
        errors.into_result()?;

        garantir_cidade(&self.db, input.cidade_id).await?;
        garantir_unico::<fornecedores::Entity, _, _>(
            &self.db,
            fornecedores::Column::Cnpj,
            cnpj.clone(),
            None,
            "cnpj",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let fornecedor = fornecedores::ActiveModel {
            id: Set(Uuid::new_v4()),
            razao_social: Set(razao_social),
            nome_fantasia: Set(nome_fantasia),
            cnpj: Set(cnpj),
            email: Set(email),
            telefone: Set(telefone),
            cidade_id: Set(input.cidade_id),
            endereco: Set(endereco),
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
            Evento::new("criar", "fornecedores", fornecedor.id).depois(&fornecedor),
        )
        .await?;
        txn.commit().await?;

        info!(fornecedor_id = %fornecedor.id, "fornecedor created");
        Ok(fornecedor)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateFornecedorInput,
    ) -> Result<fornecedores::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let razao_social = input.razao_social.map(|r| r.trim().to_string());
        let nome_fantasia = input.nome_fantasia.map(limpar);
        let cnpj = input.cnpj.as_deref().map(validation::somente_digitos);
        let email = input.email.map(|e| limpar(e).map(|e| e.to_lowercase()));
        let telefone = input.telefone.map(limpar);
        let endereco = input.endereco.map(limpar);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "razao_social", razao_social.as_deref(), 150);
        if let Some(nome_fantasia) = &nome_fantasia {
            validation::optional_text(&mut errors, "nome_fantasia", nome_fantasia.as_deref(), 150);
        }
        if let Some(cnpj) = &cnpj {
            validation::cnpj(&mut errors, "cnpj", cnpj);
        }
        if let Some(email) = &email {
            validation::optional_email(&mut errors, "email", email.as_deref());
        }
        if let Some(telefone) = &telefone {
            validation::optional_telefone(&mut errors, "telefone", telefone.as_deref());
        }
        if let Some(endereco) = &endereco {
            validation::optional_text(&mut errors, "endereco", endereco.as_deref(), 255);
        }
        errors.into_result()?;

        if let Some(cidade_id) = input.cidade_id {
            garantir_cidade(&self.db, cidade_id).await?;
        }
        if let Some(cnpj) = &cnpj {
            garantir_unico::<fornecedores::Entity, _, _>(
                &self.db,
                fornecedores::Column::Cnpj,
                cnpj.clone(),
                Some(id),
                "cnpj",
            )
            .await?;
        }

        let mut active: fornecedores::ActiveModel = atual.clone().into();
        if let Some(razao_social) = razao_social {
            active.razao_social = Set(razao_social);
        }
        if let Some(nome_fantasia) = nome_fantasia {
            active.nome_fantasia = Set(nome_fantasia);
        }
        if let Some(cnpj) = cnpj {
            active.cnpj = Set(cnpj);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(telefone) = telefone {
            active.telefone = Set(telefone);
        }
        if let Some(cidade_id) = input.cidade_id {
            active.cidade_id = Set(cidade_id);
        }
        if let Some(endereco) = endereco {
            active.endereco = Set(endereco);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let fornecedor = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "fornecedores", id)
                .antes(&atual)
                .depois(&fornecedor),
        )
        .await?;
        txn.commit().await?;
        Ok(fornecedor)
    }

    /// Stores (or clears) the CRM id and records a `sincronizar` audit row.
    pub async fn vincular_crm(
        &self,
        ator: &Ator,
        id: Uuid,
        external_id: Option<String>,
    ) -> Result<fornecedores::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let mut active: fornecedores::ActiveModel = atual.clone().into();
        active.external_id = Set(external_id);
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let fornecedor = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("sincronizar", "fornecedores", id)
                .antes(&atual)
                .depois(&fornecedor),
        )
        .await?;
        txn.commit().await?;
        Ok(fornecedor)
    }

    /// Soft deletes a fornecedor.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<fornecedores::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted fornecedor.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<fornecedores::Model, RepositoryError> {
        restaurar::<fornecedores::Entity>(&self.db, ator, id).await
    }
}
