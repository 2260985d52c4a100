//! Cliente (customer) repository.

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
use crate::entities::clientes;

/// Pessoa fisica.
pub const PESSOA_FISICA: &str = "F";
/// Pessoa juridica.
pub const PESSOA_JURIDICA: &str = "J";

/// Input for creating a cliente.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClienteInput {
    /// Name or company name.
    pub nome: String,
    /// `F` or `J`.
    pub tipo_pessoa: String,
    /// CPF for `F`, CNPJ for `J`.
    pub documento: String,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub telefone: Option<String>,
    /// City.
    pub cidade_id: Option<Uuid>,
    /// Street address.
    pub endereco: Option<String>,
    /// Postal code.
    pub cep: Option<String>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    /// CRM id.
    pub external_id: Option<String>,
}

/// Input for updating a cliente.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClienteInput {
    /// Name.
    pub nome: Option<String>,
    /// `F` or `J`.
    pub tipo_pessoa: Option<String>,
    /// CPF/CNPJ.
    pub documento: Option<String>,
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
    /// Postal code.
    #[serde(default, deserialize_with = "double_option")]
    pub cep: Option<Option<String>>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
}

/// Filter options for listing clientes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClienteFilter {
    /// Matches name, e-mail or document.
    pub busca: Option<String>,
    /// `F` or `J`.
    pub tipo_pessoa: Option<String>,
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

fn validar_documento(errors: &mut FieldErrors, tipo_pessoa: &str, documento: &str) {
    validation::one_of(
        errors,
        "tipo_pessoa",
        tipo_pessoa,
        &[PESSOA_FISICA, PESSOA_JURIDICA],
    );
    match tipo_pessoa {
        PESSOA_FISICA => validation::cpf(errors, "documento", documento),
        PESSOA_JURIDICA => validation::cnpj(errors, "documento", documento),
        _ => {}
    }
}

/// Cliente repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ClienteRepository {
    db: DatabaseConnection,
}

impl ClienteRepository {
    /// Creates a new cliente repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists clientes ordered by name.
    pub async fn list(
        &self,
        filter: &ClienteFilter,
        page: PageRequest,
    ) -> Result<PageResponse<clientes::Model>, RepositoryError> {
        let mut query = filtrar_deletados(clientes::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            let mut cond = Condition::any()
                .add(clientes::Column::Nome.contains(&busca))
                .add(clientes::Column::Email.contains(busca.to_lowercase()));
            let digitos = validation::somente_digitos(&busca);
            if !digitos.is_empty() {
                cond = cond.add(clientes::Column::Documento.contains(digitos));
            }
            query = query.filter(cond);
        }
        if let Some(tipo) = limpar(filter.tipo_pessoa.clone()) {
            query = query.filter(clientes::Column::TipoPessoa.eq(tipo.to_uppercase()));
        }
        if let Some(cidade_id) = filter.cidade_id {
            query = query.filter(clientes::Column::CidadeId.eq(cidade_id));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(clientes::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(clientes::Column::Nome), page).await?)
    }

    /// Finds a cliente by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<clientes::Model, RepositoryError> {
        buscar::<clientes::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Finds a live cliente by its CRM id.
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<clientes::Model>, RepositoryError> {
        Ok(clientes::Entity::find()
            .filter(clientes::Column::ExternalId.eq(external_id))
            .filter(clientes::Column::DeletadoEm.is_null())
            .one(&self.db)
            .await?)
    }

    /// Finds a live cliente by e-mail.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<clientes::Model>, RepositoryError> {
        Ok(clientes::Entity::find()
            .filter(clientes::Column::Email.eq(email.trim().to_lowercase()))
            .filter(clientes::Column::DeletadoEm.is_null())
            .one(&self.db)
            .await?)
    }

    /// Creates a cliente.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateClienteInput,
    ) -> Result<clientes::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let tipo_pessoa = input.tipo_pessoa.trim().to_uppercase();
        let documento = validation::somente_digitos(&input.documento);
        let email = limpar(input.email).map(|e| e.to_lowercase());
        let telefone = limpar(input.telefone);
        let endereco = limpar(input.endereco);
        let cep = limpar(input.cep).map(|c| validation::somente_digitos(&c));

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 150);
        validar_documento(&mut errors, &tipo_pessoa, &documento);
        validation::optional_email(&mut errors, "email", email.as_deref());
        validation::optional_telefone(&mut errors, "telefone", telefone.as_deref());
        validation::optional_text(&mut errors, "endereco", endereco.as_deref(), 255);
        validation::optional_cep(&mut errors, "cep", cep.as_deref());
        errors.into_result()?;

        garantir_cidade(&self.db, input.cidade_id).await?;
        garantir_unico::<clientes::Entity, _, _>(
            &self.db,
            clientes::Column::Documento,
            documento.clone(),
            None,
            "documento",
        )
        .await?;
        if let Some(email) = &email {
            garantir_unico::<clientes::Entity, _, _>(
                &self.db,
                clientes::Column::Email,
                email.clone(),
                None,
                "email",
            )
            .await?;
        }

        let txn = self.db.begin().await?;
        let now = agora();
        let cliente = clientes::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            tipo_pessoa: Set(tipo_pessoa),
            documento: Set(documento),
            email: Set(email),
            telefone: Set(telefone),
            cidade_id: Set(input.cidade_id),
            endereco: Set(endereco),
            cep: Set(cep),
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
            Evento::new("criar", "clientes", cliente.id).depois(&cliente),
        )
        .await?;
        txn.commit().await?;

        info!(cliente_id = %cliente.id, "cliente created");
        Ok(cliente)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateClienteInput,
    ) -> Result<clientes::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        let tipo_pessoa = input.tipo_pessoa.map(|t| t.trim().to_uppercase());
        let documento = input.documento.as_deref().map(validation::somente_digitos);
        let email = input.email.map(|e| limpar(e).map(|e| e.to_lowercase()));
        let telefone = input.telefone.map(limpar);
        let endereco = input.endereco.map(limpar);
        let cep = input
            .cep
            .map(|c| limpar(c).map(|c| validation::somente_digitos(&c)));

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 150);
        if tipo_pessoa.is_some() || documento.is_some() {
            validar_documento(
                &mut errors,
                tipo_pessoa.as_deref().unwrap_or(&atual.tipo_pessoa),
                documento.as_deref().unwrap_or(&atual.documento),
            );
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
        if let Some(cep) = &cep {
            validation::optional_cep(&mut errors, "cep", cep.as_deref());
        }
        errors.into_result()?;

        if let Some(cidade_id) = input.cidade_id {
            garantir_cidade(&self.db, cidade_id).await?;
        }
        if let Some(documento) = &documento {
            garantir_unico::<clientes::Entity, _, _>(
                &self.db,
                clientes::Column::Documento,
                documento.clone(),
                Some(id),
                "documento",
            )
            .await?;
        }
        if let Some(Some(email)) = &email {
            garantir_unico::<clientes::Entity, _, _>(
                &self.db,
                clientes::Column::Email,
                email.clone(),
                Some(id),
                "email",
            )
            .await?;
        }

        let mut active: clientes::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(tipo_pessoa) = tipo_pessoa {
            active.tipo_pessoa = Set(tipo_pessoa);
        }
        if let Some(documento) = documento {
            active.documento = Set(documento);
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
        if let Some(cep) = cep {
            active.cep = Set(cep);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let cliente = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "clientes", id)
                .antes(&atual)
                .depois(&cliente),
        )
        .await?;
        txn.commit().await?;
        Ok(cliente)
    }

    /// Stores (or clears) the CRM id and records a `sincronizar` audit row.
    pub async fn vincular_crm(
        &self,
        ator: &Ator,
        id: Uuid,
        external_id: Option<String>,
    ) -> Result<clientes::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let mut active: clientes::ActiveModel = atual.clone().into();
        active.external_id = Set(external_id);
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let cliente = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("sincronizar", "clientes", id)
                .antes(&atual)
                .depois(&cliente),
        )
        .await?;
        txn.commit().await?;
        Ok(cliente)
    }

    /// Soft deletes a cliente.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<clientes::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted cliente.
    pub async fn restore(&self, ator: &Ator, id: Uuid) -> Result<clientes::Model, RepositoryError> {
        restaurar::<clientes::Entity>(&self.db, ator, id).await
    }
}
