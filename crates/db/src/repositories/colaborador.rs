//! Colaborador (employee) repository.
//!
//! E-mails are stored lowercase and CPFs as digits only, so uniqueness checks
//! compare normalized values.

use gestor_core::auth::{hash_password, validate_password_strength};
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
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_referencia,
    garantir_unico, limpar, paginar, restaurar,
};
use crate::entities::{colaboradores, roles};

/// Input for creating a colaborador.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateColaboradorInput {
    /// Full name.
    pub nome: String,
    /// Login e-mail.
    pub email: String,
    /// CPF, punctuation allowed.
    pub cpf: String,
    /// Phone.
    pub telefone: Option<String>,
    /// Job title.
    pub cargo: Option<String>,
    /// Plain password; only the hash is stored.
    pub senha: String,
    /// Role.
    pub role_id: Uuid,
    /// May log in.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    /// CRM id.
    pub external_id: Option<String>,
}

/// Input for updating a colaborador. Passwords change through their own endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateColaboradorInput {
    /// Full name.
    pub nome: Option<String>,
    /// Login e-mail.
    pub email: Option<String>,
    /// CPF.
    pub cpf: Option<String>,
    /// Phone.
    #[serde(default, deserialize_with = "double_option")]
    pub telefone: Option<Option<String>>,
    /// Job title.
    #[serde(default, deserialize_with = "double_option")]
    pub cargo: Option<Option<String>>,
    /// Role.
    pub role_id: Option<Uuid>,
    /// May log in.
    pub ativo: Option<bool>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
}

/// Filter options for listing colaboradores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColaboradorFilter {
    /// Matches name or e-mail.
    pub busca: Option<String>,
    /// Only this role.
    pub role_id: Option<Uuid>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

/// Colaborador repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ColaboradorRepository {
    db: DatabaseConnection,
}

impl ColaboradorRepository {
    /// Creates a new colaborador repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists colaboradores ordered by name.
    pub async fn list(
        &self,
        filter: &ColaboradorFilter,
        page: PageRequest,
    ) -> Result<PageResponse<colaboradores::Model>, RepositoryError> {
        let mut query = filtrar_deletados(colaboradores::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                Condition::any()
                    .add(colaboradores::Column::Nome.contains(&busca))
                    .add(colaboradores::Column::Email.contains(busca.to_lowercase())),
            );
        }
        if let Some(role_id) = filter.role_id {
            query = query.filter(colaboradores::Column::RoleId.eq(role_id));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(colaboradores::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(colaboradores::Column::Nome), page).await?)
    }

    /// Finds a colaborador by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<colaboradores::Model, RepositoryError> {
        buscar::<colaboradores::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Finds a live colaborador by login e-mail (active or not).
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<colaboradores::Model>, RepositoryError> {
        Ok(colaboradores::Entity::find()
            .filter(colaboradores::Column::Email.eq(email.trim().to_lowercase()))
            .filter(colaboradores::Column::DeletadoEm.is_null())
            .one(&self.db)
            .await?)
    }

    /// Creates a colaborador with a hashed password.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateColaboradorInput,
    ) -> Result<colaboradores::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let email = input.email.trim().to_lowercase();
        let cpf = validation::somente_digitos(&input.cpf);
        let telefone = limpar(input.telefone);
        let cargo = limpar(input.cargo);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 150);
        validation::email(&mut errors, "email", &email);
        validation::cpf(&mut errors, "cpf", &cpf);
        validation::optional_telefone(&mut errors, "telefone", telefone.as_deref());
        validation::optional_text(&mut errors, "cargo", cargo.as_deref(), 100);
        validate_password_strength("senha", &input.senha, &mut errors);
        errors.into_result()?;

        garantir_referencia::<roles::Entity, _>(&self.db, "role_id", Some(input.role_id)).await?;
        garantir_unico::<colaboradores::Entity, _, _>(
            &self.db,
            colaboradores::Column::Email,
            email.clone(),
            None,
            "email",
        )
        .await?;
        garantir_unico::<colaboradores::Entity, _, _>(
            &self.db,
            colaboradores::Column::Cpf,
            cpf.clone(),
            None,
            "cpf",
        )
        .await?;

        let senha_hash = hash_password(&input.senha)?;
        let txn = self.db.begin().await?;
        let now = agora();
        let colaborador = colaboradores::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            email: Set(email),
            cpf: Set(cpf),
            telefone: Set(telefone),
            cargo: Set(cargo),
            senha_hash: Set(senha_hash),
            role_id: Set(input.role_id),
            ativo: Set(input.ativo),
            ultimo_login_em: Set(None),
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
            Evento::new("criar", "colaboradores", colaborador.id).depois(&colaborador),
        )
        .await?;
        txn.commit().await?;

        info!(colaborador_id = %colaborador.id, "colaborador created");
        Ok(colaborador)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateColaboradorInput,
    ) -> Result<colaboradores::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        let email = input.email.map(|e| e.trim().to_lowercase());
        let cpf = input.cpf.as_deref().map(validation::somente_digitos);
        let telefone = input.telefone.map(limpar);
        let cargo = input.cargo.map(limpar);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 150);
        if let Some(email) = &email {
            validation::email(&mut errors, "email", email);
        }
        if let Some(cpf) = &cpf {
            validation::cpf(&mut errors, "cpf", cpf);
        }
        if let Some(Some(telefone)) = &telefone {
            validation::optional_telefone(&mut errors, "telefone", Some(telefone));
        }
        if let Some(Some(cargo)) = &cargo {
            validation::text(&mut errors, "cargo", cargo, 100);
        }
        errors.into_result()?;

        garantir_referencia::<roles::Entity, _>(&self.db, "role_id", input.role_id).await?;
        if let Some(email) = &email {
            garantir_unico::<colaboradores::Entity, _, _>(
                &self.db,
                colaboradores::Column::Email,
                email.clone(),
                Some(id),
                "email",
            )
            .await?;
        }
        if let Some(cpf) = &cpf {
            garantir_unico::<colaboradores::Entity, _, _>(
                &self.db,
                colaboradores::Column::Cpf,
                cpf.clone(),
                Some(id),
                "cpf",
            )
            .await?;
        }

        let mut active: colaboradores::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(cpf) = cpf {
            active.cpf = Set(cpf);
        }
        if let Some(telefone) = telefone {
            active.telefone = Set(telefone);
        }
        if let Some(cargo) = cargo {
            active.cargo = Set(cargo);
        }
        if let Some(role_id) = input.role_id {
            active.role_id = Set(role_id);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let colaborador = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "colaboradores", id)
                .antes(&atual)
                .depois(&colaborador),
        )
        .await?;
        txn.commit().await?;
        Ok(colaborador)
    }

    /// Replaces the password hash.
    pub async fn alterar_senha(
        &self,
        ator: &Ator,
        id: Uuid,
        nova_senha: &str,
    ) -> Result<(), RepositoryError> {
        let mut errors = FieldErrors::new();
        validate_password_strength("nova_senha", nova_senha, &mut errors);
        errors.into_result()?;

        let atual = self.find(id, false).await?;
        let senha_hash = hash_password(nova_senha)?;

        let txn = self.db.begin().await?;
        colaboradores::ActiveModel {
            id: Set(atual.id),
            senha_hash: Set(senha_hash),
            atualizado_em: Set(agora()),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        auditoria::registrar(&txn, ator, Evento::new("alterar_senha", "colaboradores", id))
            .await?;
        txn.commit().await?;

        info!(colaborador_id = %id, "password changed");
        Ok(())
    }

    /// Stamps `ultimo_login_em`.
    pub async fn registrar_login(&self, id: Uuid) -> Result<(), RepositoryError> {
        colaboradores::ActiveModel {
            id: Set(id),
            ultimo_login_em: Set(Some(agora())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Soft deletes a colaborador.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<colaboradores::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted colaborador.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<colaboradores::Model, RepositoryError> {
        restaurar::<colaboradores::Entity>(&self.db, ator, id).await
    }
}
