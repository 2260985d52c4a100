//! Roles, levels (niveis) and permissions.

use std::collections::BTreeSet;

use gestor_core::permissions;
use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_unico, limpar,
    paginar, restaurar,
};
use crate::entities::{colaboradores, niveis, permissoes, role_permissoes, roles};

/// Input for creating a level.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNivelInput {
    /// Display name.
    pub nome: String,
    /// Degree; higher manages lower.
    pub grau: i32,
}

/// Input for updating a level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNivelInput {
    /// Display name.
    pub nome: Option<String>,
    /// Degree.
    pub grau: Option<i32>,
}

/// Input for creating a role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleInput {
    /// Unique name.
    pub nome: String,
    /// Description.
    pub descricao: Option<String>,
    /// Level of the role.
    pub nivel_id: Uuid,
    /// Bypasses permission checks.
    #[serde(default)]
    pub super_admin: bool,
    /// Whether the role is usable.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoleInput {
    /// Unique name.
    pub nome: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    /// Level of the role.
    pub nivel_id: Option<Uuid>,
    /// Bypasses permission checks.
    pub super_admin: Option<bool>,
    /// Whether the role is usable.
    pub ativo: Option<bool>,
}

/// Filter options for listing roles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleFilter {
    /// Name search.
    pub busca: Option<String>,
    /// Only roles of this level.
    pub nivel_id: Option<Uuid>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A role with its level and granted permission codes.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetalhe {
    /// The role.
    #[serde(flatten)]
    pub role: roles::Model,
    /// Its level.
    pub nivel: niveis::Model,
    /// Granted codes, sorted.
    pub permissoes: Vec<String>,
}

const fn ativo_padrao() -> bool {
    true
}

fn validar_nivel(nome: Option<&str>, grau: Option<i32>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    validation::optional_text(&mut errors, "nome", nome, 60);
    if grau.is_some_and(|g| g < 0) {
        errors.add("grau", "nao pode ser negativo");
    }
    errors.into_result()
}

/// RBAC repository.
#[derive(Debug, Clone)]
pub struct RbacRepository {
    db: DatabaseConnection,
}

impl RbacRepository {
    /// Creates a new RBAC repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // niveis
    // ------------------------------------------------------------------

    /// Lists levels, highest degree first.
    pub async fn list_niveis(&self) -> Result<Vec<niveis::Model>, RepositoryError> {
        Ok(niveis::Entity::find()
            .order_by_desc(niveis::Column::Grau)
            .all(&self.db)
            .await?)
    }

    /// Finds a level by id.
    pub async fn find_nivel(&self, id: Uuid) -> Result<niveis::Model, RepositoryError> {
        niveis::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound {
                entidade: "niveis",
                id,
            })
    }

    async fn garantir_nivel_unico(
        &self,
        nome: Option<&str>,
        grau: Option<i32>,
        ignorar_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let outros = |query: sea_orm::Select<niveis::Entity>| match ignorar_id {
            Some(id) => query.filter(niveis::Column::Id.ne(id)),
            None => query,
        };
        if let Some(nome) = nome {
            let n = outros(niveis::Entity::find().filter(niveis::Column::Nome.eq(nome)))
                .count(&self.db)
                .await?;
            if n > 0 {
                return Err(RepositoryError::Duplicate {
                    campo: "nome",
                    valor: nome.to_string(),
                });
            }
        }
        if let Some(grau) = grau {
            let n = outros(niveis::Entity::find().filter(niveis::Column::Grau.eq(grau)))
                .count(&self.db)
                .await?;
            if n > 0 {
                return Err(RepositoryError::Duplicate {
                    campo: "grau",
                    valor: grau.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Creates a level.
    pub async fn create_nivel(
        &self,
        ator: &Ator,
        input: CreateNivelInput,
    ) -> Result<niveis::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        validar_nivel(Some(&nome), Some(input.grau))?;
        self.garantir_nivel_unico(Some(&nome), Some(input.grau), None)
            .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let nivel = niveis::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            grau: Set(input.grau),
            criado_em: Set(now),
            atualizado_em: Set(now),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "niveis", nivel.id).depois(&nivel),
        )
        .await?;
        txn.commit().await?;

        info!(nivel_id = %nivel.id, grau = nivel.grau, "nivel created");
        Ok(nivel)
    }

    /// Updates a level.
    pub async fn update_nivel(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateNivelInput,
    ) -> Result<niveis::Model, RepositoryError> {
        let atual = self.find_nivel(id).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        validar_nivel(nome.as_deref(), input.grau)?;
        self.garantir_nivel_unico(nome.as_deref(), input.grau, Some(id))
            .await?;

        let mut active: niveis::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(grau) = input.grau {
            active.grau = Set(grau);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let nivel = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "niveis", id)
                .antes(&atual)
                .depois(&nivel),
        )
        .await?;
        txn.commit().await?;
        Ok(nivel)
    }

    /// Deletes a level that no role references.
    pub async fn delete_nivel(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        let atual = self.find_nivel(id).await?;
        let em_uso = roles::Entity::find()
            .filter(roles::Column::NivelId.eq(id))
            .count(&self.db)
            .await?;
        if em_uso > 0 {
            return Err(RepositoryError::InUse(format!(
                "nivel '{}' is used by {em_uso} role(s)",
                atual.nome
            )));
        }

        let txn = self.db.begin().await?;
        niveis::Entity::delete_by_id(id).exec(&txn).await?;
        auditoria::registrar(&txn, ator, Evento::new("excluir", "niveis", id).antes(&atual))
            .await?;
        txn.commit().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // roles
    // ------------------------------------------------------------------

    /// Lists roles.
    pub async fn list_roles(
        &self,
        filter: &RoleFilter,
        page: PageRequest,
    ) -> Result<PageResponse<roles::Model>, RepositoryError> {
        let mut query = filtrar_deletados(roles::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(roles::Column::Nome.contains(&busca));
        }
        if let Some(nivel_id) = filter.nivel_id {
            query = query.filter(roles::Column::NivelId.eq(nivel_id));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(roles::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(roles::Column::Nome), page).await?)
    }

    /// Finds a role by id.
    pub async fn find_role(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<roles::Model, RepositoryError> {
        buscar::<roles::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Role with level and permission codes.
    pub async fn role_detalhe(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<RoleDetalhe, RepositoryError> {
        let role = self.find_role(id, incluir_deletados).await?;
        let nivel = self.find_nivel(role.nivel_id).await?;
        let permissoes = self
            .permissoes_do_role(id)
            .await?
            .into_iter()
            .map(|p| p.codigo)
            .collect();
        Ok(RoleDetalhe {
            role,
            nivel,
            permissoes,
        })
    }

    /// Degree of a role's level.
    pub async fn grau_do_role(&self, role_id: Uuid) -> Result<i32, RepositoryError> {
        let role = self.find_role(role_id, true).await?;
        Ok(self.find_nivel(role.nivel_id).await?.grau)
    }

    /// Creates a role.
    pub async fn create_role(
        &self,
        ator: &Ator,
        input: CreateRoleInput,
    ) -> Result<roles::Model, RepositoryError> {
        let nome = input.nome.trim().to_string();
        let descricao = limpar(input.descricao);
        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "nome", &nome, 60);
        validation::optional_text(&mut errors, "descricao", descricao.as_deref(), 255);
        errors.into_result()?;

        self.garantir_nivel(input.nivel_id).await?;
        garantir_unico::<roles::Entity, _, _>(
            &self.db,
            roles::Column::Nome,
            nome.clone(),
            None,
            "nome",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let role = roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome),
            descricao: Set(descricao),
            nivel_id: Set(input.nivel_id),
            super_admin: Set(input.super_admin),
            ativo: Set(input.ativo),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(&txn, ator, Evento::new("criar", "roles", role.id).depois(&role))
            .await?;
        txn.commit().await?;

        info!(role_id = %role.id, nome = %role.nome, "role created");
        Ok(role)
    }

    /// Updates a role.
    pub async fn update_role(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateRoleInput,
    ) -> Result<roles::Model, RepositoryError> {
        let atual = self.find_role(id, false).await?;
        let nome = input.nome.map(|n| n.trim().to_string());
        let descricao = input.descricao.map(limpar);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "nome", nome.as_deref(), 60);
        if let Some(Some(d)) = &descricao {
            validation::text(&mut errors, "descricao", d, 255);
        }
        errors.into_result()?;

        if let Some(nivel_id) = input.nivel_id {
            self.garantir_nivel(nivel_id).await?;
        }
        if let Some(nome) = &nome {
            garantir_unico::<roles::Entity, _, _>(
                &self.db,
                roles::Column::Nome,
                nome.clone(),
                Some(id),
                "nome",
            )
            .await?;
        }

        let mut active: roles::ActiveModel = atual.clone().into();
        if let Some(nome) = nome {
            active.nome = Set(nome);
        }
        if let Some(descricao) = descricao {
            active.descricao = Set(descricao);
        }
        if let Some(nivel_id) = input.nivel_id {
            active.nivel_id = Set(nivel_id);
        }
        if let Some(super_admin) = input.super_admin {
            active.super_admin = Set(super_admin);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let role = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "roles", id)
                .antes(&atual)
                .depois(&role),
        )
        .await?;
        txn.commit().await?;
        Ok(role)
    }

    /// Soft deletes a role no active colaborador uses.
    pub async fn delete_role(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        let em_uso = colaboradores::Entity::find()
            .filter(colaboradores::Column::RoleId.eq(id))
            .filter(colaboradores::Column::DeletadoEm.is_null())
            .count(&self.db)
            .await?;
        if em_uso > 0 {
            return Err(RepositoryError::InUse(format!(
                "role is assigned to {em_uso} colaborador(es)"
            )));
        }
        excluir::<roles::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted role.
    pub async fn restore_role(&self, ator: &Ator, id: Uuid) -> Result<roles::Model, RepositoryError> {
        restaurar::<roles::Entity>(&self.db, ator, id).await
    }

    async fn garantir_nivel(&self, nivel_id: Uuid) -> Result<(), RepositoryError> {
        let existe = niveis::Entity::find_by_id(nivel_id)
            .count(&self.db)
            .await?
            > 0;
        if existe {
            Ok(())
        } else {
            Err(RepositoryError::ReferenceNotFound {
                campo: "nivel_id",
                id: nivel_id,
            })
        }
    }

    // ------------------------------------------------------------------
    // permissoes
    // ------------------------------------------------------------------

    /// Whole permission table, sorted by code.
    pub async fn list_permissoes(&self) -> Result<Vec<permissoes::Model>, RepositoryError> {
        Ok(permissoes::Entity::find()
            .order_by_asc(permissoes::Column::Codigo)
            .all(&self.db)
            .await?)
    }

    /// Inserts catalog entries missing from the table. Returns how many were added.
    pub async fn sincronizar_catalogo(&self) -> Result<usize, RepositoryError> {
        let existentes: BTreeSet<String> = permissoes::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| p.codigo)
            .collect();

        let novos: Vec<permissoes::ActiveModel> = permissions::catalogo()
            .into_iter()
            .filter(|def| !existentes.contains(&def.codigo))
            .map(|def| permissoes::ActiveModel {
                id: Set(Uuid::new_v4()),
                codigo: Set(def.codigo),
                modulo: Set(def.modulo),
                descricao: Set(def.descricao),
            })
            .collect();

        let adicionados = novos.len();
        if adicionados > 0 {
            permissoes::Entity::insert_many(novos)
                .exec_without_returning(&self.db)
                .await?;
            info!(adicionados, "permission catalog synchronized");
        }
        Ok(adicionados)
    }

    /// Permissions granted to a role, sorted by code.
    pub async fn permissoes_do_role(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<permissoes::Model>, RepositoryError> {
        let ids: Vec<Uuid> = role_permissoes::Entity::find()
            .filter(role_permissoes::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|rp| rp.permissao_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(permissoes::Entity::find()
            .filter(permissoes::Column::Id.is_in(ids))
            .order_by_asc(permissoes::Column::Codigo)
            .all(&self.db)
            .await?)
    }

    /// Replaces the whole permission set of a role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` naming unknown codes.
    pub async fn substituir_permissoes(
        &self,
        ator: &Ator,
        role_id: Uuid,
        codigos: &[String],
    ) -> Result<Vec<String>, RepositoryError> {
        self.find_role(role_id, false).await?;
        let pedidos: BTreeSet<&str> = codigos.iter().map(|c| c.trim()).collect();

        let encontrados = if pedidos.is_empty() {
            Vec::new()
        } else {
            permissoes::Entity::find()
                .filter(permissoes::Column::Codigo.is_in(pedidos.iter().copied()))
                .all(&self.db)
                .await?
        };
        let desconhecidos: Vec<&str> = pedidos
            .iter()
            .copied()
            .filter(|c| !encontrados.iter().any(|p| p.codigo == *c))
            .collect();
        if !desconhecidos.is_empty() {
            return Err(FieldErrors::single(
                "permissoes",
                format!("codigos desconhecidos: {}", desconhecidos.join(", ")),
            )
            .into());
        }

        let antes: Vec<String> = self
            .permissoes_do_role(role_id)
            .await?
            .into_iter()
            .map(|p| p.codigo)
            .collect();

        let txn = self.db.begin().await?;
        role_permissoes::Entity::delete_many()
            .filter(role_permissoes::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        if !encontrados.is_empty() {
            let links = encontrados.iter().map(|p| role_permissoes::ActiveModel {
                role_id: Set(role_id),
                permissao_id: Set(p.id),
            });
            role_permissoes::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        let mut depois: Vec<String> = encontrados.into_iter().map(|p| p.codigo).collect();
        depois.sort();
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar_permissoes", "roles", role_id)
                .antes(&antes)
                .depois(&depois),
        )
        .await?;
        txn.commit().await?;

        info!(%role_id, total = depois.len(), "role permissions replaced");
        Ok(depois)
    }

    /// True when the role is live and either `super_admin` or granted `codigo`.
    pub async fn role_tem_permissao(
        &self,
        role_id: Uuid,
        codigo: &str,
    ) -> Result<bool, RepositoryError> {
        let Some(role) = roles::Entity::find_by_id(role_id)
            .filter(roles::Column::DeletadoEm.is_null())
            .filter(roles::Column::Ativo.eq(true))
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };
        if role.super_admin {
            return Ok(true);
        }

        let Some(permissao) = permissoes::Entity::find()
            .filter(permissoes::Column::Codigo.eq(codigo))
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };
        let n = role_permissoes::Entity::find()
            .filter(role_permissoes::Column::RoleId.eq(role_id))
            .filter(role_permissoes::Column::PermissaoId.eq(permissao.id))
            .count(&self.db)
            .await?;
        Ok(n > 0)
    }

    /// Codes a role grants; `super_admin` roles get the whole catalog.
    pub async fn codigos_efetivos(&self, role: &roles::Model) -> Result<Vec<String>, RepositoryError> {
        if role.super_admin {
            let mut todos: Vec<String> = permissions::catalogo()
                .into_iter()
                .map(|p| p.codigo)
                .collect();
            todos.sort();
            return Ok(todos);
        }
        Ok(self
            .permissoes_do_role(role.id)
            .await?
            .into_iter()
            .map(|p| p.codigo)
            .collect())
    }
}
