//! Conta bancaria (bank account) repository.
//!
//! An account is identified by bank code, branch and account number together.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, limpar, paginar, restaurar,
};
use crate::entities::contas_bancarias;

/// Accepted account kinds.
pub const TIPOS_CONTA: [&str; 2] = ["corrente", "poupanca"];

/// Input for creating a bank account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContaBancariaInput {
    /// Bank code (3 digits).
    pub banco_codigo: String,
    /// Bank name.
    pub banco_nome: String,
    /// Branch.
    pub agencia: String,
    /// Account number.
    pub conta: String,
    /// Check digit.
    pub digito: Option<String>,
    /// `corrente` or `poupanca`.
    #[serde(default = "tipo_padrao")]
    pub tipo: String,
    /// Holder name.
    pub titular: String,
    /// Opening balance.
    #[serde(default)]
    pub saldo_inicial: Decimal,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a bank account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContaBancariaInput {
    /// Bank code.
    pub banco_codigo: Option<String>,
    /// Bank name.
    pub banco_nome: Option<String>,
    /// Branch.
    pub agencia: Option<String>,
    /// Account number.
    pub conta: Option<String>,
    /// Check digit.
    #[serde(default, deserialize_with = "double_option")]
    pub digito: Option<Option<String>>,
    /// Account kind.
    pub tipo: Option<String>,
    /// Holder name.
    pub titular: Option<String>,
    /// Opening balance.
    pub saldo_inicial: Option<Decimal>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing bank accounts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContaBancariaFilter {
    /// Matches bank name, holder or account number.
    pub busca: Option<String>,
    /// Bank code.
    pub banco_codigo: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

const fn ativo_padrao() -> bool {
    true
}

fn tipo_padrao() -> String {
    "corrente".to_string()
}

fn validar_numeros(
    errors: &mut FieldErrors,
    banco: Option<&str>,
    agencia: Option<&str>,
    conta: Option<&str>,
) {
    if let Some(banco) = banco
        && (banco.len() != 3 || validation::somente_digitos(banco) != banco)
    {
        errors.add("banco_codigo", "deve ter 3 digitos");
    }
    if let Some(agencia) = agencia {
        validation::text(errors, "agencia", agencia, 10);
    }
    if let Some(conta) = conta {
        validation::text(errors, "conta", conta, 20);
    }
}

/// Bank account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ContaBancariaRepository {
    db: DatabaseConnection,
}

impl ContaBancariaRepository {
    /// Creates a new bank account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists bank accounts ordered by bank and branch.
    pub async fn list(
        &self,
        filter: &ContaBancariaFilter,
        page: PageRequest,
    ) -> Result<PageResponse<contas_bancarias::Model>, RepositoryError> {
        let mut query =
            filtrar_deletados(contas_bancarias::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                Condition::any()
                    .add(contas_bancarias::Column::BancoNome.contains(&busca))
                    .add(contas_bancarias::Column::Titular.contains(&busca))
                    .add(contas_bancarias::Column::Conta.contains(&busca)),
            );
        }
        if let Some(banco) = limpar(filter.banco_codigo.clone()) {
            query = query.filter(contas_bancarias::Column::BancoCodigo.eq(banco));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(contas_bancarias::Column::Ativo.eq(ativo));
        }
        let query = query
            .order_by_asc(contas_bancarias::Column::BancoCodigo)
            .order_by_asc(contas_bancarias::Column::Agencia)
            .order_by_asc(contas_bancarias::Column::Conta);
        Ok(paginar(&self.db, query, page).await?)
    }

    /// Finds a bank account by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<contas_bancarias::Model, RepositoryError> {
        buscar::<contas_bancarias::Entity, _>(&self.db, id, incluir_deletados).await
    }

    async fn garantir_conta_unica(
        &self,
        banco_codigo: &str,
        agencia: &str,
        conta: &str,
        ignorar_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = contas_bancarias::Entity::find()
            .filter(contas_bancarias::Column::BancoCodigo.eq(banco_codigo))
            .filter(contas_bancarias::Column::Agencia.eq(agencia))
            .filter(contas_bancarias::Column::Conta.eq(conta));
        if let Some(id) = ignorar_id {
            query = query.filter(contas_bancarias::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(RepositoryError::Duplicate {
                campo: "conta",
                valor: format!("{banco_codigo}/{agencia}/{conta}"),
            });
        }
        Ok(())
    }

    /// Creates a bank account.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateContaBancariaInput,
    ) -> Result<contas_bancarias::Model, RepositoryError> {
        let banco_codigo = input.banco_codigo.trim().to_string();
        let banco_nome = input.banco_nome.trim().to_string();
        let agencia = input.agencia.trim().to_string();
        let conta = input.conta.trim().to_string();
        let titular = input.titular.trim().to_string();
        let tipo = input.tipo.trim().to_lowercase();

        let mut errors = FieldErrors::new();
        validar_numeros(&mut errors, Some(&banco_codigo), Some(&agencia), Some(&conta));
        validation::text(&mut errors, "banco_nome", &banco_nome, 100);
        validation::text(&mut errors, "titular", &titular, 150);
        validation::one_of(&mut errors, "tipo", &tipo, &TIPOS_CONTA);
        errors.into_result()?;

        self.garantir_conta_unica(&banco_codigo, &agencia, &conta, None)
            .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let model = contas_bancarias::ActiveModel {
            id: Set(Uuid::new_v4()),
            banco_codigo: Set(banco_codigo),
            banco_nome: Set(banco_nome),
            agencia: Set(agencia),
            conta: Set(conta),
            digito: Set(limpar(input.digito)),
            tipo: Set(tipo),
            titular: Set(titular),
            saldo_inicial: Set(input.saldo_inicial),
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
            Evento::new("criar", "contas_bancarias", model.id).depois(&model),
        )
        .await?;
        txn.commit().await?;

        info!(conta_bancaria_id = %model.id, "conta bancaria created");
        Ok(model)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateContaBancariaInput,
    ) -> Result<contas_bancarias::Model, RepositoryError> {
        let atual = self.find(id, false).await?;
        let banco_codigo = input.banco_codigo.map(|v| v.trim().to_string());
        let banco_nome = input.banco_nome.map(|v| v.trim().to_string());
        let agencia = input.agencia.map(|v| v.trim().to_string());
        let conta = input.conta.map(|v| v.trim().to_string());
        let titular = input.titular.map(|v| v.trim().to_string());
        let tipo = input.tipo.map(|v| v.trim().to_lowercase());

        let mut errors = FieldErrors::new();
        validar_numeros(
            &mut errors,
            banco_codigo.as_deref(),
            agencia.as_deref(),
            conta.as_deref(),
        );
        validation::optional_text(&mut errors, "banco_nome", banco_nome.as_deref(), 100);
        validation::optional_text(&mut errors, "titular", titular.as_deref(), 150);
        if let Some(tipo) = &tipo {
            validation::one_of(&mut errors, "tipo", tipo, &TIPOS_CONTA);
        }
        errors.into_result()?;

        if banco_codigo.is_some() || agencia.is_some() || conta.is_some() {
            self.garantir_conta_unica(
                banco_codigo.as_deref().unwrap_or(&atual.banco_codigo),
                agencia.as_deref().unwrap_or(&atual.agencia),
                conta.as_deref().unwrap_or(&atual.conta),
                Some(id),
            )
            .await?;
        }

        let mut active: contas_bancarias::ActiveModel = atual.clone().into();
        if let Some(v) = banco_codigo {
            active.banco_codigo = Set(v);
        }
        if let Some(v) = banco_nome {
            active.banco_nome = Set(v);
        }
        if let Some(v) = agencia {
            active.agencia = Set(v);
        }
        if let Some(v) = conta {
            active.conta = Set(v);
        }
        if let Some(v) = input.digito {
            active.digito = Set(limpar(v));
        }
        if let Some(v) = tipo {
            active.tipo = Set(v);
        }
        if let Some(v) = titular {
            active.titular = Set(v);
        }
        if let Some(v) = input.saldo_inicial {
            active.saldo_inicial = Set(v);
        }
        if let Some(v) = input.ativo {
            active.ativo = Set(v);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let model = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "contas_bancarias", id)
                .antes(&atual)
                .depois(&model),
        )
        .await?;
        txn.commit().await?;
        Ok(model)
    }

    /// Soft deletes a bank account.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<contas_bancarias::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted bank account.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<contas_bancarias::Model, RepositoryError> {
        restaurar::<contas_bancarias::Entity>(&self.db, ator, id).await
    }
}
