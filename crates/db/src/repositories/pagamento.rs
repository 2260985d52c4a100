//! Pagamento (accounts payable) repository.

use chrono::NaiveDate;
use gestor_core::financeiro::{
    FinanceiroError, FinanceiroService, ResumoFinanceiro, StatusTitulo, TipoTitulo, Titulo,
};
use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_referencia,
    limpar, paginar, restaurar,
};
use super::titulos::{
    self, BaixaInput, ComSituacao, FiltroStatus, com_situacao, filtro_status, hoje,
    status_abertos,
};
use crate::entities::{
    centros_custo, contas_bancarias, formas_pagamento, fornecedores, pagamentos,
};

const TIPO: TipoTitulo = TipoTitulo::Pagamento;

/// Input for creating a pagamento.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePagamentoInput {
    /// Description.
    pub descricao: String,
    /// Supplier.
    pub fornecedor_id: Option<Uuid>,
    /// Cost center.
    pub centro_custo_id: Option<Uuid>,
    /// Account the payment leaves from.
    pub conta_bancaria_id: Option<Uuid>,
    /// Payment method.
    pub forma_pagamento_id: Option<Uuid>,
    /// Invoice or slip number.
    pub documento: Option<String>,
    /// Amount due, > 0.
    pub valor: Decimal,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Notes.
    pub observacoes: Option<String>,
}

/// Input for updating a pagamento.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePagamentoInput {
    /// Description.
    pub descricao: Option<String>,
    /// Supplier.
    #[serde(default, deserialize_with = "double_option")]
    pub fornecedor_id: Option<Option<Uuid>>,
    /// Cost center.
    #[serde(default, deserialize_with = "double_option")]
    pub centro_custo_id: Option<Option<Uuid>>,
    /// Account.
    #[serde(default, deserialize_with = "double_option")]
    pub conta_bancaria_id: Option<Option<Uuid>>,
    /// Payment method.
    #[serde(default, deserialize_with = "double_option")]
    pub forma_pagamento_id: Option<Option<Uuid>>,
    /// Invoice number.
    #[serde(default, deserialize_with = "double_option")]
    pub documento: Option<Option<String>>,
    /// Amount due; only while nothing was paid.
    pub valor: Option<Decimal>,
    /// Due date.
    pub data_vencimento: Option<NaiveDate>,
    /// Notes.
    #[serde(default, deserialize_with = "double_option")]
    pub observacoes: Option<Option<String>>,
}

/// Filter options for listing pagamentos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagamentoFilter {
    /// Matches description or document.
    pub busca: Option<String>,
    /// Stored status, or `vencido`.
    pub status: Option<String>,
    /// First due date, inclusive.
    pub vencimento_inicio: Option<NaiveDate>,
    /// Last due date, inclusive.
    pub vencimento_fim: Option<NaiveDate>,
    /// Supplier.
    pub fornecedor_id: Option<Uuid>,
    /// Cost center.
    pub centro_custo_id: Option<Uuid>,
    /// Only open items past due.
    #[serde(default)]
    pub somente_vencidos: bool,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A pagamento with its derived `situacao`.
pub type PagamentoView = ComSituacao<pagamentos::Model>;

fn titulo_de(p: &pagamentos::Model) -> Result<Titulo, RepositoryError> {
    titulos::titulo(p.valor, p.valor_pago, &p.status, p.data_vencimento)
}

fn view(p: pagamentos::Model, hoje: NaiveDate) -> Result<PagamentoView, RepositoryError> {
    let titulo = titulo_de(&p)?;
    Ok(com_situacao(p, &titulo, TIPO, hoje))
}

/// Pagamento repository.
#[derive(Debug, Clone)]
pub struct PagamentoRepository {
    db: DatabaseConnection,
}

impl PagamentoRepository {
    /// Creates a new pagamento repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn consulta(filter: &PagamentoFilter) -> Result<Select<pagamentos::Entity>, RepositoryError> {
        let mut query = filtrar_deletados(pagamentos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                Condition::any()
                    .add(pagamentos::Column::Descricao.contains(&busca))
                    .add(pagamentos::Column::Documento.contains(&busca)),
            );
        }
        let hoje = hoje();
        let vencidos = |q: Select<pagamentos::Entity>| {
            q.filter(pagamentos::Column::Status.is_in(status_abertos(TIPO)))
                .filter(pagamentos::Column::DataVencimento.lt(hoje))
        };
        if let Some(status) = limpar(filter.status.clone()) {
            query = match filtro_status(&status, TIPO)? {
                FiltroStatus::Armazenado(s) => {
                    query.filter(pagamentos::Column::Status.eq(s.as_str(TIPO)))
                }
                FiltroStatus::Vencido => vencidos(query),
            };
        }
        if filter.somente_vencidos {
            query = vencidos(query);
        }
        if let Some(inicio) = filter.vencimento_inicio {
            query = query.filter(pagamentos::Column::DataVencimento.gte(inicio));
        }
        if let Some(fim) = filter.vencimento_fim {
            query = query.filter(pagamentos::Column::DataVencimento.lte(fim));
        }
        if let Some(fornecedor_id) = filter.fornecedor_id {
            query = query.filter(pagamentos::Column::FornecedorId.eq(fornecedor_id));
        }
        if let Some(centro_custo_id) = filter.centro_custo_id {
            query = query.filter(pagamentos::Column::CentroCustoId.eq(centro_custo_id));
        }
        Ok(query)
    }

    /// Lists pagamentos by due date.
    pub async fn list(
        &self,
        filter: &PagamentoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<PagamentoView>, RepositoryError> {
        let query = Self::consulta(filter)?
            .order_by_asc(pagamentos::Column::DataVencimento)
            .order_by_asc(pagamentos::Column::Id);
        let pagina = paginar(&self.db, query, page).await?;
        let hoje = hoje();
        let data = pagina
            .data
            .into_iter()
            .map(|p| view(p, hoje))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse {
            data,
            meta: pagina.meta,
        })
    }

    /// Totals of the matching pagamentos.
    pub async fn resumo(
        &self,
        filter: &PagamentoFilter,
    ) -> Result<ResumoFinanceiro, RepositoryError> {
        let lista = Self::consulta(filter)?
            .all(&self.db)
            .await?
            .iter()
            .map(titulo_de)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FinanceiroService::resumir(&lista, hoje()))
    }

    /// Finds a pagamento by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<PagamentoView, RepositoryError> {
        let pagamento = buscar::<pagamentos::Entity, _>(&self.db, id, incluir_deletados).await?;
        view(pagamento, hoje())
    }

    async fn garantir_referencias(
        &self,
        fornecedor_id: Option<Uuid>,
        centro_custo_id: Option<Uuid>,
        conta_bancaria_id: Option<Uuid>,
        forma_pagamento_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        garantir_referencia::<fornecedores::Entity, _>(&self.db, "fornecedor_id", fornecedor_id)
            .await?;
        garantir_referencia::<centros_custo::Entity, _>(
            &self.db,
            "centro_custo_id",
            centro_custo_id,
        )
        .await?;
        garantir_referencia::<contas_bancarias::Entity, _>(
            &self.db,
            "conta_bancaria_id",
            conta_bancaria_id,
        )
        .await?;
        garantir_referencia::<formas_pagamento::Entity, _>(
            &self.db,
            "forma_pagamento_id",
            forma_pagamento_id,
        )
        .await
    }

    /// Creates a pending pagamento.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreatePagamentoInput,
    ) -> Result<PagamentoView, RepositoryError> {
        let descricao = input.descricao.trim().to_string();
        let documento = limpar(input.documento);
        let observacoes = limpar(input.observacoes);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "descricao", &descricao, 255);
        validation::optional_text(&mut errors, "documento", documento.as_deref(), 60);
        validation::optional_text(&mut errors, "observacoes", observacoes.as_deref(), 2000);
        validation::positive(&mut errors, "valor", input.valor);
        errors.into_result()?;

        self.garantir_referencias(
            input.fornecedor_id,
            input.centro_custo_id,
            input.conta_bancaria_id,
            input.forma_pagamento_id,
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let pagamento = pagamentos::ActiveModel {
            id: Set(Uuid::new_v4()),
            descricao: Set(descricao),
            fornecedor_id: Set(input.fornecedor_id),
            centro_custo_id: Set(input.centro_custo_id),
            conta_bancaria_id: Set(input.conta_bancaria_id),
            forma_pagamento_id: Set(input.forma_pagamento_id),
            documento: Set(documento),
            valor: Set(input.valor.round_dp(2)),
            valor_pago: Set(Decimal::ZERO),
            data_vencimento: Set(input.data_vencimento),
            data_pagamento: Set(None),
            status: Set(StatusTitulo::Pendente.as_str(TIPO).to_string()),
            observacoes: Set(observacoes),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "pagamentos", pagamento.id).depois(&pagamento),
        )
        .await?;
        txn.commit().await?;

        info!(pagamento_id = %pagamento.id, valor = %pagamento.valor, "pagamento created");
        view(pagamento, hoje())
    }

    /// Applies a partial update. Cancelled items are frozen and `valor` only
    /// changes while nothing was paid.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdatePagamentoInput,
    ) -> Result<PagamentoView, RepositoryError> {
        let atual = buscar::<pagamentos::Entity, _>(&self.db, id, false).await?;
        let titulo = titulo_de(&atual)?;
        if titulo.status == StatusTitulo::Cancelado {
            return Err(FinanceiroError::Cancelado.into());
        }

        let descricao = input.descricao.map(|d| d.trim().to_string());
        let documento = input.documento.map(limpar);
        let observacoes = input.observacoes.map(limpar);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "descricao", descricao.as_deref(), 255);
        if let Some(documento) = &documento {
            validation::optional_text(&mut errors, "documento", documento.as_deref(), 60);
        }
        if let Some(observacoes) = &observacoes {
            validation::optional_text(&mut errors, "observacoes", observacoes.as_deref(), 2000);
        }
        if let Some(valor) = input.valor {
            validation::positive(&mut errors, "valor", valor);
        }
        errors.into_result()?;

        if input.valor.is_some() && titulo.valor_liquidado > Decimal::ZERO {
            return Err(RepositoryError::InvalidState(
                "valor cannot change after a payment was registered".to_string(),
            ));
        }
        self.garantir_referencias(
            input.fornecedor_id.flatten(),
            input.centro_custo_id.flatten(),
            input.conta_bancaria_id.flatten(),
            input.forma_pagamento_id.flatten(),
        )
        .await?;

        let mut active: pagamentos::ActiveModel = atual.clone().into();
        if let Some(descricao) = descricao {
            active.descricao = Set(descricao);
        }
        if let Some(fornecedor_id) = input.fornecedor_id {
            active.fornecedor_id = Set(fornecedor_id);
        }
        if let Some(centro_custo_id) = input.centro_custo_id {
            active.centro_custo_id = Set(centro_custo_id);
        }
        if let Some(conta_bancaria_id) = input.conta_bancaria_id {
            active.conta_bancaria_id = Set(conta_bancaria_id);
        }
        if let Some(forma_pagamento_id) = input.forma_pagamento_id {
            active.forma_pagamento_id = Set(forma_pagamento_id);
        }
        if let Some(documento) = documento {
            active.documento = Set(documento);
        }
        if let Some(valor) = input.valor {
            active.valor = Set(valor.round_dp(2));
        }
        if let Some(data) = input.data_vencimento {
            active.data_vencimento = Set(data);
        }
        if let Some(observacoes) = observacoes {
            active.observacoes = Set(observacoes);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let pagamento = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "pagamentos", id)
                .antes(&atual)
                .depois(&pagamento),
        )
        .await?;
        txn.commit().await?;
        view(pagamento, hoje())
    }

    /// Registers a (partial) payment.
    pub async fn baixar(
        &self,
        ator: &Ator,
        id: Uuid,
        input: BaixaInput,
    ) -> Result<PagamentoView, RepositoryError> {
        garantir_referencia::<contas_bancarias::Entity, _>(
            &self.db,
            "conta_bancaria_id",
            input.conta_bancaria_id,
        )
        .await?;

        let txn = self.db.begin().await?;
        let atual = buscar::<pagamentos::Entity, _>(&txn, id, false).await?;
        let baixa = FinanceiroService::baixar(&titulo_de(&atual)?, input.valor)?;

        let mut active: pagamentos::ActiveModel = atual.clone().into();
        active.valor_pago = Set(baixa.valor_liquidado);
        active.status = Set(baixa.status.as_str(TIPO).to_string());
        active.data_pagamento = Set(Some(input.data.unwrap_or_else(hoje)));
        if let Some(conta) = input.conta_bancaria_id {
            active.conta_bancaria_id = Set(Some(conta));
        }
        active.atualizado_em = Set(agora());
        let pagamento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("baixar", "pagamentos", id)
                .antes(&atual)
                .depois(&pagamento),
        )
        .await?;
        txn.commit().await?;

        info!(
            pagamento_id = %id,
            valor = %input.valor,
            status = %pagamento.status,
            "pagamento settled"
        );
        view(pagamento, hoje())
    }

    /// Reverts every payment of the item.
    pub async fn estornar(&self, ator: &Ator, id: Uuid) -> Result<PagamentoView, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = buscar::<pagamentos::Entity, _>(&txn, id, false).await?;
        let baixa = FinanceiroService::estornar(&titulo_de(&atual)?)?;

        let mut active: pagamentos::ActiveModel = atual.clone().into();
        active.valor_pago = Set(baixa.valor_liquidado);
        active.status = Set(baixa.status.as_str(TIPO).to_string());
        active.data_pagamento = Set(None);
        active.atualizado_em = Set(agora());
        let pagamento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("estornar", "pagamentos", id)
                .antes(&atual)
                .depois(&pagamento),
        )
        .await?;
        txn.commit().await?;

        info!(pagamento_id = %id, "pagamento reversed");
        view(pagamento, hoje())
    }

    /// Cancels an item with nothing paid.
    pub async fn cancelar(&self, ator: &Ator, id: Uuid) -> Result<PagamentoView, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = buscar::<pagamentos::Entity, _>(&txn, id, false).await?;
        FinanceiroService::validar_cancelamento(&titulo_de(&atual)?)?;

        let mut active: pagamentos::ActiveModel = atual.clone().into();
        active.status = Set(StatusTitulo::Cancelado.as_str(TIPO).to_string());
        active.atualizado_em = Set(agora());
        let pagamento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("cancelar", "pagamentos", id)
                .antes(&atual)
                .depois(&pagamento),
        )
        .await?;
        txn.commit().await?;
        view(pagamento, hoje())
    }

    /// Soft deletes a pagamento.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<pagamentos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted pagamento.
    pub async fn restore(&self, ator: &Ator, id: Uuid) -> Result<PagamentoView, RepositoryError> {
        let pagamento = restaurar::<pagamentos::Entity>(&self.db, ator, id).await?;
        view(pagamento, hoje())
    }
}
