//! Recebimento (accounts receivable) repository.
//!
//! Sales create their own receivables; this repository also accepts manual ones,
//! stored as a single installment without `venda_id`.

use chrono::NaiveDate;
use gestor_core::financeiro::{
    FinanceiroError, FinanceiroService, ResumoFinanceiro, StatusTitulo, TipoTitulo, Titulo,
};
use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select, Set, TransactionTrait,
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
    centros_custo, clientes, contas_bancarias, formas_pagamento, recebimentos,
};

const TIPO: TipoTitulo = TipoTitulo::Recebimento;

/// Input for creating a manual recebimento.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecebimentoInput {
    /// Description.
    pub descricao: String,
    /// Customer.
    pub cliente_id: Option<Uuid>,
    /// Cost center.
    pub centro_custo_id: Option<Uuid>,
    /// Account the money lands on.
    pub conta_bancaria_id: Option<Uuid>,
    /// Payment method.
    pub forma_pagamento_id: Option<Uuid>,
    /// Amount due, > 0.
    pub valor: Decimal,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Notes.
    pub observacoes: Option<String>,
}

/// Input for updating a recebimento.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecebimentoInput {
    /// Description.
    pub descricao: Option<String>,
    /// Customer; fixed for sale installments.
    #[serde(default, deserialize_with = "double_option")]
    pub cliente_id: Option<Option<Uuid>>,
    /// Cost center.
    #[serde(default, deserialize_with = "double_option")]
    pub centro_custo_id: Option<Option<Uuid>>,
    /// Account.
    #[serde(default, deserialize_with = "double_option")]
    pub conta_bancaria_id: Option<Option<Uuid>>,
    /// Payment method.
    #[serde(default, deserialize_with = "double_option")]
    pub forma_pagamento_id: Option<Option<Uuid>>,
    /// Amount due; manual items only, while nothing was received.
    pub valor: Option<Decimal>,
    /// Due date.
    pub data_vencimento: Option<NaiveDate>,
    /// Notes.
    #[serde(default, deserialize_with = "double_option")]
    pub observacoes: Option<Option<String>>,
}

/// Filter options for listing recebimentos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecebimentoFilter {
    /// Matches the description.
    pub busca: Option<String>,
    /// Stored status, or `vencido`.
    pub status: Option<String>,
    /// First due date, inclusive.
    pub vencimento_inicio: Option<NaiveDate>,
    /// Last due date, inclusive.
    pub vencimento_fim: Option<NaiveDate>,
    /// Customer.
    pub cliente_id: Option<Uuid>,
    /// Originating sale.
    pub venda_id: Option<Uuid>,
    /// Cost center.
    pub centro_custo_id: Option<Uuid>,
    /// Only open items past due.
    #[serde(default)]
    pub somente_vencidos: bool,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A recebimento with its derived `situacao`.
pub type RecebimentoView = ComSituacao<recebimentos::Model>;

fn titulo_de(r: &recebimentos::Model) -> Result<Titulo, RepositoryError> {
    titulos::titulo(r.valor, r.valor_recebido, &r.status, r.data_vencimento)
}

fn view(r: recebimentos::Model, hoje: NaiveDate) -> Result<RecebimentoView, RepositoryError> {
    let titulo = titulo_de(&r)?;
    Ok(com_situacao(r, &titulo, TIPO, hoje))
}

/// Recebimento repository.
#[derive(Debug, Clone)]
pub struct RecebimentoRepository {
    db: DatabaseConnection,
}

impl RecebimentoRepository {
    /// Creates a new recebimento repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn consulta(
        filter: &RecebimentoFilter,
    ) -> Result<Select<recebimentos::Entity>, RepositoryError> {
        let mut query = filtrar_deletados(recebimentos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(recebimentos::Column::Descricao.contains(&busca));
        }
        let hoje = hoje();
        let vencidos = |q: Select<recebimentos::Entity>| {
            q.filter(recebimentos::Column::Status.is_in(status_abertos(TIPO)))
                .filter(recebimentos::Column::DataVencimento.lt(hoje))
        };
        if let Some(status) = limpar(filter.status.clone()) {
            query = match filtro_status(&status, TIPO)? {
                FiltroStatus::Armazenado(s) => {
                    query.filter(recebimentos::Column::Status.eq(s.as_str(TIPO)))
                }
                FiltroStatus::Vencido => vencidos(query),
            };
        }
        if filter.somente_vencidos {
            query = vencidos(query);
        }
        if let Some(inicio) = filter.vencimento_inicio {
            query = query.filter(recebimentos::Column::DataVencimento.gte(inicio));
        }
        if let Some(fim) = filter.vencimento_fim {
            query = query.filter(recebimentos::Column::DataVencimento.lte(fim));
        }
        if let Some(cliente_id) = filter.cliente_id {
            query = query.filter(recebimentos::Column::ClienteId.eq(cliente_id));
        }
        if let Some(venda_id) = filter.venda_id {
            query = query.filter(recebimentos::Column::VendaId.eq(venda_id));
        }
        if let Some(centro_custo_id) = filter.centro_custo_id {
            query = query.filter(recebimentos::Column::CentroCustoId.eq(centro_custo_id));
        }
        Ok(query)
    }

    /// Lists recebimentos by due date.
    pub async fn list(
        &self,
        filter: &RecebimentoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<RecebimentoView>, RepositoryError> {
        let query = Self::consulta(filter)?
            .order_by_asc(recebimentos::Column::DataVencimento)
            .order_by_asc(recebimentos::Column::Parcela)
            .order_by_asc(recebimentos::Column::Id);
        let pagina = paginar(&self.db, query, page).await?;
        let hoje = hoje();
        let data = pagina
            .data
            .into_iter()
            .map(|r| view(r, hoje))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse {
            data,
            meta: pagina.meta,
        })
    }

    /// Totals of the matching recebimentos.
    pub async fn resumo(
        &self,
        filter: &RecebimentoFilter,
    ) -> Result<ResumoFinanceiro, RepositoryError> {
        let lista = Self::consulta(filter)?
            .all(&self.db)
            .await?
            .iter()
            .map(titulo_de)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FinanceiroService::resumir(&lista, hoje()))
    }

    /// Finds a recebimento by id.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<RecebimentoView, RepositoryError> {
        let recebimento =
            buscar::<recebimentos::Entity, _>(&self.db, id, incluir_deletados).await?;
        view(recebimento, hoje())
    }

    async fn garantir_referencias(
        &self,
        cliente_id: Option<Uuid>,
        centro_custo_id: Option<Uuid>,
        conta_bancaria_id: Option<Uuid>,
        forma_pagamento_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        garantir_referencia::<clientes::Entity, _>(&self.db, "cliente_id", cliente_id).await?;
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

    /// Creates a pending manual recebimento.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateRecebimentoInput,
    ) -> Result<RecebimentoView, RepositoryError> {
        let descricao = input.descricao.trim().to_string();
        let observacoes = limpar(input.observacoes);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "descricao", &descricao, 255);
        validation::optional_text(&mut errors, "observacoes", observacoes.as_deref(), 2000);
        validation::positive(&mut errors, "valor", input.valor);
        errors.into_result()?;

        self.garantir_referencias(
            input.cliente_id,
            input.centro_custo_id,
            input.conta_bancaria_id,
            input.forma_pagamento_id,
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let recebimento = recebimentos::ActiveModel {
            id: Set(Uuid::new_v4()),
            descricao: Set(descricao),
            cliente_id: Set(input.cliente_id),
            venda_id: Set(None),
            parcela: Set(1),
            total_parcelas: Set(1),
            centro_custo_id: Set(input.centro_custo_id),
            conta_bancaria_id: Set(input.conta_bancaria_id),
            forma_pagamento_id: Set(input.forma_pagamento_id),
            valor: Set(input.valor.round_dp(2)),
            valor_recebido: Set(Decimal::ZERO),
            data_vencimento: Set(input.data_vencimento),
            data_recebimento: Set(None),
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
            Evento::new("criar", "recebimentos", recebimento.id).depois(&recebimento),
        )
        .await?;
        txn.commit().await?;

        info!(recebimento_id = %recebimento.id, valor = %recebimento.valor, "recebimento created");
        view(recebimento, hoje())
    }

    /// Applies a partial update. Installments of a sale keep their customer and
    /// value; cancelled items are frozen.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateRecebimentoInput,
    ) -> Result<RecebimentoView, RepositoryError> {
        let atual = buscar::<recebimentos::Entity, _>(&self.db, id, false).await?;
        let titulo = titulo_de(&atual)?;
        if titulo.status == StatusTitulo::Cancelado {
            return Err(FinanceiroError::Cancelado.into());
        }

        let descricao = input.descricao.map(|d| d.trim().to_string());
        let observacoes = input.observacoes.map(limpar);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "descricao", descricao.as_deref(), 255);
        if let Some(observacoes) = &observacoes {
            validation::optional_text(&mut errors, "observacoes", observacoes.as_deref(), 2000);
        }
        if let Some(valor) = input.valor {
            validation::positive(&mut errors, "valor", valor);
        }
        errors.into_result()?;

        if atual.venda_id.is_some() && (input.valor.is_some() || input.cliente_id.is_some()) {
            return Err(RepositoryError::InvalidState(
                "value and customer of a sale installment come from the sale".to_string(),
            ));
        }
        if input.valor.is_some() && titulo.valor_liquidado > Decimal::ZERO {
            return Err(RepositoryError::InvalidState(
                "valor cannot change after a receipt was registered".to_string(),
            ));
        }
        self.garantir_referencias(
            input.cliente_id.flatten(),
            input.centro_custo_id.flatten(),
            input.conta_bancaria_id.flatten(),
            input.forma_pagamento_id.flatten(),
        )
        .await?;

        let mut active: recebimentos::ActiveModel = atual.clone().into();
        if let Some(descricao) = descricao {
            active.descricao = Set(descricao);
        }
        if let Some(cliente_id) = input.cliente_id {
            active.cliente_id = Set(cliente_id);
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
        let recebimento = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "recebimentos", id)
                .antes(&atual)
                .depois(&recebimento),
        )
        .await?;
        txn.commit().await?;
        view(recebimento, hoje())
    }

    /// Registers a (partial) receipt.
    pub async fn baixar(
        &self,
        ator: &Ator,
        id: Uuid,
        input: BaixaInput,
    ) -> Result<RecebimentoView, RepositoryError> {
        garantir_referencia::<contas_bancarias::Entity, _>(
            &self.db,
            "conta_bancaria_id",
            input.conta_bancaria_id,
        )
        .await?;

        let txn = self.db.begin().await?;
        let atual = buscar::<recebimentos::Entity, _>(&txn, id, false).await?;
        let baixa = FinanceiroService::baixar(&titulo_de(&atual)?, input.valor)?;

        let mut active: recebimentos::ActiveModel = atual.clone().into();
        active.valor_recebido = Set(baixa.valor_liquidado);
        active.status = Set(baixa.status.as_str(TIPO).to_string());
        active.data_recebimento = Set(Some(input.data.unwrap_or_else(hoje)));
        if let Some(conta) = input.conta_bancaria_id {
            active.conta_bancaria_id = Set(Some(conta));
        }
        active.atualizado_em = Set(agora());
        let recebimento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("baixar", "recebimentos", id)
                .antes(&atual)
                .depois(&recebimento),
        )
        .await?;
        txn.commit().await?;

        info!(
            recebimento_id = %id,
            valor = %input.valor,
            status = %recebimento.status,
            "recebimento settled"
        );
        view(recebimento, hoje())
    }

    /// Reverts every receipt of the item.
    pub async fn estornar(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<RecebimentoView, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = buscar::<recebimentos::Entity, _>(&txn, id, false).await?;
        let baixa = FinanceiroService::estornar(&titulo_de(&atual)?)?;

        let mut active: recebimentos::ActiveModel = atual.clone().into();
        active.valor_recebido = Set(baixa.valor_liquidado);
        active.status = Set(baixa.status.as_str(TIPO).to_string());
        active.data_recebimento = Set(None);
        active.atualizado_em = Set(agora());
        let recebimento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("estornar", "recebimentos", id)
                .antes(&atual)
                .depois(&recebimento),
        )
        .await?;
        txn.commit().await?;

        info!(recebimento_id = %id, "recebimento reversed");
        view(recebimento, hoje())
    }

    /// Cancels an item with nothing received.
    pub async fn cancelar(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<RecebimentoView, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = buscar::<recebimentos::Entity, _>(&txn, id, false).await?;
        FinanceiroService::validar_cancelamento(&titulo_de(&atual)?)?;

        let mut active: recebimentos::ActiveModel = atual.clone().into();
        active.status = Set(StatusTitulo::Cancelado.as_str(TIPO).to_string());
        active.atualizado_em = Set(agora());
        let recebimento = active.update(&txn).await?;

        auditoria::registrar(
            &txn,
            ator,
            Evento::new("cancelar", "recebimentos", id)
                .antes(&atual)
                .depois(&recebimento),
        )
        .await?;
        txn.commit().await?;
        view(recebimento, hoje())
    }

    /// Soft deletes a manual recebimento. Sale installments go away with the sale.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        let atual = buscar::<recebimentos::Entity, _>(&self.db, id, false).await?;
        if atual.venda_id.is_some() {
            return Err(RepositoryError::InvalidState(
                "sale installments are removed with their sale".to_string(),
            ));
        }
        excluir::<recebimentos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted recebimento.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<RecebimentoView, RepositoryError> {
        let recebimento = restaurar::<recebimentos::Entity>(&self.db, ator, id).await?;
        view(recebimento, hoje())
    }
}
