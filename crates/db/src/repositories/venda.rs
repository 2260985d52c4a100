//! Venda (sale) repository.
//!
//! A sale is written together with its items and its receivable schedule in a
//! single transaction. Pricing and status rules live in
//! [`gestor_core::vendas::VendaService`].

use chrono::{NaiveDate, Utc};
use gestor_core::financeiro::{StatusTitulo, TipoTitulo};
use gestor_core::validation::{self, FieldErrors};
use gestor_core::vendas::{ItemInput, StatusVenda, VendaError, VendaService};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, filtrar_deletados, garantir_referencia, limpar,
    paginar, restaurar,
};
use crate::entities::{
    clientes, colaboradores, formas_pagamento, produtos, recebimentos, servicos, venda_itens,
    vendas,
};

/// Input for creating a sale.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVendaInput {
    /// Customer.
    pub cliente_id: Uuid,
    /// Seller; defaults to the authenticated colaborador.
    pub colaborador_id: Option<Uuid>,
    /// Payment method.
    pub forma_pagamento_id: Uuid,
    /// Sale date; defaults to today.
    pub data_venda: Option<NaiveDate>,
    /// Sale-level discount.
    #[serde(default)]
    pub desconto: Decimal,
    /// Number of installments.
    #[serde(default = "parcelas_padrao")]
    pub parcelas: i32,
    /// Due date of the first installment; defaults to the sale date.
    pub primeiro_vencimento: Option<NaiveDate>,
    /// Notes.
    pub observacoes: Option<String>,
    /// CRM id.
    pub external_id: Option<String>,
    /// Lines.
    pub itens: Vec<ItemInput>,
}

/// Input for updating a sale. Closed sales only accept `observacoes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendaInput {
    /// Customer.
    pub cliente_id: Option<Uuid>,
    /// Seller.
    pub colaborador_id: Option<Uuid>,
    /// Payment method.
    pub forma_pagamento_id: Option<Uuid>,
    /// Sale date.
    pub data_venda: Option<NaiveDate>,
    /// Notes.
    #[serde(default, deserialize_with = "double_option")]
    pub observacoes: Option<Option<String>>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
}

impl UpdateVendaInput {
    fn altera_outros_campos(&self) -> bool {
        self.cliente_id.is_some()
            || self.colaborador_id.is_some()
            || self.forma_pagamento_id.is_some()
            || self.data_venda.is_some()
            || self.external_id.is_some()
    }
}

/// Filter options for listing sales.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendaFilter {
    /// Customer.
    pub cliente_id: Option<Uuid>,
    /// Seller.
    pub colaborador_id: Option<Uuid>,
    /// `aberta`, `concluida` or `cancelada`.
    pub status: Option<String>,
    /// First day, inclusive.
    pub data_inicio: Option<NaiveDate>,
    /// Last day, inclusive.
    pub data_fim: Option<NaiveDate>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A sale with its lines and receivables.
#[derive(Debug, Clone, Serialize)]
pub struct VendaDetalhe {
    /// The sale.
    #[serde(flatten)]
    pub venda: vendas::Model,
    /// Lines.
    pub itens: Vec<venda_itens::Model>,
    /// Receivable schedule.
    pub recebimentos: Vec<recebimentos::Model>,
}

const fn parcelas_padrao() -> i32 {
    1
}

fn status_de(venda: &vendas::Model) -> Result<StatusVenda, RepositoryError> {
    venda
        .status
        .parse()
        .map_err(|e: String| RepositoryError::InvalidState(e))
}

/// Sale repository.
#[derive(Debug, Clone)]
pub struct VendaRepository {
    db: DatabaseConnection,
}

impl VendaRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists sales, highest number first.
    pub async fn list(
        &self,
        filter: &VendaFilter,
        page: PageRequest,
    ) -> Result<PageResponse<vendas::Model>, RepositoryError> {
        let mut query = filtrar_deletados(vendas::Entity::find(), filter.incluir_deletados);
        if let Some(cliente_id) = filter.cliente_id {
            query = query.filter(vendas::Column::ClienteId.eq(cliente_id));
        }
        if let Some(colaborador_id) = filter.colaborador_id {
            query = query.filter(vendas::Column::ColaboradorId.eq(colaborador_id));
        }
        if let Some(status) = limpar(filter.status.clone()) {
            let status: StatusVenda = status
                .parse()
                .map_err(|e: String| FieldErrors::single("status", e))?;
            query = query.filter(vendas::Column::Status.eq(status.as_str()));
        }
        if let Some(inicio) = filter.data_inicio {
            query = query.filter(vendas::Column::DataVenda.gte(inicio));
        }
        if let Some(fim) = filter.data_fim {
            query = query.filter(vendas::Column::DataVenda.lte(fim));
        }
        Ok(paginar(&self.db, query.order_by_desc(vendas::Column::Numero), page).await?)
    }

    /// Finds a sale with items and receivables.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<VendaDetalhe, RepositoryError> {
        carregar(&self.db, id, incluir_deletados).await
    }

    /// Creates a sale, its items and one receivable per installment.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateVendaInput,
    ) -> Result<VendaDetalhe, RepositoryError> {
        let Some(colaborador_id) = input.colaborador_id.or(ator.colaborador_id) else {
            return Err(FieldErrors::single("colaborador_id", "campo obrigatorio").into());
        };
        let observacoes = limpar(input.observacoes);
        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "observacoes", observacoes.as_deref(), 2000);
        errors.into_result()?;

        let totais = VendaService::calcular_totais(&input.itens, input.desconto)?;

        garantir_referencia::<clientes::Entity, _>(&self.db, "cliente_id", Some(input.cliente_id))
            .await?;
        garantir_referencia::<colaboradores::Entity, _>(
            &self.db,
            "colaborador_id",
            Some(colaborador_id),
        )
        .await?;
        let forma = forma_ativa(&self.db, input.forma_pagamento_id).await?;
        for item in &input.itens {
            garantir_referencia::<produtos::Entity, _>(&self.db, "produto_id", item.produto_id)
                .await?;
            garantir_referencia::<servicos::Entity, _>(&self.db, "servico_id", item.servico_id)
                .await?;
        }

        let data_venda = input.data_venda.unwrap_or_else(|| Utc::now().date_naive());
        let parcelas = VendaService::gerar_parcelas(
            totais.total,
            input.parcelas,
            forma.max_parcelas,
            input.primeiro_vencimento.unwrap_or(data_venda),
        )?;

        let txn = self.db.begin().await?;
        let numero = proximo_numero(&txn).await?;
        let now = agora();
        let venda = vendas::ActiveModel {
            id: Set(Uuid::new_v4()),
            numero: Set(numero),
            cliente_id: Set(input.cliente_id),
            colaborador_id: Set(colaborador_id),
            forma_pagamento_id: Set(forma.id),
            data_venda: Set(data_venda),
            subtotal: Set(totais.subtotal),
            desconto: Set(totais.desconto),
            total: Set(totais.total),
            parcelas: Set(input.parcelas),
            status: Set(StatusVenda::Aberta.as_str().to_string()),
            observacoes: Set(observacoes),
            external_id: Set(limpar(input.external_id)),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;

        for calculado in &totais.itens {
            venda_itens::ActiveModel {
                id: Set(Uuid::new_v4()),
                venda_id: Set(venda.id),
                produto_id: Set(calculado.item.produto_id),
                servico_id: Set(calculado.item.servico_id),
                descricao: Set(calculado.item.descricao.trim().to_string()),
                quantidade: Set(calculado.item.quantidade),
                preco_unitario: Set(calculado.item.preco_unitario),
                desconto: Set(calculado.item.desconto),
                total: Set(calculado.total),
                criado_em: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        // A zero total has nothing to receive.
        if totais.total > Decimal::ZERO {
            for parcela in &parcelas {
                recebimentos::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    descricao: Set(format!(
                        "Venda #{numero} - parcela {}/{}",
                        parcela.numero, input.parcelas
                    )),
                    cliente_id: Set(Some(input.cliente_id)),
                    venda_id: Set(Some(venda.id)),
                    parcela: Set(parcela.numero),
                    total_parcelas: Set(input.parcelas),
                    centro_custo_id: Set(None),
                    conta_bancaria_id: Set(None),
                    forma_pagamento_id: Set(Some(forma.id)),
                    valor: Set(parcela.valor),
                    valor_recebido: Set(Decimal::ZERO),
                    data_vencimento: Set(parcela.vencimento),
                    data_recebimento: Set(None),
                    status: Set(StatusTitulo::Pendente
                        .as_str(TipoTitulo::Recebimento)
                        .to_string()),
                    observacoes: Set(None),
                    criado_em: Set(now),
                    atualizado_em: Set(now),
                    deletado_em: Set(None),
                }
                .insert(&txn)
                .await?;
            }
        }

        let detalhe = carregar(&txn, venda.id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "vendas", venda.id).depois(&detalhe),
        )
        .await?;
        txn.commit().await?;

        info!(
            venda_id = %venda.id,
            numero,
            total = %venda.total,
            parcelas = input.parcelas,
            "venda created"
        );
        Ok(detalhe)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateVendaInput,
    ) -> Result<VendaDetalhe, RepositoryError> {
        let atual = self.find(id, false).await?;
        let status = status_de(&atual.venda)?;
        VendaService::validar_edicao(status, input.altera_outros_campos())?;

        let observacoes = input.observacoes.clone().map(limpar);
        if let Some(Some(obs)) = &observacoes {
            let mut errors = FieldErrors::new();
            validation::text(&mut errors, "observacoes", obs, 2000);
            errors.into_result()?;
        }
        garantir_referencia::<clientes::Entity, _>(&self.db, "cliente_id", input.cliente_id)
            .await?;
        garantir_referencia::<colaboradores::Entity, _>(
            &self.db,
            "colaborador_id",
            input.colaborador_id,
        )
        .await?;
        if let Some(forma_id) = input.forma_pagamento_id {
            let forma = forma_ativa(&self.db, forma_id).await?;
            if atual.venda.parcelas > forma.max_parcelas {
                return Err(VendaError::ParcelasExcedidas {
                    max: forma.max_parcelas,
                }
                .into());
            }
        }

        let mut active: vendas::ActiveModel = atual.venda.clone().into();
        if let Some(cliente_id) = input.cliente_id {
            active.cliente_id = Set(cliente_id);
        }
        if let Some(colaborador_id) = input.colaborador_id {
            active.colaborador_id = Set(colaborador_id);
        }
        if let Some(forma_id) = input.forma_pagamento_id {
            active.forma_pagamento_id = Set(forma_id);
        }
        if let Some(data) = input.data_venda {
            active.data_venda = Set(data);
        }
        if let Some(observacoes) = observacoes {
            active.observacoes = Set(observacoes);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        active.update(&txn).await?;
        if let Some(cliente_id) = input.cliente_id {
            recebimentos::Entity::update_many()
                .col_expr(
                    recebimentos::Column::ClienteId,
                    sea_orm::sea_query::Expr::value(Some(cliente_id)),
                )
                .filter(recebimentos::Column::VendaId.eq(id))
                .exec(&txn)
                .await?;
        }
        let detalhe = carregar(&txn, id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "vendas", id)
                .antes(&atual)
                .depois(&detalhe),
        )
        .await?;
        txn.commit().await?;
        Ok(detalhe)
    }

    /// Marks an open sale as completed.
    pub async fn concluir(&self, ator: &Ator, id: Uuid) -> Result<VendaDetalhe, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = carregar(&txn, id, false).await?;
        VendaService::validar_transicao(status_de(&atual.venda)?, StatusVenda::Concluida)?;

        let mut active: vendas::ActiveModel = atual.venda.clone().into();
        active.status = Set(StatusVenda::Concluida.as_str().to_string());
        active.atualizado_em = Set(agora());
        active.update(&txn).await?;

        let detalhe = carregar(&txn, id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("concluir", "vendas", id)
                .antes(&atual.venda)
                .depois(&detalhe.venda),
        )
        .await?;
        txn.commit().await?;

        info!(venda_id = %id, "venda concluded");
        Ok(detalhe)
    }

    /// Cancels a sale and its open receivables.
    ///
    /// # Errors
    ///
    /// Returns `VendaError::RecebimentoLiquidado` when any receivable of the sale
    /// already received money.
    pub async fn cancelar(&self, ator: &Ator, id: Uuid) -> Result<VendaDetalhe, RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = carregar(&txn, id, false).await?;
        VendaService::validar_transicao(status_de(&atual.venda)?, StatusVenda::Cancelada)?;

        if atual
            .recebimentos
            .iter()
            .any(|r| r.valor_recebido > Decimal::ZERO)
        {
            return Err(VendaError::RecebimentoLiquidado.into());
        }

        let now = agora();
        let cancelado = StatusTitulo::Cancelado.as_str(TipoTitulo::Recebimento);
        for recebimento in &atual.recebimentos {
            if StatusTitulo::parse(&recebimento.status).is_some_and(StatusTitulo::em_aberto) {
                let mut active: recebimentos::ActiveModel = recebimento.clone().into();
                active.status = Set(cancelado.to_string());
                active.atualizado_em = Set(now);
                active.update(&txn).await?;
            }
        }

        let mut active: vendas::ActiveModel = atual.venda.clone().into();
        active.status = Set(StatusVenda::Cancelada.as_str().to_string());
        active.atualizado_em = Set(now);
        active.update(&txn).await?;

        let detalhe = carregar(&txn, id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("cancelar", "vendas", id)
                .antes(&atual)
                .depois(&detalhe),
        )
        .await?;
        txn.commit().await?;

        info!(venda_id = %id, "venda cancelled");
        Ok(detalhe)
    }

    /// Soft deletes a cancelled sale together with its receivables.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let atual = carregar(&txn, id, false).await?;
        if status_de(&atual.venda)? != StatusVenda::Cancelada {
            return Err(RepositoryError::InvalidState(
                "only cancelled sales can be deleted".to_string(),
            ));
        }

        let now = agora();
        recebimentos::Entity::update_many()
            .col_expr(
                recebimentos::Column::DeletadoEm,
                sea_orm::sea_query::Expr::value(Some(now)),
            )
            .col_expr(
                recebimentos::Column::AtualizadoEm,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(recebimentos::Column::VendaId.eq(id))
            .filter(recebimentos::Column::DeletadoEm.is_null())
            .exec(&txn)
            .await?;
        let mut active: vendas::ActiveModel = atual.venda.clone().into();
        active.deletado_em = Set(Some(now));
        active.atualizado_em = Set(now);
        active.update(&txn).await?;

        auditoria::registrar(&txn, ator, Evento::new("excluir", "vendas", id).antes(&atual))
            .await?;
        txn.commit().await?;
        Ok(())
    }

    /// Restores a soft-deleted sale. Its receivables stay deleted.
    pub async fn restore(&self, ator: &Ator, id: Uuid) -> Result<VendaDetalhe, RepositoryError> {
        restaurar::<vendas::Entity>(&self.db, ator, id).await?;
        self.find(id, false).await
    }
}

async fn forma_ativa<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<formas_pagamento::Model, RepositoryError> {
    let forma = buscar::<formas_pagamento::Entity, _>(conn, id, false)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound { id, .. } => RepositoryError::ReferenceNotFound {
                campo: "forma_pagamento_id",
                id,
            },
            other => other,
        })?;
    if !forma.ativo {
        return Err(FieldErrors::single("forma_pagamento_id", "forma de pagamento inativa").into());
    }
    Ok(forma)
}

async fn proximo_numero<C: ConnectionTrait>(conn: &C) -> Result<i64, RepositoryError> {
    let ultimo = vendas::Entity::find()
        .order_by_desc(vendas::Column::Numero)
        .one(conn)
        .await?
        .map_or(0, |v| v.numero);
    Ok(ultimo + 1)
}

async fn carregar<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    incluir_deletados: bool,
) -> Result<VendaDetalhe, RepositoryError> {
    let venda = buscar::<vendas::Entity, _>(conn, id, incluir_deletados).await?;
    let itens = venda_itens::Entity::find()
        .filter(venda_itens::Column::VendaId.eq(id))
        .order_by_asc(venda_itens::Column::CriadoEm)
        .order_by_asc(venda_itens::Column::Id)
        .all(conn)
        .await?;
    let recebimentos = filtrar_deletados(
        recebimentos::Entity::find().filter(recebimentos::Column::VendaId.eq(id)),
        incluir_deletados,
    )
    .order_by_asc(recebimentos::Column::Parcela)
    .all(conn)
    .await?;
    Ok(VendaDetalhe {
        venda,
        itens,
        recebimentos,
    })
}
