//! `SeaORM` Entity for recebimentos table.
//!
//! Accounts receivable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "recebimentos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub descricao: String,
    pub cliente_id: Option<Uuid>,
    pub venda_id: Option<Uuid>,
    pub parcela: i32,
    pub total_parcelas: i32,
    pub centro_custo_id: Option<Uuid>,
    pub conta_bancaria_id: Option<Uuid>,
    pub forma_pagamento_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub valor: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub valor_recebido: Decimal,
    pub data_vencimento: Date,
    pub data_recebimento: Option<Date>,
    pub status: String,
    pub observacoes: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "recebimentos";

    fn coluna_id() -> Column {
        Column::Id
    }

    fn coluna_deletado_em() -> Column {
        Column::DeletadoEm
    }

    fn coluna_atualizado_em() -> Column {
        Column::AtualizadoEm
    }
}
