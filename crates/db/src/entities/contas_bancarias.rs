//! `SeaORM` Entity for contas_bancarias table.
//!
//! Bank accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contas_bancarias")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub banco_codigo: String,
    pub banco_nome: String,
    pub agencia: String,
    pub conta: String,
    pub digito: Option<String>,
    pub tipo: String,
    pub titular: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub saldo_inicial: Decimal,
    pub ativo: bool,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "contas_bancarias";

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
