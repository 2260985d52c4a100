//! `SeaORM` Entity for produtos table.
//!
//! Products.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "produtos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub codigo: String,
    pub nome: String,
    pub grupo_id: Option<Uuid>,
    pub unidade: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub preco_custo: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub preco_venda: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 3)))")]
    pub estoque: Decimal,
    pub ativo: bool,
    pub external_id: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "produtos";

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
