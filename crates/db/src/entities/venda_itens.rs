//! `SeaORM` Entity for venda_itens table.
//!
//! Sale lines.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "venda_itens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub venda_id: Uuid,
    pub produto_id: Option<Uuid>,
    pub servico_id: Option<Uuid>,
    pub descricao: String,
    #[sea_orm(column_type = "Decimal(Some((15, 3)))")]
    pub quantidade: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub preco_unitario: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub desconto: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total: Decimal,
    pub criado_em: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendas::Entity",
        from = "Column::VendaId",
        to = "super::vendas::Column::Id"
    )]
    Vendas,
}

impl Related<super::vendas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
