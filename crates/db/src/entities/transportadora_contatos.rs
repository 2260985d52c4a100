//! `SeaORM` Entity for transportadora_contatos table.
//!
//! Contacts of a carrier.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transportadora_contatos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transportadora_id: Uuid,
    pub nome: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cargo: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transportadoras::Entity",
        from = "Column::TransportadoraId",
        to = "super::transportadoras::Column::Id"
    )]
    Transportadoras,
}

impl Related<super::transportadoras::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transportadoras.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
