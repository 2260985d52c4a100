//! `SeaORM` Entity for transportadora_enderecos table.
//!
//! Addresses of a carrier.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transportadora_enderecos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transportadora_id: Uuid,
    pub logradouro: String,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade_id: Option<Uuid>,
    pub cep: Option<String>,
    pub principal: bool,
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
