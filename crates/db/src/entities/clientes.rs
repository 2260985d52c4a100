//! `SeaORM` Entity for clientes table.
//!
//! Customers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "clientes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome: String,
    pub tipo_pessoa: String,
    #[sea_orm(unique)]
    pub documento: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cidade_id: Option<Uuid>,
    pub endereco: Option<String>,
    pub cep: Option<String>,
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
    const ENTIDADE: &'static str = "clientes";

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
