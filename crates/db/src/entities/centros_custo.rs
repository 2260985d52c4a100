//! `SeaORM` Entity for centros_custo table.
//!
//! Cost centers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "centros_custo")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub ativo: bool,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "centros_custo";

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
