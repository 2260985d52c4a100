//! `SeaORM` Entity for sessoes table.
//!
//! Refresh-token sessions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sessoes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub colaborador_id: Uuid,
    #[sea_orm(unique)]
    pub refresh_token_hash: String,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub expira_em: DateTimeWithTimeZone,
    pub revogada_em: Option<DateTimeWithTimeZone>,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::colaboradores::Entity",
        from = "Column::ColaboradorId",
        to = "super::colaboradores::Column::Id"
    )]
    Colaboradores,
}

impl Related<super::colaboradores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Colaboradores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
