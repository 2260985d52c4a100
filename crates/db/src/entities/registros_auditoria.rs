//! `SeaORM` Entity for registros_auditoria table.
//!
//! Audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "registros_auditoria")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub colaborador_id: Option<Uuid>,
    pub acao: String,
    pub entidade: String,
    pub entidade_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub dados_anteriores: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub dados_novos: Option<Json>,
    pub ip: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
