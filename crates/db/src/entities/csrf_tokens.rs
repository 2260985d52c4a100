//! `SeaORM` Entity for csrf_tokens table.
//!
//! CSRF tokens (stored hashed).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "csrf_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub colaborador_id: Uuid,
    #[sea_orm(unique)]
    pub token_hash: String,
    pub expira_em: DateTimeWithTimeZone,
    pub criado_em: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
