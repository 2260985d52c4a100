//! `SeaORM` Entity for colaboradores table.
//!
//! Employees who log into the system.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "colaboradores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub cpf: String,
    pub telefone: Option<String>,
    pub cargo: Option<String>,
    #[serde(skip_serializing)]
    pub senha_hash: String,
    pub role_id: Uuid,
    pub ativo: bool,
    pub ultimo_login_em: Option<DateTimeWithTimeZone>,
    pub external_id: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Roles,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "colaboradores";

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
