//! `SeaORM` Entity for abastecimentos table.
//!
//! Fuel fills of fleet vehicles.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::SoftDelete;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "abastecimentos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub veiculo_id: Uuid,
    pub colaborador_id: Option<Uuid>,
    pub data: Date,
    #[sea_orm(column_type = "Decimal(Some((12, 1)))")]
    pub odometro: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 3)))")]
    pub litros: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub valor_total: Decimal,
    pub combustivel: String,
    pub posto: Option<String>,
    pub criado_em: DateTimeWithTimeZone,
    pub atualizado_em: DateTimeWithTimeZone,
    pub deletado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::veiculos::Entity",
        from = "Column::VeiculoId",
        to = "super::veiculos::Column::Id"
    )]
    Veiculos,
}

impl Related<super::veiculos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Veiculos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    const ENTIDADE: &'static str = "abastecimentos";

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
