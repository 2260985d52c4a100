//! Fleet: vehicles, fuel fills and the consumption report loader.

use std::collections::HashMap;

use chrono::NaiveDate;
use gestor_core::frota::{self, COMBUSTIVEIS, ConsumoVeiculo};
use gestor_core::validation::{self, FieldErrors};
use gestor_shared::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_referencia,
    garantir_unico, limpar, paginar, restaurar,
};
use crate::entities::{abastecimentos, colaboradores, veiculos};

/// Input for creating a vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVeiculoInput {
    /// License plate.
    pub placa: String,
    /// Model description.
    pub modelo: String,
    /// Model year.
    pub ano: Option<i32>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
}

/// Input for updating a vehicle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVeiculoInput {
    /// License plate.
    pub placa: Option<String>,
    /// Model description.
    pub modelo: Option<String>,
    /// Model year.
    #[serde(default, deserialize_with = "gestor_shared::types::double_option")]
    pub ano: Option<Option<i32>>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Filter options for listing vehicles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VeiculoFilter {
    /// Matches plate or model.
    pub busca: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// Input for recording a fuel fill.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAbastecimentoInput {
    /// Vehicle.
    pub veiculo_id: Uuid,
    /// Driver.
    pub colaborador_id: Option<Uuid>,
    /// Fill date.
    pub data: NaiveDate,
    /// Odometer reading in km.
    pub odometro: Decimal,
    /// Liters, > 0.
    pub litros: Decimal,
    /// Amount paid, >= 0.
    pub valor_total: Decimal,
    /// One of [`COMBUSTIVEIS`].
    pub combustivel: String,
    /// Gas station.
    pub posto: Option<String>,
}

/// Filter options for listing fills.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbastecimentoFilter {
    /// Vehicle.
    pub veiculo_id: Option<Uuid>,
    /// First day, inclusive.
    pub data_inicio: Option<NaiveDate>,
    /// Last day, inclusive.
    pub data_fim: Option<NaiveDate>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A report line with the vehicle it describes.
#[derive(Debug, Clone, Serialize)]
pub struct LinhaRelatorioFrota {
    /// License plate.
    pub placa: String,
    /// Model description.
    pub modelo: String,
    /// Consumption figures.
    #[serde(flatten)]
    pub consumo: ConsumoVeiculo,
}

const fn ativo_padrao() -> bool {
    true
}

/// Fleet repository.
#[derive(Debug, Clone)]
pub struct FrotaRepository {
    db: DatabaseConnection,
}

impl FrotaRepository {
    /// Creates a new fleet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // veiculos
    // ------------------------------------------------------------------

    /// Lists vehicles ordered by plate.
    pub async fn list_veiculos(
        &self,
        filter: &VeiculoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<veiculos::Model>, RepositoryError> {
        let mut query = filtrar_deletados(veiculos::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(veiculos::Column::Placa.contains(frota::normalizar_placa(&busca)))
                    .add(veiculos::Column::Modelo.contains(&busca)),
            );
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(veiculos::Column::Ativo.eq(ativo));
        }
        Ok(paginar(&self.db, query.order_by_asc(veiculos::Column::Placa), page).await?)
    }

    /// Finds a vehicle by id.
    pub async fn find_veiculo(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<veiculos::Model, RepositoryError> {
        buscar::<veiculos::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Registers a vehicle.
    pub async fn create_veiculo(
        &self,
        ator: &Ator,
        input: CreateVeiculoInput,
    ) -> Result<veiculos::Model, RepositoryError> {
        let placa = frota::normalizar_placa(&input.placa);
        let modelo = input.modelo.trim().to_string();

        let mut errors = FieldErrors::new();
        if !frota::placa_valida(&placa) {
            errors.add("placa", "placa invalida");
        }
        validation::text(&mut errors, "modelo", &modelo, 100);
        validar_ano(&mut errors, input.ano);
        errors.into_result()?;

        garantir_unico::<veiculos::Entity, _, _>(
            &self.db,
            veiculos::Column::Placa,
            placa.clone(),
            None,
            "placa",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let veiculo = veiculos::ActiveModel {
            id: Set(Uuid::new_v4()),
            placa: Set(placa),
            modelo: Set(modelo),
            ano: Set(input.ano),
            ativo: Set(input.ativo),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "veiculos", veiculo.id).depois(&veiculo),
        )
        .await?;
        txn.commit().await?;

        info!(veiculo_id = %veiculo.id, placa = %veiculo.placa, "veiculo created");
        Ok(veiculo)
    }

    /// Applies a partial update.
    pub async fn update_veiculo(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateVeiculoInput,
    ) -> Result<veiculos::Model, RepositoryError> {
        let atual = self.find_veiculo(id, false).await?;
        let placa = input.placa.as_deref().map(frota::normalizar_placa);
        let modelo = input.modelo.map(|m| m.trim().to_string());

        let mut errors = FieldErrors::new();
        if placa.as_deref().is_some_and(|p| !frota::placa_valida(p)) {
            errors.add("placa", "placa invalida");
        }
        validation::optional_text(&mut errors, "modelo", modelo.as_deref(), 100);
        if let Some(ano) = input.ano {
            validar_ano(&mut errors, ano);
        }
        errors.into_result()?;

        if let Some(placa) = &placa {
            garantir_unico::<veiculos::Entity, _, _>(
                &self.db,
                veiculos::Column::Placa,
                placa.clone(),
                Some(id),
                "placa",
            )
            .await?;
        }

        let mut active: veiculos::ActiveModel = atual.clone().into();
        if let Some(placa) = placa {
            active.placa = Set(placa);
        }
        if let Some(modelo) = modelo {
            active.modelo = Set(modelo);
        }
        if let Some(ano) = input.ano {
            active.ano = Set(ano);
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        let veiculo = active.update(&txn).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "veiculos", id)
                .antes(&atual)
                .depois(&veiculo),
        )
        .await?;
        txn.commit().await?;
        Ok(veiculo)
    }

    /// Soft deletes a vehicle.
    pub async fn delete_veiculo(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<veiculos::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted vehicle.
    pub async fn restore_veiculo(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<veiculos::Model, RepositoryError> {
        restaurar::<veiculos::Entity>(&self.db, ator, id).await
    }

    // ------------------------------------------------------------------
    // abastecimentos
    // ------------------------------------------------------------------

    /// Lists fills, newest first.
    pub async fn list_abastecimentos(
        &self,
        filter: &AbastecimentoFilter,
        page: PageRequest,
    ) -> Result<PageResponse<abastecimentos::Model>, RepositoryError> {
        let mut query =
            filtrar_deletados(abastecimentos::Entity::find(), filter.incluir_deletados);
        if let Some(veiculo_id) = filter.veiculo_id {
            query = query.filter(abastecimentos::Column::VeiculoId.eq(veiculo_id));
        }
        if let Some(inicio) = filter.data_inicio {
            query = query.filter(abastecimentos::Column::Data.gte(inicio));
        }
        if let Some(fim) = filter.data_fim {
            query = query.filter(abastecimentos::Column::Data.lte(fim));
        }
        let query = query
            .order_by_desc(abastecimentos::Column::Data)
            .order_by_desc(abastecimentos::Column::Odometro);
        Ok(paginar(&self.db, query, page).await?)
    }

    /// Finds a fill by id.
    pub async fn find_abastecimento(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<abastecimentos::Model, RepositoryError> {
        buscar::<abastecimentos::Entity, _>(&self.db, id, incluir_deletados).await
    }

    /// Records a fill. The odometer must fit between the vehicle's neighbouring fills.
    pub async fn create_abastecimento(
        &self,
        ator: &Ator,
        input: CreateAbastecimentoInput,
    ) -> Result<abastecimentos::Model, RepositoryError> {
        let combustivel = input.combustivel.trim().to_lowercase();
        let posto = limpar(input.posto);

        let mut errors = FieldErrors::new();
        validation::positive(&mut errors, "litros", input.litros);
        validation::non_negative(&mut errors, "valor_total", input.valor_total);
        validation::one_of(&mut errors, "combustivel", &combustivel, &COMBUSTIVEIS);
        validation::optional_text(&mut errors, "posto", posto.as_deref(), 150);

        garantir_referencia::<veiculos::Entity, _>(&self.db, "veiculo_id", Some(input.veiculo_id))
            .await?;
        garantir_referencia::<colaboradores::Entity, _>(
            &self.db,
            "colaborador_id",
            input.colaborador_id,
        )
        .await?;

        let anterior = abastecimentos::Entity::find()
            .filter(abastecimentos::Column::VeiculoId.eq(input.veiculo_id))
            .filter(abastecimentos::Column::DeletadoEm.is_null())
            .filter(abastecimentos::Column::Data.lte(input.data))
            .order_by_desc(abastecimentos::Column::Odometro)
            .one(&self.db)
            .await?
            .map(|a| a.odometro);
        let posterior = abastecimentos::Entity::find()
            .filter(abastecimentos::Column::VeiculoId.eq(input.veiculo_id))
            .filter(abastecimentos::Column::DeletadoEm.is_null())
            .filter(abastecimentos::Column::Data.gt(input.data))
            .order_by_asc(abastecimentos::Column::Odometro)
            .one(&self.db)
            .await?
            .map(|a| a.odometro);
        frota::validar_odometro(&mut errors, input.odometro, anterior, posterior);
        errors.into_result()?;

        let txn = self.db.begin().await?;
        let now = agora();
        let abastecimento = abastecimentos::ActiveModel {
            id: Set(Uuid::new_v4()),
            veiculo_id: Set(input.veiculo_id),
            colaborador_id: Set(input.colaborador_id),
            data: Set(input.data),
            odometro: Set(input.odometro),
            litros: Set(input.litros),
            valor_total: Set(input.valor_total),
            combustivel: Set(combustivel),
            posto: Set(posto),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "abastecimentos", abastecimento.id).depois(&abastecimento),
        )
        .await?;
        txn.commit().await?;

        info!(
            abastecimento_id = %abastecimento.id,
            veiculo_id = %abastecimento.veiculo_id,
            "abastecimento recorded"
        );
        Ok(abastecimento)
    }

    /// Soft deletes a fill.
    pub async fn delete_abastecimento(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<abastecimentos::Entity>(&self.db, ator, id).await
    }

    // ------------------------------------------------------------------
    // relatorio
    // ------------------------------------------------------------------

    /// Consumption report of live fills in `[inicio, fim]`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` when `inicio > fim`.
    pub async fn relatorio_consumo(
        &self,
        inicio: NaiveDate,
        fim: NaiveDate,
        veiculo_id: Option<Uuid>,
    ) -> Result<Vec<LinhaRelatorioFrota>, RepositoryError> {
        if inicio > fim {
            return Err(FieldErrors::single("fim", "deve ser posterior ao inicio").into());
        }

        let mut query = abastecimentos::Entity::find()
            .filter(abastecimentos::Column::DeletadoEm.is_null())
            .filter(abastecimentos::Column::Data.gte(inicio))
            .filter(abastecimentos::Column::Data.lte(fim));
        if let Some(veiculo_id) = veiculo_id {
            query = query.filter(abastecimentos::Column::VeiculoId.eq(veiculo_id));
        }
        let fills: Vec<frota::Abastecimento> = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| frota::Abastecimento {
                veiculo_id: a.veiculo_id,
                data: a.data,
                odometro: a.odometro,
                litros: a.litros,
                valor_total: a.valor_total,
            })
            .collect();

        let consumo = frota::relatorio_consumo(&fills);
        let ids: Vec<Uuid> = consumo.iter().map(|c| c.veiculo_id).collect();
        let veiculos: HashMap<Uuid, veiculos::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            veiculos::Entity::find()
                .filter(veiculos::Column::Id.is_in(ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|v| (v.id, v))
                .collect()
        };

        let mut linhas: Vec<LinhaRelatorioFrota> = consumo
            .into_iter()
            .map(|consumo| {
                let (placa, modelo) = veiculos
                    .get(&consumo.veiculo_id)
                    .map(|v| (v.placa.clone(), v.modelo.clone()))
                    .unwrap_or_default();
                LinhaRelatorioFrota {
                    placa,
                    modelo,
                    consumo,
                }
            })
            .collect();
        linhas.sort_by(|a, b| a.placa.cmp(&b.placa));
        Ok(linhas)
    }
}

fn validar_ano(errors: &mut FieldErrors, ano: Option<i32>) {
    if ano.is_some_and(|a| !(1950..=2100).contains(&a)) {
        errors.add("ano", "ano invalido");
    }
}
