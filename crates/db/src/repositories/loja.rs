//! Store information: a single row, read and upserted as a whole.

use gestor_core::validation::{self, FieldErrors};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{Ator, RepositoryError, agora, garantir_cidade, limpar};
use crate::entities::loja_informacoes;

/// Store data; `PUT /loja` sends the whole object.
#[derive(Debug, Clone, Deserialize)]
pub struct LojaInput {
    /// Company name.
    pub razao_social: String,
    /// Trade name.
    pub nome_fantasia: Option<String>,
    /// CNPJ.
    pub cnpj: String,
    /// State registration.
    pub inscricao_estadual: Option<String>,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub telefone: Option<String>,
    /// Street address.
    pub endereco: Option<String>,
    /// City.
    pub cidade_id: Option<Uuid>,
    /// Postal code.
    pub cep: Option<String>,
}

/// Store information repository.
#[derive(Debug, Clone)]
pub struct LojaRepository {
    db: DatabaseConnection,
}

impl LojaRepository {
    /// Creates a new store repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The store row, if configured.
    pub async fn get(&self) -> Result<Option<loja_informacoes::Model>, RepositoryError> {
        Ok(loja_informacoes::Entity::find()
            .order_by_asc(loja_informacoes::Column::CriadoEm)
            .one(&self.db)
            .await?)
    }

    /// Creates the store row or replaces its data.
    pub async fn upsert(
        &self,
        ator: &Ator,
        input: LojaInput,
    ) -> Result<loja_informacoes::Model, RepositoryError> {
        let razao_social = input.razao_social.trim().to_string();
        let cnpj = validation::somente_digitos(&input.cnpj);
        let email = limpar(input.email).map(|e| e.to_lowercase());
        let telefone = limpar(input.telefone);
        let cep = limpar(input.cep).map(|c| validation::somente_digitos(&c));

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "razao_social", &razao_social, 150);
        validation::cnpj(&mut errors, "cnpj", &cnpj);
        validation::optional_email(&mut errors, "email", email.as_deref());
        validation::optional_telefone(&mut errors, "telefone", telefone.as_deref());
        validation::optional_cep(&mut errors, "cep", cep.as_deref());
        errors.into_result()?;
        garantir_cidade(&self.db, input.cidade_id).await?;

        let atual = self.get().await?;
        let now = agora();
        let mut active = match &atual {
            Some(model) => model.clone().into(),
            None => loja_informacoes::ActiveModel {
                id: Set(Uuid::new_v4()),
                criado_em: Set(now),
                ..Default::default()
            },
        };
        active.razao_social = Set(razao_social);
        active.nome_fantasia = Set(limpar(input.nome_fantasia));
        active.cnpj = Set(cnpj);
        active.inscricao_estadual = Set(limpar(input.inscricao_estadual));
        active.email = Set(email);
        active.telefone = Set(telefone);
        active.endereco = Set(limpar(input.endereco));
        active.cidade_id = Set(input.cidade_id);
        active.cep = Set(cep);
        active.atualizado_em = Set(now);

        let txn = self.db.begin().await?;
        let loja = if atual.is_some() {
            active.update(&txn).await?
        } else {
            active.insert(&txn).await?
        };
        let mut evento = Evento::new("atualizar", "loja_informacoes", loja.id).depois(&loja);
        if let Some(atual) = &atual {
            evento = evento.antes(atual);
        }
        auditoria::registrar(&txn, ator, evento).await?;
        txn.commit().await?;

        info!(loja_id = %loja.id, "store information saved");
        Ok(loja)
    }
}
