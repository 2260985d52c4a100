//! Transportadora (carrier) repository.
//!
//! A carrier owns its contacts and addresses. Create and update write the three
//! tables in one transaction; an update that carries a collection replaces it.

use gestor_core::validation::{self, FieldErrors};
use gestor_shared::types::double_option;
use gestor_shared::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auditoria::{self, Evento};
use super::common::{
    Ator, RepositoryError, agora, buscar, excluir, filtrar_deletados, garantir_cidade,
    garantir_unico, limpar, paginar, restaurar,
};
use crate::entities::{transportadora_contatos, transportadora_enderecos, transportadoras};

/// A contact person.
#[derive(Debug, Clone, Deserialize)]
pub struct ContatoInput {
    /// Name.
    pub nome: String,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub telefone: Option<String>,
    /// Job title.
    pub cargo: Option<String>,
}

/// An address.
#[derive(Debug, Clone, Deserialize)]
pub struct EnderecoInput {
    /// Street.
    pub logradouro: String,
    /// Number.
    pub numero: Option<String>,
    /// Complement.
    pub complemento: Option<String>,
    /// District.
    pub bairro: Option<String>,
    /// City.
    pub cidade_id: Option<Uuid>,
    /// Postal code.
    pub cep: Option<String>,
    /// Main address; at most one.
    #[serde(default)]
    pub principal: bool,
}

/// Input for creating a transportadora.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransportadoraInput {
    /// Company name.
    pub razao_social: String,
    /// Trade name.
    pub nome_fantasia: Option<String>,
    /// CNPJ.
    pub cnpj: String,
    /// State registration.
    pub inscricao_estadual: Option<String>,
    /// ANTT cargo carrier registration.
    pub rntrc: Option<String>,
    /// Active flag.
    #[serde(default = "ativo_padrao")]
    pub ativo: bool,
    /// CRM id.
    pub external_id: Option<String>,
    /// Contacts.
    #[serde(default)]
    pub contatos: Vec<ContatoInput>,
    /// Addresses.
    #[serde(default)]
    pub enderecos: Vec<EnderecoInput>,
}

/// Input for updating a transportadora.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransportadoraInput {
    /// Company name.
    pub razao_social: Option<String>,
    /// Trade name.
    #[serde(default, deserialize_with = "double_option")]
    pub nome_fantasia: Option<Option<String>>,
    /// CNPJ.
    pub cnpj: Option<String>,
    /// State registration.
    #[serde(default, deserialize_with = "double_option")]
    pub inscricao_estadual: Option<Option<String>>,
    /// Carrier registration.
    #[serde(default, deserialize_with = "double_option")]
    pub rntrc: Option<Option<String>>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// CRM id.
    #[serde(default, deserialize_with = "double_option")]
    pub external_id: Option<Option<String>>,
    /// Replaces all contacts when present.
    pub contatos: Option<Vec<ContatoInput>>,
    /// Replaces all addresses when present.
    pub enderecos: Option<Vec<EnderecoInput>>,
}

/// Filter options for listing transportadoras.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportadoraFilter {
    /// Matches company name, trade name or CNPJ.
    pub busca: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

/// A carrier with its contacts and addresses.
#[derive(Debug, Clone, Serialize)]
pub struct TransportadoraDetalhe {
    /// The carrier.
    #[serde(flatten)]
    pub transportadora: transportadoras::Model,
    /// Contacts.
    pub contatos: Vec<transportadora_contatos::Model>,
    /// Addresses, main first.
    pub enderecos: Vec<transportadora_enderecos::Model>,
}

const fn ativo_padrao() -> bool {
    true
}

fn validar_contatos(errors: &mut FieldErrors, contatos: &[ContatoInput]) {
    for (i, c) in contatos.iter().enumerate() {
        validation::text(errors, &format!("contatos[{i}].nome"), &c.nome, 150);
        validation::optional_email(
            errors,
            &format!("contatos[{i}].email"),
            c.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
        );
        validation::optional_telefone(
            errors,
            &format!("contatos[{i}].telefone"),
            c.telefone.as_deref().map(str::trim).filter(|t| !t.is_empty()),
        );
    }
}

fn validar_enderecos(errors: &mut FieldErrors, enderecos: &[EnderecoInput]) {
    for (i, e) in enderecos.iter().enumerate() {
        validation::text(errors, &format!("enderecos[{i}].logradouro"), &e.logradouro, 200);
        validation::optional_cep(
            errors,
            &format!("enderecos[{i}].cep"),
            e.cep.as_deref().map(str::trim).filter(|c| !c.is_empty()),
        );
    }
    if enderecos.iter().filter(|e| e.principal).count() > 1 {
        errors.add("enderecos", "apenas um endereco pode ser principal");
    }
}

async fn garantir_cidades<C: ConnectionTrait>(
    conn: &C,
    enderecos: &[EnderecoInput],
) -> Result<(), RepositoryError> {
    for e in enderecos {
        garantir_cidade(conn, e.cidade_id).await?;
    }
    Ok(())
}

async fn gravar_contatos<C: ConnectionTrait>(
    conn: &C,
    transportadora_id: Uuid,
    contatos: Vec<ContatoInput>,
) -> Result<(), DbErr> {
    transportadora_contatos::Entity::delete_many()
        .filter(transportadora_contatos::Column::TransportadoraId.eq(transportadora_id))
        .exec(conn)
        .await?;
    let now = agora();
    for c in contatos {
        transportadora_contatos::ActiveModel {
            id: Set(Uuid::new_v4()),
            transportadora_id: Set(transportadora_id),
            nome: Set(c.nome.trim().to_string()),
            email: Set(limpar(c.email).map(|e| e.to_lowercase())),
            telefone: Set(limpar(c.telefone)),
            cargo: Set(limpar(c.cargo)),
            criado_em: Set(now),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn gravar_enderecos<C: ConnectionTrait>(
    conn: &C,
    transportadora_id: Uuid,
    enderecos: Vec<EnderecoInput>,
) -> Result<(), DbErr> {
    transportadora_enderecos::Entity::delete_many()
        .filter(transportadora_enderecos::Column::TransportadoraId.eq(transportadora_id))
        .exec(conn)
        .await?;
    // With no explicit main address the first one is main.
    let tem_principal = enderecos.iter().any(|e| e.principal);
    let now = agora();
    for (i, e) in enderecos.into_iter().enumerate() {
        transportadora_enderecos::ActiveModel {
            id: Set(Uuid::new_v4()),
            transportadora_id: Set(transportadora_id),
            logradouro: Set(e.logradouro.trim().to_string()),
            numero: Set(limpar(e.numero)),
            complemento: Set(limpar(e.complemento)),
            bairro: Set(limpar(e.bairro)),
            cidade_id: Set(e.cidade_id),
            cep: Set(limpar(e.cep).map(|c| validation::somente_digitos(&c))),
            principal: Set(e.principal || (!tem_principal && i == 0)),
            criado_em: Set(now),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Transportadora repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TransportadoraRepository {
    db: DatabaseConnection,
}

impl TransportadoraRepository {
    /// Creates a new transportadora repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists carriers (without children) ordered by company name.
    pub async fn list(
        &self,
        filter: &TransportadoraFilter,
        page: PageRequest,
    ) -> Result<PageResponse<transportadoras::Model>, RepositoryError> {
        let mut query =
            filtrar_deletados(transportadoras::Entity::find(), filter.incluir_deletados);
        if let Some(busca) = limpar(filter.busca.clone()) {
            let mut cond = Condition::any()
                .add(transportadoras::Column::RazaoSocial.contains(&busca))
                .add(transportadoras::Column::NomeFantasia.contains(&busca));
            let digitos = validation::somente_digitos(&busca);
            if !digitos.is_empty() {
                cond = cond.add(transportadoras::Column::Cnpj.contains(digitos));
            }
            query = query.filter(cond);
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(transportadoras::Column::Ativo.eq(ativo));
        }
        Ok(paginar(
            &self.db,
            query.order_by_asc(transportadoras::Column::RazaoSocial),
            page,
        )
        .await?)
    }

    /// Finds a carrier with its children.
    pub async fn find(
        &self,
        id: Uuid,
        incluir_deletados: bool,
    ) -> Result<TransportadoraDetalhe, RepositoryError> {
        carregar(&self.db, id, incluir_deletados).await
    }

    /// Creates a carrier with contacts and addresses.
    pub async fn create(
        &self,
        ator: &Ator,
        input: CreateTransportadoraInput,
    ) -> Result<TransportadoraDetalhe, RepositoryError> {
        let razao_social = input.razao_social.trim().to_string();
        let nome_fantasia = limpar(input.nome_fantasia);
        let cnpj = validation::somente_digitos(&input.cnpj);

        let mut errors = FieldErrors::new();
        validation::text(&mut errors, "razao_social", &razao_social, 150);
        validation::optional_text(&mut errors, "nome_fantasia", nome_fantasia.as_deref(), 150);
        validation::cnpj(&mut errors, "cnpj", &cnpj);
        validar_contatos(&mut errors, &input.contatos);
        validar_enderecos(&mut errors, &input.enderecos);
        errors.into_result()?;

        garantir_cidades(&self.db, &input.enderecos).await?;
        garantir_unico::<transportadoras::Entity, _, _>(
            &self.db,
            transportadoras::Column::Cnpj,
            cnpj.clone(),
            None,
            "cnpj",
        )
        .await?;

        let txn = self.db.begin().await?;
        let now = agora();
        let transportadora = transportadoras::ActiveModel {
            id: Set(Uuid::new_v4()),
            razao_social: Set(razao_social),
            nome_fantasia: Set(nome_fantasia),
            cnpj: Set(cnpj),
            inscricao_estadual: Set(limpar(input.inscricao_estadual)),
            rntrc: Set(limpar(input.rntrc)),
            ativo: Set(input.ativo),
            external_id: Set(limpar(input.external_id)),
            criado_em: Set(now),
            atualizado_em: Set(now),
            deletado_em: Set(None),
        }
        .insert(&txn)
        .await?;
        gravar_contatos(&txn, transportadora.id, input.contatos).await?;
        gravar_enderecos(&txn, transportadora.id, input.enderecos).await?;

        let detalhe = carregar(&txn, transportadora.id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("criar", "transportadoras", transportadora.id).depois(&detalhe),
        )
        .await?;
        txn.commit().await?;

        info!(
            transportadora_id = %transportadora.id,
            contatos = detalhe.contatos.len(),
            enderecos = detalhe.enderecos.len(),
            "transportadora created"
        );
        Ok(detalhe)
    }

    /// Applies a partial update; provided collections replace the stored ones.
    pub async fn update(
        &self,
        ator: &Ator,
        id: Uuid,
        input: UpdateTransportadoraInput,
    ) -> Result<TransportadoraDetalhe, RepositoryError> {
        let atual = self.find(id, false).await?;
        let razao_social = input.razao_social.map(|r| r.trim().to_string());
        let nome_fantasia = input.nome_fantasia.map(limpar);
        let cnpj = input.cnpj.as_deref().map(validation::somente_digitos);

        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "razao_social", razao_social.as_deref(), 150);
        if let Some(nome_fantasia) = &nome_fantasia {
            validation::optional_text(&mut errors, "nome_fantasia", nome_fantasia.as_deref(), 150);
        }
        if let Some(cnpj) = &cnpj {
            validation::cnpj(&mut errors, "cnpj", cnpj);
        }
        if let Some(contatos) = &input.contatos {
            validar_contatos(&mut errors, contatos);
        }
        if let Some(enderecos) = &input.enderecos {
            validar_enderecos(&mut errors, enderecos);
        }
        errors.into_result()?;

        if let Some(enderecos) = &input.enderecos {
            garantir_cidades(&self.db, enderecos).await?;
        }
        if let Some(cnpj) = &cnpj {
            garantir_unico::<transportadoras::Entity, _, _>(
                &self.db,
                transportadoras::Column::Cnpj,
                cnpj.clone(),
                Some(id),
                "cnpj",
            )
            .await?;
        }

        let mut active: transportadoras::ActiveModel = atual.transportadora.clone().into();
        if let Some(razao_social) = razao_social {
            active.razao_social = Set(razao_social);
        }
        if let Some(nome_fantasia) = nome_fantasia {
            active.nome_fantasia = Set(nome_fantasia);
        }
        if let Some(cnpj) = cnpj {
            active.cnpj = Set(cnpj);
        }
        if let Some(ie) = input.inscricao_estadual {
            active.inscricao_estadual = Set(limpar(ie));
        }
        if let Some(rntrc) = input.rntrc {
            active.rntrc = Set(limpar(rntrc));
        }
        if let Some(ativo) = input.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(external_id) = input.external_id {
            active.external_id = Set(limpar(external_id));
        }
        active.atualizado_em = Set(agora());

        let txn = self.db.begin().await?;
        active.update(&txn).await?;
        if let Some(contatos) = input.contatos {
            gravar_contatos(&txn, id, contatos).await?;
        }
        if let Some(enderecos) = input.enderecos {
            gravar_enderecos(&txn, id, enderecos).await?;
        }
        let detalhe = carregar(&txn, id, false).await?;
        auditoria::registrar(
            &txn,
            ator,
            Evento::new("atualizar", "transportadoras", id)
                .antes(&atual)
                .depois(&detalhe),
        )
        .await?;
        txn.commit().await?;
        Ok(detalhe)
    }

    /// Soft deletes a carrier; children stay attached.
    pub async fn delete(&self, ator: &Ator, id: Uuid) -> Result<(), RepositoryError> {
        excluir::<transportadoras::Entity>(&self.db, ator, id).await
    }

    /// Restores a soft-deleted carrier.
    pub async fn restore(
        &self,
        ator: &Ator,
        id: Uuid,
    ) -> Result<TransportadoraDetalhe, RepositoryError> {
        restaurar::<transportadoras::Entity>(&self.db, ator, id).await?;
        self.find(id, false).await
    }
}

async fn carregar<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    incluir_deletados: bool,
) -> Result<TransportadoraDetalhe, RepositoryError> {
    let transportadora = buscar::<transportadoras::Entity, _>(conn, id, incluir_deletados).await?;
    let contatos = transportadora_contatos::Entity::find()
        .filter(transportadora_contatos::Column::TransportadoraId.eq(id))
        .order_by_asc(transportadora_contatos::Column::Nome)
        .all(conn)
        .await?;
    let enderecos = transportadora_enderecos::Entity::find()
        .filter(transportadora_enderecos::Column::TransportadoraId.eq(id))
        .order_by_desc(transportadora_enderecos::Column::Principal)
        .order_by_asc(transportadora_enderecos::Column::Logradouro)
        .all(conn)
        .await?;
    Ok(TransportadoraDetalhe {
        transportadora,
        contatos,
        enderecos,
    })
}
