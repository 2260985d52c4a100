//! Synchronization between local clientes/fornecedores and the CRM.
//!
//! Local rows keep the CRM id in `external_id`. Pushing creates the contact on the
//! first sync and overwrites it afterwards; importing pulls every CRM page and
//! upserts clientes matched by `external_id`, then by e-mail.

use gestor_core::validation::{self, somente_digitos};
use gestor_crm::{CrmContato, CrmError, CrmProvider, CrmRegistro};
use gestor_db::entities::{clientes, fornecedores};
use gestor_db::repositories::{
    Ator, AuditoriaRepository, ClienteRepository, CreateClienteInput, Evento,
    FornecedorRepository, UpdateClienteInput,
};
use gestor_db::RepositoryError;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ApiError;

/// Counters returned by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResumoImportacao {
    /// Clientes created from CRM contacts.
    pub criados: u32,
    /// Existing clientes refreshed from the CRM.
    pub atualizados: u32,
    /// Contacts skipped (no name, no usable document, or rejected data).
    pub ignorados: u32,
}

/// Contact payload for a cliente.
#[must_use]
pub fn contato_de_cliente(cliente: &clientes::Model) -> CrmContato {
    CrmContato {
        nome: cliente.nome.clone(),
        email: cliente.email.clone(),
        telefone: cliente.telefone.clone(),
        documento: Some(cliente.documento.clone()),
        empresa: (cliente.tipo_pessoa == "J").then(|| cliente.nome.clone()),
    }
}

/// Contact payload for a fornecedor.
#[must_use]
pub fn contato_de_fornecedor(fornecedor: &fornecedores::Model) -> CrmContato {
    CrmContato {
        nome: fornecedor
            .nome_fantasia
            .clone()
            .unwrap_or_else(|| fornecedor.razao_social.clone()),
        email: fornecedor.email.clone(),
        telefone: fornecedor.telefone.clone(),
        documento: Some(fornecedor.cnpj.clone()),
        empresa: Some(fornecedor.razao_social.clone()),
    }
}

/// Creates the contact, or recreates it when the stored id no longer exists.
async fn enviar(
    provider: &dyn CrmProvider,
    external_id: Option<&str>,
    contato: &CrmContato,
) -> Result<String, CrmError> {
    let Some(external_id) = external_id else {
        return provider.criar(contato).await;
    };
    match provider.atualizar(external_id, contato).await {
        Ok(()) => Ok(external_id.to_string()),
        Err(CrmError::NaoEncontrado(_)) => {
            warn!(external_id, "CRM contact vanished, creating it again");
            provider.criar(contato).await
        }
        Err(e) => Err(e),
    }
}

/// Pushes a cliente to the CRM and stores the returned id.
pub async fn sincronizar_cliente(
    provider: &dyn CrmProvider,
    repo: &ClienteRepository,
    ator: &Ator,
    id: Uuid,
) -> Result<clientes::Model, ApiError> {
    let cliente = repo.find(id, false).await?;
    let external_id = enviar(
        provider,
        cliente.external_id.as_deref(),
        &contato_de_cliente(&cliente),
    )
    .await?;
    let cliente = repo.vincular_crm(ator, id, Some(external_id)).await?;
    info!(cliente_id = %id, provider = provider.nome(), "cliente synchronized");
    Ok(cliente)
}

/// Pushes a fornecedor to the CRM and stores the returned id.
pub async fn sincronizar_fornecedor(
    provider: &dyn CrmProvider,
    repo: &FornecedorRepository,
    ator: &Ator,
    id: Uuid,
) -> Result<fornecedores::Model, ApiError> {
    let fornecedor = repo.find(id, false).await?;
    let external_id = enviar(
        provider,
        fornecedor.external_id.as_deref(),
        &contato_de_fornecedor(&fornecedor),
    )
    .await?;
    let fornecedor = repo.vincular_crm(ator, id, Some(external_id)).await?;
    info!(fornecedor_id = %id, provider = provider.nome(), "fornecedor synchronized");
    Ok(fornecedor)
}

/// Deletes the CRM contact of a cliente and clears its `external_id`.
pub async fn desvincular_cliente(
    provider: &dyn CrmProvider,
    repo: &ClienteRepository,
    ator: &Ator,
    id: Uuid,
) -> Result<clientes::Model, ApiError> {
    let cliente = repo.find(id, false).await?;
    let Some(external_id) = cliente.external_id.as_deref() else {
        return Err(RepositoryError::InvalidState("cliente nao esta vinculado ao CRM".into()).into());
    };
    match provider.remover(external_id).await {
        Ok(()) | Err(CrmError::NaoEncontrado(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(repo.vincular_crm(ator, id, None).await?)
}

/// Person type implied by a document's length.
fn tipo_pessoa(documento: &str) -> Option<&'static str> {
    if validation::cpf_valido(documento) {
        Some("F")
    } else if validation::cnpj_valido(documento) {
        Some("J")
    } else {
        None
    }
}

enum Resultado {
    Criado,
    Atualizado,
    Ignorado,
}

async fn importar_registro(
    repo: &ClienteRepository,
    ator: &Ator,
    registro: CrmRegistro,
) -> Result<Resultado, RepositoryError> {
    let contato = registro.contato;
    let nome = contato.nome.trim().to_string();
    if nome.is_empty() {
        return Ok(Resultado::Ignorado);
    }

    let existente = match repo.find_by_external_id(&registro.external_id).await? {
        Some(cliente) => Some(cliente),
        None => match contato.email.as_deref() {
            Some(email) => repo.find_by_email(email).await?,
            None => None,
        },
    };

    if let Some(cliente) = existente {
        repo.update(
            ator,
            cliente.id,
            UpdateClienteInput {
                nome: Some(nome),
                email: contato.email.map(Some),
                telefone: contato.telefone.map(Some),
                external_id: Some(Some(registro.external_id)),
                ..Default::default()
            },
        )
        .await?;
        return Ok(Resultado::Atualizado);
    }

    let documento = contato.documento.as_deref().map(somente_digitos).unwrap_or_default();
    let Some(tipo) = tipo_pessoa(&documento) else {
        return Ok(Resultado::Ignorado);
    };
    repo.create(
        ator,
        CreateClienteInput {
            nome,
            tipo_pessoa: tipo.to_string(),
            documento,
            email: contato.email,
            telefone: contato.telefone,
            cidade_id: None,
            endereco: None,
            cep: None,
            ativo: true,
            external_id: Some(registro.external_id),
        },
    )
    .await?;
    Ok(Resultado::Criado)
}

/// Pulls every CRM page and upserts local clientes.
///
/// Contacts whose data the local rules reject are counted as ignored; database and
/// CRM failures abort the import.
pub async fn importar_clientes(
    provider: &dyn CrmProvider,
    repo: &ClienteRepository,
    auditoria: &AuditoriaRepository,
    ator: &Ator,
) -> Result<ResumoImportacao, ApiError> {
    let mut resumo = ResumoImportacao::default();
    let mut cursor: Option<String> = None;

    loop {
        let pagina = provider.listar(cursor.as_deref()).await?;
        for registro in pagina.itens {
            let external_id = registro.external_id.clone();
            match importar_registro(repo, ator, registro).await {
                Ok(Resultado::Criado) => resumo.criados += 1,
                Ok(Resultado::Atualizado) => resumo.atualizados += 1,
                Ok(Resultado::Ignorado) => resumo.ignorados += 1,
                Err(RepositoryError::Database(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(%external_id, error = %e, "CRM contact skipped");
                    resumo.ignorados += 1;
                }
            }
        }
        match pagina.proximo_cursor {
            Some(proximo) if cursor.as_deref() != Some(proximo.as_str()) => cursor = Some(proximo),
            _ => break,
        }
    }

    auditoria
        .registrar(ator, Evento::sem_registro("importar", "clientes").depois(&resumo))
        .await?;
    info!(
        provider = provider.nome(),
        criados = resumo.criados,
        atualizados = resumo.atualizados,
        ignorados = resumo.ignorados,
        "CRM import finished"
    );
    Ok(resumo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_decides_person_type() {
        assert_eq!(tipo_pessoa("52998224725"), Some("F"));
        assert_eq!(tipo_pessoa("11222333000181"), Some("J"));
        assert_eq!(tipo_pessoa("123"), None);
        assert_eq!(tipo_pessoa(""), None);
    }
}
