//! Permission catalog and level (nivel) hierarchy.
//!
//! Permission codes are `<modulo>.<acao>`. Every module gets the four CRUD actions;
//! a few operations have their own code.

use serde::Serialize;

/// CRUD action part of a permission code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Acao {
    /// Read access (list/get).
    Visualizar,
    /// Create.
    Criar,
    /// Update and restore.
    Editar,
    /// Soft delete.
    Excluir,
}

impl Acao {
    /// All CRUD actions.
    pub const TODAS: [Self; 4] = [Self::Visualizar, Self::Criar, Self::Editar, Self::Excluir];

    /// Code suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visualizar => "visualizar",
            Self::Criar => "criar",
            Self::Editar => "editar",
            Self::Excluir => "excluir",
        }
    }
}

/// Module names, used as the prefix of permission codes.
pub mod modulos {
    #![allow(missing_docs)]
    pub const ABASTECIMENTOS: &str = "abastecimentos";
    pub const AUDITORIA: &str = "auditoria";
    pub const CENTROS_CUSTO: &str = "centros_custo";
    pub const CIDADES: &str = "cidades";
    pub const CLIENTES: &str = "clientes";
    pub const COLABORADORES: &str = "colaboradores";
    pub const CONTAS_BANCARIAS: &str = "contas_bancarias";
    pub const CRM: &str = "crm";
    pub const FORMAS_PAGAMENTO: &str = "formas_pagamento";
    pub const FORNECEDORES: &str = "fornecedores";
    pub const GRUPOS_PRODUTOS: &str = "grupos_produtos";
    pub const LOJA: &str = "loja";
    pub const NIVEIS: &str = "niveis";
    pub const PAGAMENTOS: &str = "pagamentos";
    pub const PRODUTOS: &str = "produtos";
    pub const RECEBIMENTOS: &str = "recebimentos";
    pub const RELATORIOS: &str = "relatorios";
    pub const ROLES: &str = "roles";
    pub const SERVICOS: &str = "servicos";
    pub const TRANSPORTADORAS: &str = "transportadoras";
    pub const VEICULOS: &str = "veiculos";
    pub const VENDAS: &str = "vendas";
}

/// Modules that get the four CRUD permissions.
pub const MODULOS_CRUD: [&str; 19] = [
    modulos::ABASTECIMENTOS,
    modulos::CENTROS_CUSTO,
    modulos::CIDADES,
    modulos::CLIENTES,
    modulos::COLABORADORES,
    modulos::CONTAS_BANCARIAS,
    modulos::FORMAS_PAGAMENTO,
    modulos::FORNECEDORES,
    modulos::GRUPOS_PRODUTOS,
    modulos::LOJA,
    modulos::NIVEIS,
    modulos::PAGAMENTOS,
    modulos::PRODUTOS,
    modulos::RECEBIMENTOS,
    modulos::ROLES,
    modulos::SERVICOS,
    modulos::TRANSPORTADORAS,
    modulos::VEICULOS,
    modulos::VENDAS,
];

/// Operation-specific permissions: `(codigo, modulo, descricao)`.
pub const ESPECIAIS: [(&str, &str, &str); 8] = [
    ("vendas.cancelar", modulos::VENDAS, "Cancelar vendas"),
    ("vendas.concluir", modulos::VENDAS, "Concluir vendas"),
    ("pagamentos.baixar", modulos::PAGAMENTOS, "Baixar e estornar pagamentos"),
    ("recebimentos.baixar", modulos::RECEBIMENTOS, "Baixar e estornar recebimentos"),
    ("crm.sincronizar", modulos::CRM, "Sincronizar cadastros com o CRM"),
    ("relatorios.frota", modulos::RELATORIOS, "Relatorio de combustivel da frota"),
    ("auditoria.visualizar", modulos::AUDITORIA, "Consultar trilha de auditoria"),
    ("colaboradores.redefinir_senha", modulos::COLABORADORES, "Redefinir senha de colaboradores"),
];

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissaoDef {
    /// Unique code.
    pub codigo: String,
    /// Module the permission belongs to.
    pub modulo: String,
    /// Human readable description.
    pub descricao: String,
}

/// Builds `<modulo>.<acao>`.
#[must_use]
pub fn codigo(modulo: &str, acao: Acao) -> String {
    format!("{modulo}.{}", acao.as_str())
}

/// Every permission the system knows about.
#[must_use]
pub fn catalogo() -> Vec<PermissaoDef> {
    let mut itens: Vec<PermissaoDef> = MODULOS_CRUD
        .iter()
        .flat_map(|modulo| {
            Acao::TODAS.iter().map(move |acao| PermissaoDef {
                codigo: codigo(modulo, *acao),
                modulo: (*modulo).to_string(),
                descricao: format!("{} {}", acao.as_str(), modulo.replace('_', " ")),
            })
        })
        .collect();

    itens.extend(ESPECIAIS.iter().map(|(codigo, modulo, descricao)| PermissaoDef {
        codigo: (*codigo).to_string(),
        modulo: (*modulo).to_string(),
        descricao: (*descricao).to_string(),
    }));
    itens
}

/// Returns true when `codigo` exists in the catalog.
#[must_use]
pub fn existe(codigo: &str) -> bool {
    catalogo().iter().any(|p| p.codigo == codigo)
}

/// A colaborador may only manage roles/colaboradores whose level degree is not
/// greater than their own.
#[must_use]
pub const fn pode_gerenciar(grau_ator: i32, grau_alvo: i32) -> bool {
    grau_alvo <= grau_ator
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_codes_are_unique() {
        let itens = catalogo();
        let codigos: HashSet<_> = itens.iter().map(|p| p.codigo.as_str()).collect();
        assert_eq!(codigos.len(), itens.len());
        assert_eq!(itens.len(), MODULOS_CRUD.len() * 4 + ESPECIAIS.len());
    }

    #[test]
    fn test_codigo_format() {
        assert_eq!(codigo(modulos::CLIENTES, Acao::Criar), "clientes.criar");
        assert_eq!(
            codigo(modulos::CONTAS_BANCARIAS, Acao::Excluir),
            "contas_bancarias.excluir"
        );
        assert!(existe("vendas.cancelar"));
        assert!(existe("produtos.visualizar"));
        assert!(!existe("produtos.voar"));
    }

    #[test]
    fn test_level_hierarchy() {
        assert!(pode_gerenciar(100, 100));
        assert!(pode_gerenciar(100, 10));
        assert!(!pode_gerenciar(10, 50));
    }
}
