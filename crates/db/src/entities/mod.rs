//! `SeaORM` entities, one module per table.

pub mod abastecimentos;
pub mod centros_custo;
pub mod cidades;
pub mod clientes;
pub mod colaboradores;
pub mod contas_bancarias;
pub mod csrf_tokens;
pub mod formas_pagamento;
pub mod fornecedores;
pub mod grupos_produtos;
pub mod loja_informacoes;
pub mod niveis;
pub mod pagamentos;
pub mod permissoes;
pub mod produtos;
pub mod rate_limits;
pub mod recebimentos;
pub mod registros_auditoria;
pub mod role_permissoes;
pub mod roles;
pub mod servicos;
pub mod sessoes;
pub mod transportadora_contatos;
pub mod transportadora_enderecos;
pub mod transportadoras;
pub mod veiculos;
pub mod venda_itens;
pub mod vendas;

use sea_orm::EntityTrait;

/// Tables whose rows are soft deleted through `deletado_em`.
pub trait SoftDelete: EntityTrait {
    /// Name used in audit rows and error messages.
    const ENTIDADE: &'static str;

    /// Primary key column.
    fn coluna_id() -> Self::Column;

    /// Deletion timestamp column.
    fn coluna_deletado_em() -> Self::Column;

    /// Last update timestamp column.
    fn coluna_atualizado_em() -> Self::Column;
}
