//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every write runs in a transaction together with its audit row.

pub mod auditoria;
pub mod centro_custo;
pub mod cidade;
pub mod cliente;
pub mod colaborador;
pub mod common;
pub mod conta_bancaria;
pub mod csrf;
pub mod forma_pagamento;
pub mod fornecedor;
pub mod frota;
pub mod grupo_produto;
pub mod loja;
pub mod pagamento;
pub mod produto;
pub mod rate_limit;
pub mod rbac;
pub mod recebimento;
pub mod servico;
pub mod session;
pub mod titulos;
pub mod tokens;
pub mod transportadora;
pub mod venda;

pub use auditoria::{AuditoriaFilter, AuditoriaRepository, Evento};
pub use centro_custo::{
    CentroCustoFilter, CentroCustoRepository, CreateCentroCustoInput, UpdateCentroCustoInput,
};
pub use cidade::{CidadeFilter, CidadeRepository};
pub use cliente::{ClienteFilter, ClienteRepository, CreateClienteInput, UpdateClienteInput};
pub use colaborador::{
    ColaboradorFilter, ColaboradorRepository, CreateColaboradorInput, UpdateColaboradorInput,
};
pub use common::{Ator, RepositoryError};
pub use conta_bancaria::{
    ContaBancariaFilter, ContaBancariaRepository, CreateContaBancariaInput,
    UpdateContaBancariaInput,
};
pub use csrf::CsrfRepository;
pub use forma_pagamento::{
    CreateFormaPagamentoInput, FormaPagamentoFilter, FormaPagamentoRepository,
    UpdateFormaPagamentoInput,
};
pub use fornecedor::{
    CreateFornecedorInput, FornecedorFilter, FornecedorRepository, UpdateFornecedorInput,
};
pub use frota::{
    AbastecimentoFilter, CreateAbastecimentoInput, CreateVeiculoInput, FrotaRepository,
    LinhaRelatorioFrota, UpdateVeiculoInput, VeiculoFilter,
};
pub use grupo_produto::{
    CreateGrupoProdutoInput, GrupoProdutoFilter, GrupoProdutoRepository, UpdateGrupoProdutoInput,
};
pub use loja::{LojaInput, LojaRepository};
pub use pagamento::{
    CreatePagamentoInput, PagamentoFilter, PagamentoRepository, PagamentoView,
    UpdatePagamentoInput,
};
pub use produto::{CreateProdutoInput, ProdutoFilter, ProdutoRepository, UpdateProdutoInput};
pub use rate_limit::RateLimitRepository;
pub use rbac::{
    CreateNivelInput, CreateRoleInput, RbacRepository, RoleDetalhe, RoleFilter, UpdateNivelInput,
    UpdateRoleInput,
};
pub use recebimento::{
    CreateRecebimentoInput, RecebimentoFilter, RecebimentoRepository, RecebimentoView,
    UpdateRecebimentoInput,
};
pub use servico::{CreateServicoInput, ServicoFilter, ServicoRepository, UpdateServicoInput};
pub use session::{SessionMeta, SessionRepository};
pub use titulos::{BaixaInput, ComSituacao};
pub use transportadora::{
    ContatoInput, CreateTransportadoraInput, EnderecoInput, TransportadoraDetalhe,
    TransportadoraFilter, TransportadoraRepository, UpdateTransportadoraInput,
};
pub use venda::{CreateVendaInput, UpdateVendaInput, VendaDetalhe, VendaFilter, VendaRepository};
