//! Master data: cities, store information, customers, suppliers, carriers,
//! products, services, cost centers, bank accounts, payment methods and fleet.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LOCALIDADES_SQL).await?;
        db.execute_unprepared(PARCEIROS_SQL).await?;
        db.execute_unprepared(TRANSPORTADORAS_SQL).await?;
        db.execute_unprepared(CATALOGO_SQL).await?;
        db.execute_unprepared(FINANCEIRO_SQL).await?;
        db.execute_unprepared(FROTA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS abastecimentos CASCADE;
DROP TABLE IF EXISTS veiculos CASCADE;
DROP TABLE IF EXISTS formas_pagamento CASCADE;
DROP TABLE IF EXISTS contas_bancarias CASCADE;
DROP TABLE IF EXISTS centros_custo CASCADE;
DROP TABLE IF EXISTS produtos CASCADE;
DROP TABLE IF EXISTS grupos_produtos CASCADE;
DROP TABLE IF EXISTS servicos CASCADE;
DROP TABLE IF EXISTS transportadora_enderecos CASCADE;
DROP TABLE IF EXISTS transportadora_contatos CASCADE;
DROP TABLE IF EXISTS transportadoras CASCADE;
DROP TABLE IF EXISTS fornecedores CASCADE;
DROP TABLE IF EXISTS clientes CASCADE;
DROP TABLE IF EXISTS loja_informacoes CASCADE;
DROP TABLE IF EXISTS cidades CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const LOCALIDADES_SQL: &str = r"
CREATE TABLE cidades (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(120) NOT NULL,
    uf CHAR(2) NOT NULL,
    codigo_ibge VARCHAR(7) NOT NULL UNIQUE,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_cidades_uf_nome ON cidades(uf, nome);

CREATE TABLE loja_informacoes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    razao_social VARCHAR(150) NOT NULL,
    nome_fantasia VARCHAR(150),
    cnpj VARCHAR(14) NOT NULL,
    inscricao_estadual VARCHAR(20),
    email VARCHAR(254),
    telefone VARCHAR(20),
    endereco TEXT,
    cidade_id UUID REFERENCES cidades(id),
    cep VARCHAR(8),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PARCEIROS_SQL: &str = r"
CREATE TABLE clientes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(150) NOT NULL,
    tipo_pessoa CHAR(1) NOT NULL CHECK (tipo_pessoa IN ('F', 'J')),
    documento VARCHAR(14) NOT NULL UNIQUE,
    email VARCHAR(254) UNIQUE,
    telefone VARCHAR(20),
    cidade_id UUID REFERENCES cidades(id),
    endereco TEXT,
    cep VARCHAR(8),
    ativo BOOLEAN NOT NULL DEFAULT true,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE INDEX idx_clientes_nome ON clientes(nome) WHERE deletado_em IS NULL;
CREATE INDEX idx_clientes_external ON clientes(external_id) WHERE external_id IS NOT NULL;

CREATE TABLE fornecedores (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    razao_social VARCHAR(150) NOT NULL,
    nome_fantasia VARCHAR(150),
    cnpj VARCHAR(14) NOT NULL UNIQUE,
    email VARCHAR(254),
    telefone VARCHAR(20),
    cidade_id UUID REFERENCES cidades(id),
    endereco TEXT,
    ativo BOOLEAN NOT NULL DEFAULT true,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);
";

const TRANSPORTADORAS_SQL: &str = r"
CREATE TABLE transportadoras (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    razao_social VARCHAR(150) NOT NULL,
    nome_fantasia VARCHAR(150),
    cnpj VARCHAR(14) NOT NULL UNIQUE,
    inscricao_estadual VARCHAR(20),
    rntrc VARCHAR(20),
    ativo BOOLEAN NOT NULL DEFAULT true,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE TABLE transportadora_contatos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transportadora_id UUID NOT NULL REFERENCES transportadoras(id) ON DELETE CASCADE,
    nome VARCHAR(150) NOT NULL,
    email VARCHAR(254),
    telefone VARCHAR(20),
    cargo VARCHAR(80),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE transportadora_enderecos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transportadora_id UUID NOT NULL REFERENCES transportadoras(id) ON DELETE CASCADE,
    logradouro VARCHAR(200) NOT NULL,
    numero VARCHAR(20),
    complemento VARCHAR(100),
    bairro VARCHAR(100),
    cidade_id UUID REFERENCES cidades(id),
    cep VARCHAR(8),
    principal BOOLEAN NOT NULL DEFAULT false,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transp_contatos ON transportadora_contatos(transportadora_id);
CREATE INDEX idx_transp_enderecos ON transportadora_enderecos(transportadora_id);
";

const CATALOGO_SQL: &str = r"
CREATE TABLE servicos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(150) NOT NULL UNIQUE,
    descricao TEXT,
    preco NUMERIC(15, 2) NOT NULL CHECK (preco >= 0),
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE TABLE grupos_produtos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(100) NOT NULL UNIQUE,
    descricao TEXT,
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE TABLE produtos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    codigo VARCHAR(60) NOT NULL UNIQUE,
    nome VARCHAR(150) NOT NULL,
    grupo_id UUID REFERENCES grupos_produtos(id),
    unidade VARCHAR(6) NOT NULL DEFAULT 'UN',
    preco_custo NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (preco_custo >= 0),
    preco_venda NUMERIC(15, 2) NOT NULL CHECK (preco_venda >= 0),
    estoque NUMERIC(15, 3) NOT NULL DEFAULT 0,
    ativo BOOLEAN NOT NULL DEFAULT true,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE INDEX idx_produtos_grupo ON produtos(grupo_id) WHERE deletado_em IS NULL;
";

const FINANCEIRO_SQL: &str = r"
CREATE TABLE centros_custo (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    codigo VARCHAR(30) NOT NULL UNIQUE,
    nome VARCHAR(120) NOT NULL,
    descricao TEXT,
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE TABLE contas_bancarias (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    banco_codigo VARCHAR(3) NOT NULL,
    banco_nome VARCHAR(100) NOT NULL,
    agencia VARCHAR(10) NOT NULL,
    conta VARCHAR(20) NOT NULL,
    digito VARCHAR(2),
    tipo VARCHAR(10) NOT NULL CHECK (tipo IN ('corrente', 'poupanca')),
    titular VARCHAR(150) NOT NULL,
    saldo_inicial NUMERIC(15, 2) NOT NULL DEFAULT 0,
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ,
    CONSTRAINT uq_contas_bancarias UNIQUE (banco_codigo, agencia, conta)
);

CREATE TABLE formas_pagamento (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(80) NOT NULL UNIQUE,
    tipo VARCHAR(20) NOT NULL CHECK (tipo IN (
        'dinheiro', 'pix', 'cartao_credito', 'cartao_debito', 'boleto', 'transferencia'
    )),
    max_parcelas INTEGER NOT NULL DEFAULT 1 CHECK (max_parcelas >= 1),
    taxa_percentual NUMERIC(5, 2) NOT NULL DEFAULT 0 CHECK (taxa_percentual >= 0),
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);
";

const FROTA_SQL: &str = r"
CREATE TABLE veiculos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    placa VARCHAR(7) NOT NULL UNIQUE,
    modelo VARCHAR(100) NOT NULL,
    ano INTEGER,
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE TABLE abastecimentos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    veiculo_id UUID NOT NULL REFERENCES veiculos(id),
    colaborador_id UUID REFERENCES colaboradores(id),
    data DATE NOT NULL,
    odometro NUMERIC(12, 1) NOT NULL CHECK (odometro >= 0),
    litros NUMERIC(15, 3) NOT NULL CHECK (litros > 0),
    valor_total NUMERIC(15, 2) NOT NULL CHECK (valor_total >= 0),
    combustivel VARCHAR(20) NOT NULL,
    posto VARCHAR(150),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE INDEX idx_abastecimentos_veiculo ON abastecimentos(veiculo_id, data) WHERE deletado_em IS NULL;
";
