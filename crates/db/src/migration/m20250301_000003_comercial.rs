//! Sales, payables and receivables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(VENDAS_SQL).await?;
        db.execute_unprepared(PAGAMENTOS_SQL).await?;
        db.execute_unprepared(RECEBIMENTOS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS recebimentos CASCADE;
DROP TABLE IF EXISTS pagamentos CASCADE;
DROP TABLE IF EXISTS venda_itens CASCADE;
DROP TABLE IF EXISTS vendas CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const VENDAS_SQL: &str = r"
CREATE TABLE vendas (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    numero BIGINT NOT NULL UNIQUE,
    cliente_id UUID NOT NULL REFERENCES clientes(id),
    colaborador_id UUID NOT NULL REFERENCES colaboradores(id),
    forma_pagamento_id UUID NOT NULL REFERENCES formas_pagamento(id),
    data_venda DATE NOT NULL,
    subtotal NUMERIC(15, 2) NOT NULL,
    desconto NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total NUMERIC(15, 2) NOT NULL,
    parcelas INTEGER NOT NULL DEFAULT 1 CHECK (parcelas >= 1),
    status VARCHAR(12) NOT NULL DEFAULT 'aberta'
        CHECK (status IN ('aberta', 'concluida', 'cancelada')),
    observacoes TEXT,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ,
    CONSTRAINT chk_vendas_total CHECK (total = subtotal - desconto AND total >= 0)
);

CREATE INDEX idx_vendas_cliente ON vendas(cliente_id, data_venda DESC);

CREATE TABLE venda_itens (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    venda_id UUID NOT NULL REFERENCES vendas(id) ON DELETE CASCADE,
    produto_id UUID REFERENCES produtos(id),
    servico_id UUID REFERENCES servicos(id),
    descricao VARCHAR(255) NOT NULL,
    quantidade NUMERIC(15, 3) NOT NULL CHECK (quantidade > 0),
    preco_unitario NUMERIC(15, 2) NOT NULL CHECK (preco_unitario >= 0),
    desconto NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (desconto >= 0),
    total NUMERIC(15, 2) NOT NULL,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_item_origem CHECK (produto_id IS NULL OR servico_id IS NULL)
);

CREATE INDEX idx_venda_itens_venda ON venda_itens(venda_id);
";

const PAGAMENTOS_SQL: &str = r"
CREATE TABLE pagamentos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    descricao VARCHAR(255) NOT NULL,
    fornecedor_id UUID REFERENCES fornecedores(id),
    centro_custo_id UUID REFERENCES centros_custo(id),
    conta_bancaria_id UUID REFERENCES contas_bancarias(id),
    forma_pagamento_id UUID REFERENCES formas_pagamento(id),
    documento VARCHAR(60),
    valor NUMERIC(15, 2) NOT NULL CHECK (valor > 0),
    valor_pago NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (valor_pago >= 0),
    data_vencimento DATE NOT NULL,
    data_pagamento DATE,
    status VARCHAR(10) NOT NULL DEFAULT 'pendente'
        CHECK (status IN ('pendente', 'parcial', 'pago', 'cancelado')),
    observacoes TEXT,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ,
    CONSTRAINT chk_pagamentos_saldo CHECK (valor_pago <= valor)
);

CREATE INDEX idx_pagamentos_vencimento ON pagamentos(status, data_vencimento) WHERE deletado_em IS NULL;
";

const RECEBIMENTOS_SQL: &str = r"
CREATE TABLE recebimentos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    descricao VARCHAR(255) NOT NULL,
    cliente_id UUID REFERENCES clientes(id),
    venda_id UUID REFERENCES vendas(id),
    parcela INTEGER NOT NULL DEFAULT 1,
    total_parcelas INTEGER NOT NULL DEFAULT 1,
    centro_custo_id UUID REFERENCES centros_custo(id),
    conta_bancaria_id UUID REFERENCES contas_bancarias(id),
    forma_pagamento_id UUID REFERENCES formas_pagamento(id),
    valor NUMERIC(15, 2) NOT NULL CHECK (valor >= 0),
    valor_recebido NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (valor_recebido >= 0),
    data_vencimento DATE NOT NULL,
    data_recebimento DATE,
    status VARCHAR(10) NOT NULL DEFAULT 'pendente'
        CHECK (status IN ('pendente', 'parcial', 'recebido', 'cancelado')),
    observacoes TEXT,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ,
    CONSTRAINT uq_recebimentos_parcela UNIQUE (venda_id, parcela),
    CONSTRAINT chk_recebimentos_saldo CHECK (valor_recebido <= valor)
);

CREATE INDEX idx_recebimentos_vencimento ON recebimentos(status, data_vencimento) WHERE deletado_em IS NULL;
";
