//! Access control: levels, roles, permissions, colaboradores, sessions, CSRF
//! tokens, rate-limit attempts and the audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(RBAC_SQL).await?;
        db.execute_unprepared(COLABORADORES_SQL).await?;
        db.execute_unprepared(SEGURANCA_SQL).await?;
        db.execute_unprepared(AUDITORIA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS registros_auditoria CASCADE;
DROP TABLE IF EXISTS rate_limits CASCADE;
DROP TABLE IF EXISTS csrf_tokens CASCADE;
DROP TABLE IF EXISTS sessoes CASCADE;
DROP TABLE IF EXISTS colaboradores CASCADE;
DROP TABLE IF EXISTS role_permissoes CASCADE;
DROP TABLE IF EXISTS permissoes CASCADE;
DROP TABLE IF EXISTS roles CASCADE;
DROP TABLE IF EXISTS niveis CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const RBAC_SQL: &str = r"
CREATE TABLE niveis (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(60) NOT NULL UNIQUE,
    grau INTEGER NOT NULL UNIQUE CHECK (grau >= 0),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE roles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(80) NOT NULL UNIQUE,
    descricao TEXT,
    nivel_id UUID NOT NULL REFERENCES niveis(id),
    super_admin BOOLEAN NOT NULL DEFAULT false,
    ativo BOOLEAN NOT NULL DEFAULT true,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE INDEX idx_roles_nivel ON roles(nivel_id);

CREATE TABLE permissoes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    codigo VARCHAR(100) NOT NULL UNIQUE,
    modulo VARCHAR(60) NOT NULL,
    descricao TEXT NOT NULL
);

CREATE TABLE role_permissoes (
    role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permissao_id UUID NOT NULL REFERENCES permissoes(id) ON DELETE CASCADE,
    PRIMARY KEY (role_id, permissao_id)
);
";

const COLABORADORES_SQL: &str = r"
CREATE TABLE colaboradores (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    nome VARCHAR(150) NOT NULL,
    email VARCHAR(254) NOT NULL UNIQUE,
    cpf VARCHAR(11) NOT NULL UNIQUE,
    telefone VARCHAR(20),
    cargo VARCHAR(80),
    senha_hash TEXT NOT NULL,
    role_id UUID NOT NULL REFERENCES roles(id),
    ativo BOOLEAN NOT NULL DEFAULT true,
    ultimo_login_em TIMESTAMPTZ,
    external_id VARCHAR(100),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    deletado_em TIMESTAMPTZ
);

CREATE INDEX idx_colaboradores_role ON colaboradores(role_id) WHERE deletado_em IS NULL;
";

const SEGURANCA_SQL: &str = r"
CREATE TABLE sessoes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    colaborador_id UUID NOT NULL REFERENCES colaboradores(id) ON DELETE CASCADE,
    refresh_token_hash VARCHAR(64) NOT NULL UNIQUE,
    user_agent TEXT,
    ip VARCHAR(45),
    expira_em TIMESTAMPTZ NOT NULL,
    revogada_em TIMESTAMPTZ,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    atualizado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sessoes_colaborador ON sessoes(colaborador_id) WHERE revogada_em IS NULL;

CREATE TABLE csrf_tokens (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    colaborador_id UUID NOT NULL REFERENCES colaboradores(id) ON DELETE CASCADE,
    token_hash VARCHAR(64) NOT NULL UNIQUE,
    expira_em TIMESTAMPTZ NOT NULL,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_csrf_tokens_colaborador ON csrf_tokens(colaborador_id, expira_em);

CREATE TABLE rate_limits (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    identificador VARCHAR(320) NOT NULL,
    acao VARCHAR(40) NOT NULL,
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now(),
    bloqueado_ate TIMESTAMPTZ
);

CREATE INDEX idx_rate_limits_lookup ON rate_limits(identificador, acao, criado_em DESC);
";

const AUDITORIA_SQL: &str = r"
CREATE TABLE registros_auditoria (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    colaborador_id UUID REFERENCES colaboradores(id) ON DELETE SET NULL,
    acao VARCHAR(40) NOT NULL,
    entidade VARCHAR(60) NOT NULL,
    entidade_id UUID,
    dados_anteriores JSONB,
    dados_novos JSONB,
    ip VARCHAR(45),
    criado_em TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_auditoria_entidade ON registros_auditoria(entidade, entidade_id, criado_em DESC);
CREATE INDEX idx_auditoria_colaborador ON registros_auditoria(colaborador_id, criado_em DESC);
";
