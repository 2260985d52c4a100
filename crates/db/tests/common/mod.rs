//! Shared fixtures for repository tests.
//!
//! Tests run against an in-memory SQLite database whose tables are generated from
//! the entities, so no server is needed.

#![allow(dead_code)]

use gestor_db::entities::{
    abastecimentos, centros_custo, cidades, clientes, colaboradores, contas_bancarias,
    csrf_tokens, formas_pagamento, fornecedores, grupos_produtos, loja_informacoes, niveis,
    pagamentos, permissoes, produtos, rate_limits, recebimentos, registros_auditoria,
    role_permissoes, roles, servicos, sessoes, transportadora_contatos,
    transportadora_enderecos, transportadoras, veiculos, venda_itens, vendas,
};
use gestor_db::repositories::{
    Ator, ClienteRepository, ColaboradorRepository, CreateClienteInput, CreateColaboradorInput,
    CreateFormaPagamentoInput, CreateNivelInput, CreateRoleInput, FormaPagamentoRepository,
    RbacRepository,
};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use uuid::Uuid;

async fn criar_tabela<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) {
    let backend = db.get_database_backend();
    db.execute(backend.build(&schema.create_table_from_entity(entity)))
        .await
        .expect("create table");
}

/// Fresh database with every table.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    let schema = Schema::new(db.get_database_backend());

    criar_tabela(&db, &schema, niveis::Entity).await;
    criar_tabela(&db, &schema, roles::Entity).await;
    criar_tabela(&db, &schema, permissoes::Entity).await;
    criar_tabela(&db, &schema, role_permissoes::Entity).await;
    criar_tabela(&db, &schema, colaboradores::Entity).await;
    criar_tabela(&db, &schema, sessoes::Entity).await;
    criar_tabela(&db, &schema, csrf_tokens::Entity).await;
    criar_tabela(&db, &schema, rate_limits::Entity).await;
    criar_tabela(&db, &schema, registros_auditoria::Entity).await;
    criar_tabela(&db, &schema, cidades::Entity).await;
    criar_tabela(&db, &schema, clientes::Entity).await;
    criar_tabela(&db, &schema, fornecedores::Entity).await;
    criar_tabela(&db, &schema, transportadoras::Entity).await;
    criar_tabela(&db, &schema, transportadora_contatos::Entity).await;
    criar_tabela(&db, &schema, transportadora_enderecos::Entity).await;
    criar_tabela(&db, &schema, grupos_produtos::Entity).await;
    criar_tabela(&db, &schema, produtos::Entity).await;
    criar_tabela(&db, &schema, servicos::Entity).await;
    criar_tabela(&db, &schema, centros_custo::Entity).await;
    criar_tabela(&db, &schema, contas_bancarias::Entity).await;
    criar_tabela(&db, &schema, formas_pagamento::Entity).await;
    criar_tabela(&db, &schema, loja_informacoes::Entity).await;
    criar_tabela(&db, &schema, vendas::Entity).await;
    criar_tabela(&db, &schema, venda_itens::Entity).await;
    criar_tabela(&db, &schema, pagamentos::Entity).await;
    criar_tabela(&db, &schema, recebimentos::Entity).await;
    criar_tabela(&db, &schema, veiculos::Entity).await;
    criar_tabela(&db, &schema, abastecimentos::Entity).await;
    db
}

/// Ids created by [`seed_base`].
pub struct Base {
    pub nivel_id: Uuid,
    pub role_id: Uuid,
    pub colaborador_id: Uuid,
    pub cliente_id: Uuid,
    pub forma_pagamento_id: Uuid,
}

impl Base {
    pub fn ator(&self) -> Ator {
        Ator::new(self.colaborador_id, Some("127.0.0.1".to_string()))
    }
}

/// A level, a role, one colaborador, one customer and a payment method that
/// allows up to 12 installments.
pub async fn seed_base(db: &DatabaseConnection) -> Base {
    let sistema = Ator::sistema();
    let rbac = RbacRepository::new(db.clone());
    let nivel = rbac
        .create_nivel(
            &sistema,
            CreateNivelInput {
                nome: "Gerencia".to_string(),
                grau: 50,
            },
        )
        .await
        .expect("nivel");
    let role = rbac
        .create_role(
            &sistema,
            CreateRoleInput {
                nome: "Vendedor".to_string(),
                descricao: None,
                nivel_id: nivel.id,
                super_admin: false,
                ativo: true,
            },
        )
        .await
        .expect("role");
    let colaborador = ColaboradorRepository::new(db.clone())
        .create(
            &sistema,
            CreateColaboradorInput {
                nome: "Ana Souza".to_string(),
                email: "ana@gestor.test".to_string(),
                cpf: "529.982.247-25".to_string(),
                telefone: None,
                cargo: Some("Vendas".to_string()),
                senha: "segredo123".to_string(),
                role_id: role.id,
                ativo: true,
                external_id: None,
            },
        )
        .await
        .expect("colaborador");
    let cliente = ClienteRepository::new(db.clone())
        .create(&sistema, cliente_input("Mercado Central", "11.222.333/0001-81"))
        .await
        .expect("cliente");
    let forma = FormaPagamentoRepository::new(db.clone())
        .create(
            &sistema,
            CreateFormaPagamentoInput {
                nome: "Cartao de credito".to_string(),
                tipo: "cartao_credito".to_string(),
                max_parcelas: 12,
                taxa_percentual: Decimal::ZERO,
                ativo: true,
            },
        )
        .await
        .expect("forma");

    Base {
        nivel_id: nivel.id,
        role_id: role.id,
        colaborador_id: colaborador.id,
        cliente_id: cliente.id,
        forma_pagamento_id: forma.id,
    }
}

/// A company customer with the given CNPJ.
pub fn cliente_input(nome: &str, cnpj: &str) -> CreateClienteInput {
    CreateClienteInput {
        nome: nome.to_string(),
        tipo_pessoa: "J".to_string(),
        documento: cnpj.to_string(),
        email: None,
        telefone: None,
        cidade_id: None,
        endereco: None,
        cep: None,
        ativo: true,
        external_id: None,
    }
}

/// Audit rows of one entity row, oldest first.
pub async fn auditoria_de(
    db: &DatabaseConnection,
    entidade_id: Uuid,
) -> Vec<registros_auditoria::Model> {
    use sea_orm::{ColumnTrait, QueryFilter, QueryOrder};
    registros_auditoria::Entity::find()
        .filter(registros_auditoria::Column::EntidadeId.eq(entidade_id))
        .order_by_asc(registros_auditoria::Column::CriadoEm)
        .all(db)
        .await
        .expect("audit rows")
}
