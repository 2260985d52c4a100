//! Database seeder for Gestor development and first installs.
//!
//! Seeds the hierarchy levels, the permission catalog, an administrator role and
//! user, the usual payment methods, a few cities and the store information.
//! Every step skips rows that already exist, so it can run repeatedly.
//!
//! Usage: cargo run --bin seeder
//!
//! `GESTOR_ADMIN_EMAIL` and `GESTOR_ADMIN_SENHA` override the admin credentials.

use anyhow::Context;
use chrono::Utc;
use gestor_db::entities::cidades;
use gestor_db::repositories::{
    Ator, ColaboradorRepository, CreateColaboradorInput, CreateFormaPagamentoInput,
    CreateNivelInput, CreateRoleInput, FormaPagamentoFilter, FormaPagamentoRepository, LojaInput,
    LojaRepository, RbacRepository, RoleFilter,
};
use gestor_shared::PageRequest;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

const ADMIN_ROLE: &str = "Administrador";

/// (nome, grau)
const NIVEIS: [(&str, i32); 3] = [("Diretoria", 100), ("Gerencia", 50), ("Operacional", 10)];

/// (nome, tipo, max_parcelas)
const FORMAS_PAGAMENTO: [(&str, &str, i32); 6] = [
    ("Dinheiro", "dinheiro", 1),
    ("PIX", "pix", 1),
    ("Cartao de debito", "cartao_debito", 1),
    ("Cartao de credito", "cartao_credito", 12),
    ("Boleto", "boleto", 6),
    ("Transferencia", "transferencia", 1),
];

/// (nome, uf, codigo_ibge)
const CIDADES: [(&str, &str, &str); 5] = [
    ("Sao Paulo", "SP", "3550308"),
    ("Rio de Janeiro", "RJ", "3304557"),
    ("Belo Horizonte", "MG", "3106200"),
    ("Curitiba", "PR", "4106902"),
    ("Porto Alegre", "RS", "4314902"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = gestor_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    println!("Seeding levels and permission catalog...");
    let diretoria = seed_niveis(&db).await?;

    println!("Seeding admin role and user...");
    seed_admin(&db, diretoria).await?;

    println!("Seeding payment methods...");
    seed_formas_pagamento(&db).await?;

    println!("Seeding cities...");
    seed_cidades(&db).await?;

    println!("Seeding store information...");
    seed_loja(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Creates missing levels and syncs the catalog; returns the top level id.
async fn seed_niveis(db: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let rbac = RbacRepository::new(db.clone());
    let adicionadas = rbac.sincronizar_catalogo().await?;
    println!("  {adicionadas} permission(s) added to the catalog");

    let existentes = rbac.list_niveis().await?;
    let mut topo = existentes.iter().find(|n| n.grau == NIVEIS[0].1).map(|n| n.id);
    for (nome, grau) in NIVEIS {
        if existentes.iter().any(|n| n.grau == grau || n.nome == nome) {
            println!("  Level {nome} already exists, skipping...");
            continue;
        }
        let nivel = rbac
            .create_nivel(
                &Ator::sistema(),
                CreateNivelInput {
                    nome: nome.to_string(),
                    grau,
                },
            )
            .await?;
        if grau == NIVEIS[0].1 {
            topo = Some(nivel.id);
        }
    }
    topo.context("top level is missing")
}

async fn seed_admin(db: &DatabaseConnection, nivel_id: Uuid) -> anyhow::Result<()> {
    let rbac = RbacRepository::new(db.clone());
    let filtro = RoleFilter {
        busca: Some(ADMIN_ROLE.to_string()),
        ..Default::default()
    };
    let existente = rbac
        .list_roles(&filtro, PageRequest::default())
        .await?
        .data
        .into_iter()
        .find(|r| r.nome == ADMIN_ROLE);
    let role = match existente {
        Some(role) => role,
        None => {
            rbac.create_role(
                &Ator::sistema(),
                CreateRoleInput {
                    nome: ADMIN_ROLE.to_string(),
                    descricao: Some("Acesso total".to_string()),
                    nivel_id,
                    super_admin: true,
                    ativo: true,
                },
            )
            .await?
        }
    };

    let email =
        std::env::var("GESTOR_ADMIN_EMAIL").unwrap_or_else(|_| "admin@gestor.local".to_string());
    let senha = std::env::var("GESTOR_ADMIN_SENHA").unwrap_or_else(|_| "admin12345".to_string());
    let colaboradores = ColaboradorRepository::new(db.clone());
    if colaboradores.find_by_email(&email).await?.is_some() {
        println!("  Admin {email} already exists, skipping...");
        return Ok(());
    }
    colaboradores
        .create(
            &Ator::sistema(),
            CreateColaboradorInput {
                nome: "Administrador".to_string(),
                email: email.clone(),
                cpf: "529.982.247-25".to_string(),
                telefone: None,
                cargo: Some("Administrador do sistema".to_string()),
                senha,
                role_id: role.id,
                ativo: true,
                external_id: None,
            },
        )
        .await?;
    println!("  Created admin {email}");
    Ok(())
}

async fn seed_formas_pagamento(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = FormaPagamentoRepository::new(db.clone());
    let existentes = repo
        .list(
            &FormaPagamentoFilter {
                incluir_deletados: true,
                ..Default::default()
            },
            PageRequest::new(1, 100),
        )
        .await?
        .data;
    for (nome, tipo, max_parcelas) in FORMAS_PAGAMENTO {
        if existentes.iter().any(|f| f.nome == nome) {
            continue;
        }
        repo.create(
            &Ator::sistema(),
            CreateFormaPagamentoInput {
                nome: nome.to_string(),
                tipo: tipo.to_string(),
                max_parcelas,
                taxa_percentual: Decimal::ZERO,
                ativo: true,
            },
        )
        .await?;
    }
    Ok(())
}

async fn seed_cidades(db: &DatabaseConnection) -> anyhow::Result<()> {
    let agora = Utc::now().fixed_offset();
    for (nome, uf, codigo_ibge) in CIDADES {
        let existe = cidades::Entity::find()
            .filter(cidades::Column::CodigoIbge.eq(codigo_ibge))
            .one(db)
            .await?
            .is_some();
        if existe {
            continue;
        }
        cidades::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome.to_string()),
            uf: Set(uf.to_string()),
            codigo_ibge: Set(codigo_ibge.to_string()),
            criado_em: Set(agora),
            atualizado_em: Set(agora),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_loja(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = LojaRepository::new(db.clone());
    if repo.get().await?.is_some() {
        println!("  Store information already set, skipping...");
        return Ok(());
    }
    repo.upsert(
        &Ator::sistema(),
        LojaInput {
            razao_social: "Loja Exemplo LTDA".to_string(),
            nome_fantasia: Some("Loja Exemplo".to_string()),
            cnpj: "11.222.333/0001-81".to_string(),
            inscricao_estadual: None,
            email: Some("contato@loja.local".to_string()),
            telefone: None,
            endereco: None,
            cidade_id: None,
            cep: None,
        },
    )
    .await?;
    Ok(())
}
