//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written as plain
//! PostgreSQL.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_acesso;
mod m20250301_000002_cadastros;
mod m20250301_000003_comercial;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_acesso::Migration),
            Box::new(m20250301_000002_cadastros::Migration),
            Box::new(m20250301_000003_comercial::Migration),
        ]
    }
}
