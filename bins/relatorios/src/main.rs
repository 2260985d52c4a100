//! Fleet fuel consumption report.
//!
//! Loads the fills of a period, computes per-vehicle consumption and writes one CSV
//! row per vehicle. Runs once and exits non-zero on any failure.
//!
//! Usage:
//!   relatorio-frota --inicio 2026-01-01 --fim 2026-01-31 --saida frota.csv
//!
//! The database comes from `DATABASE_URL`.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use gestor_db::repositories::{FrotaRepository, LinhaRelatorioFrota};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "relatorio-frota")]
#[command(about = "Fuel consumption per vehicle, as CSV")]
struct Args {
    /// First day of the period (YYYY-MM-DD).
    #[arg(long)]
    inicio: NaiveDate,

    /// Last day of the period, inclusive.
    #[arg(long)]
    fim: NaiveDate,

    /// Output file; `-` writes to stdout.
    #[arg(long, default_value = "-")]
    saida: String,

    /// Only this vehicle.
    #[arg(long)]
    veiculo: Option<Uuid>,
}

/// One CSV row. Absent figures are written as empty cells.
#[derive(Debug, Serialize)]
struct LinhaCsv {
    placa: String,
    modelo: String,
    abastecimentos: u32,
    litros_total: Decimal,
    custo_total: Decimal,
    km_rodados: Decimal,
    consumo_medio_km_l: Option<Decimal>,
    custo_por_km: Option<Decimal>,
    preco_medio_litro: Option<Decimal>,
}

impl From<LinhaRelatorioFrota> for LinhaCsv {
    fn from(linha: LinhaRelatorioFrota) -> Self {
        let c = linha.consumo;
        Self {
            placa: linha.placa,
            modelo: linha.modelo,
            abastecimentos: c.abastecimentos,
            litros_total: c.litros_total,
            custo_total: c.custo_total,
            km_rodados: c.km_rodados,
            consumo_medio_km_l: c.consumo_medio_km_l,
            custo_por_km: c.custo_por_km,
            preco_medio_litro: c.preco_medio_litro,
        }
    }
}

fn escrever_csv<W: Write>(linhas: Vec<LinhaRelatorioFrota>, destino: W) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(destino);
    let total = linhas.len();
    for linha in linhas {
        writer.serialize(LinhaCsv::from(linha))?;
    }
    writer.flush()?;
    Ok(total)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gestor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = gestor_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    let linhas = FrotaRepository::new(db)
        .relatorio_consumo(args.inicio, args.fim, args.veiculo)
        .await?;

    let total = if args.saida == "-" {
        escrever_csv(linhas, std::io::stdout().lock())?
    } else {
        let caminho = PathBuf::from(&args.saida);
        let arquivo = File::create(&caminho)
            .with_context(|| format!("cannot create {}", caminho.display()))?;
        escrever_csv(linhas, arquivo)?
    };

    info!(
        inicio = %args.inicio,
        fim = %args.fim,
        veiculos = total,
        saida = %args.saida,
        "fleet report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestor_core::frota::ConsumoVeiculo;
    use rust_decimal_macros::dec;

    fn linha(placa: &str, consumo_medio_km_l: Option<Decimal>) -> LinhaRelatorioFrota {
        LinhaRelatorioFrota {
            placa: placa.to_string(),
            modelo: "Fiorino".to_string(),
            consumo: ConsumoVeiculo {
                veiculo_id: Uuid::nil(),
                abastecimentos: 2,
                litros_total: dec!(80),
                custo_total: dec!(480),
                km_rodados: dec!(500),
                consumo_medio_km_l,
                custo_por_km: consumo_medio_km_l.map(|_| dec!(0.96)),
                preco_medio_litro: Some(dec!(6)),
            },
        }
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_vehicle() {
        let mut saida = Vec::new();
        let total = escrever_csv(
            vec![linha("ABC1D23", Some(dec!(12.5))), linha("XYZ9876", None)],
            &mut saida,
        )
        .unwrap();
        let texto = String::from_utf8(saida).unwrap();
        let linhas: Vec<&str> = texto.lines().collect();

        assert_eq!(total, 2);
        assert_eq!(
            linhas[0],
            "placa,modelo,abastecimentos,litros_total,custo_total,km_rodados,\
             consumo_medio_km_l,custo_por_km,preco_medio_litro"
        );
        assert_eq!(linhas[1], "ABC1D23,Fiorino,2,80,480,500,12.5,0.96,6");
        assert_eq!(linhas[2], "XYZ9876,Fiorino,2,80,480,500,,,6");
    }

    #[test]
    fn test_empty_report_writes_nothing() {
        let mut saida = Vec::new();
        assert_eq!(escrever_csv(Vec::new(), &mut saida).unwrap(), 0);
        assert!(saida.is_empty());
    }
}
