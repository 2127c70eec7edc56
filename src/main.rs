use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod catalog;
mod db;
mod models;
mod rank;
mod report;
mod score;

#[derive(Parser)]
#[command(name = "skillcheck")]
#[command(about = "Skill check scoring and report generator for nail technician certification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import skill checks from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score a customer's latest skill check
    Score {
        #[arg(long)]
        customer: String,
    },
    /// Generate a markdown evaluation report
    Report {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    catalog::validate().context("item catalog failed validation")?;

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} skill checks from {}.", csv.display());
        }
        Commands::Score { customer } => {
            let Some(customer) = db::fetch_customer(&pool, &customer).await? else {
                println!("No customer with number {customer}.");
                return Ok(());
            };
            let checks = db::fetch_checks(&pool, customer.id).await?;
            let Some(current) = checks.first() else {
                println!("No skill checks recorded for {}.", customer.name);
                return Ok(());
            };

            println!(
                "{} ({}), checked {}:",
                customer.name,
                customer.customer_number,
                current.recorded_at.date_naive()
            );
            for discipline in catalog::Discipline::ALL {
                let score = score::discipline_score(current, discipline);
                println!(
                    "- {}: {:.0}/{:.0} rank {}",
                    discipline.label(),
                    score.unwrap_or(0.0),
                    discipline.max_score(),
                    rank::label(rank::classify_opt(score, discipline.into())),
                );
            }
            let overall = score::overall_score(current);
            println!(
                "- comprehensive: {:.0}/{:.0} rank {}",
                overall.unwrap_or(0.0),
                catalog::OVERALL_MAX,
                rank::label(rank::classify_opt(overall, rank::Scale::Overall)),
            );
        }
        Commands::Report { customer, out } => {
            let Some(customer) = db::fetch_customer(&pool, &customer).await? else {
                println!("No customer with number {customer}.");
                return Ok(());
            };
            let checks = db::fetch_checks(&pool, customer.id).await?;
            let report = report::build_report(&customer, checks.first(), checks.get(1));
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
