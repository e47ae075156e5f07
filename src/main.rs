use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod assistant;
mod config;
mod db;
mod engine;
mod error;
mod forecast;
mod models;
mod mri;
mod normalize;
mod recommend;
mod report;
mod risk;
mod timeline;

use config::EngineConfig;
use engine::Engine;
use models::{ForecastOutcome, RawSignal};
use recommend::Catalog;

#[derive(Parser)]
#[command(name = "mindpulse")]
#[command(about = "Mental Recovery Index scoring, forecasting and recovery planning", long_about = None)]
struct Cli {
    /// JSON file overriding engine constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// JSON file replacing the built-in intervention catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load ten days of sample check-ins for three users
    Seed {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Import check-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record (or correct) one day's check-in
    #[command(group(
        ArgGroup::new("fields")
            .args(["mood", "sleep", "stress", "workload", "water"])
            .multiple(true)
            .conflicts_with("json")
    ))]
    CheckIn {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        mood: Option<f64>,
        #[arg(long)]
        sleep: Option<f64>,
        #[arg(long)]
        stress: Option<f64>,
        #[arg(long)]
        workload: Option<f64>,
        #[arg(long)]
        water: Option<f64>,
        /// Raw check-in body as JSON, e.g. '{"sleep": 7.5, "stress": "4"}'
        #[arg(long)]
        json: Option<String>,
    },
    /// Show the dashboard for a user
    Dashboard {
        #[arg(long)]
        user: String,
        /// Write a markdown report here instead of printing JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Project the next seven days of MRI
    Forecast {
        #[arg(long)]
        user: String,
    },
    /// Ask the recovery assistant
    Chat {
        #[arg(long)]
        message: String,
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin(),
    };
    info!(interventions = catalog.len(), "engine ready");
    let mut engine = Engine::new(config, catalog);
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { today: seed_day } => {
            let pool = connect().await?;
            db::seed(&pool, &mut engine, seed_day.unwrap_or(today)).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &mut engine, &csv).await?;
            println!("Imported {inserted} check-ins from {}.", csv.display());
        }
        Commands::CheckIn {
            user,
            name,
            date,
            mood,
            sleep,
            stress,
            workload,
            water,
            json,
        } => {
            let raw = match json {
                Some(body) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&body).context("--json is not valid JSON")?;
                    normalize::raw_from_json(&value)?
                }
                None => RawSignal {
                    mood,
                    sleep_hours: sleep,
                    stress_level: stress,
                    workload_hours: workload,
                    water_liters: water,
                },
            };

            let pool = connect().await?;
            let user_id = db::ensure_user(&pool, &user, name.as_deref().unwrap_or(&user)).await?;
            engine.load_history(&user, db::fetch_history(&pool, &user).await?);
            let result = engine.submit_check_in(&user, date.unwrap_or(today), &raw)?;
            db::upsert_signal(&pool, user_id, &result.signal).await?;

            println!(
                "{} MRI {:.1} ({} risk){}",
                result.mri_record.date,
                result.mri_record.mri_score,
                result.risk_level,
                if result.timeline_delta.inserted { "" } else { ", corrected" }
            );
            if result.timeline_delta.recomputed.len() > 1 {
                println!("Recomputed later days:");
                for record in result.timeline_delta.recomputed.iter().skip(1) {
                    println!(
                        "- {} MRI {:.1} ({} risk)",
                        record.date, record.mri_score, record.risk_level
                    );
                }
            }
        }
        Commands::Dashboard { user, out } => {
            let pool = connect().await?;
            engine.load_history(&user, db::fetch_history(&pool, &user).await?);
            let dashboard = engine.dashboard(&user)?;

            match out {
                Some(path) => {
                    let name = db::fetch_display_name(&pool, &user)
                        .await?
                        .unwrap_or_else(|| user.clone());
                    let report = report::build_report(&name, &dashboard);
                    std::fs::write(&path, report)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&dashboard)?),
            }
        }
        Commands::Forecast { user } => {
            let pool = connect().await?;
            engine.load_history(&user, db::fetch_history(&pool, &user).await?);

            match engine.forecast(&user) {
                ForecastOutcome::Available(forecast) => {
                    println!(
                        "Forecast from {} (trend {:+.2}/day):",
                        forecast.origin_date, forecast.slope_per_day
                    );
                    for point in forecast.points {
                        println!(
                            "- {} MRI {:.1} [{:.1}, {:.1}]",
                            point.date, point.predicted_mri, point.band.lower, point.band.upper
                        );
                    }
                }
                ForecastOutcome::Unavailable {
                    history_days,
                    required,
                } => {
                    println!(
                        "Forecast unavailable: {history_days} of {required} required days recorded."
                    );
                }
            }
        }
        Commands::Chat { message, user } => {
            if let Some(user) = &user {
                let pool = connect().await?;
                engine.load_history(user, db::fetch_history(&pool, user).await?);
            }
            println!("{}", engine.chat(user.as_deref(), &message)?);
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

