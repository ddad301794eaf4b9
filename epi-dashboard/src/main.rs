//! Point d'entrée CLI pour epi-dashboard

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use epi_dashboard::config::Settings;

/// Charge `.env` (répertoire courant, sinon celui du binaire)
fn load_env() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }
    let path = std::env::current_exe().ok()?.parent()?.join(".env");
    dotenvy::from_path(&path).ok().map(|_| path)
}

mod cli;

use cli::{Commands, ForecastOptions, MapOptions};

/// Tableau de bord épidémiologique en ligne de commande
#[derive(Parser)]
#[command(name = "epi-dashboard")]
#[command(author, version)]
#[command(about = "Tableau de bord épidémiologique: résumés, cartes choroplèthes, export CSV et prévisions")]
#[command(long_about = "Agrège le CSV de surveillance (paludisme, dengue...) par région et par mois, joint les agrégats aux couches GeoJSON et consomme les prévisions régionales du backend.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// URL du backend de prévision (défaut : env EPI_BACKEND_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Fichier de session (défaut : env EPI_SESSION_FILE / .epi-dashboard/session.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = load_env();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Some(path) = &env_file {
        debug!(path = %path.display(), ".env chargé");
    }
    let settings = Settings::from_env().with_overrides(cli.backend, cli.state);
    debug!(?settings, "Configuration");

    match cli.command {
        Commands::Summary {
            input,
            filter,
            report,
        } => {
            cli::cmd_summary(&input, &filter, report.as_deref())?;
        }
        Commands::Map {
            input,
            filter,
            layer,
            config,
            data_dir,
            output,
            theme,
            infra,
            report,
        } => {
            cli::cmd_map(
                &input,
                &filter,
                MapOptions {
                    layer: &layer,
                    config: &config,
                    data_dir: &data_dir,
                    output: &output,
                    theme: theme.into(),
                    infra: infra.as_deref(),
                    report: report.as_deref(),
                },
            )?;
        }
        Commands::ExportCsv {
            input,
            filter,
            output,
        } => {
            cli::cmd_export_csv(&input, &filter, &output)?;
        }
        Commands::Forecast {
            disease,
            all,
            refresh,
            watch,
            interval,
        } => {
            cli::cmd_forecast(
                &settings,
                ForecastOptions {
                    disease,
                    all,
                    refresh,
                    watch,
                    interval_secs: interval,
                },
            )
            .await?;
        }
        Commands::Session { action } => {
            cli::cmd_session(&settings, &action)?;
        }
    }

    Ok(())
}

/// Niveau selon -v/-q; `RUST_LOG` reste prioritaire
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    // La pile HTTP reste en warn tant que RUST_LOG ne dit pas autre chose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,rustls=warn"))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .init();
}
