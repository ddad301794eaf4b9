//! Définition et implémentation des commandes CLI
//!
//! - `summary`: KPI, séries mensuelles et régionales d'un CSV filtré
//! - `map`: jointure d'une couche GeoJSON → GeoJSON enrichi
//! - `export-csv`: export du jeu filtré
//! - `forecast`: prévisions régionales et risque
//! - `session`: jeton et cache persistants

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use tracing::{info, warn};

use epi_dashboard::config::{LayerCatalog, Settings};
use epi_dashboard::export::geojson::export_layer;
use epi_dashboard::forecast::poller::{self, ForecastSource};
use epi_dashboard::forecast::{
    period_label, top_entries, ForecastClient, ForecastDisease, ForecastSet, REFRESH_INTERVAL,
};
use epi_dashboard::report::DashboardReport;
use epi_dashboard::session::SessionStore;
use epidata::geojoin::{count_within, load_points};
use epidata::{
    aggregate_by_month, aggregate_by_region, filter, join_metrics_to_features, Dataset, Facets,
    FilterState, IngestPolicy, Kpis, Theme,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Print KPIs, monthly and regional aggregates of the filtered CSV
    Summary {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Save the full report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Join regional aggregates to a GeoJSON layer and write the choropleth layer
    Map {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Layer id in the catalogue (regions, districts...)
        #[arg(long, default_value = "regions")]
        layer: String,

        /// Layer catalogue: preset name (senegal) or path to a JSON file
        #[arg(long, default_value = "senegal")]
        config: String,

        /// Root directory of the GeoJSON files
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Colour palette
        #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
        theme: ThemeArg,

        /// Point layer to count per feature (ex: health)
        #[arg(long)]
        infra: Option<String>,

        /// Save the report (with join diagnostics) as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export the filtered records as CSV
    ExportCsv {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory (file name is timestamped)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show regional forecasts against alert thresholds
    Forecast {
        /// Only one disease
        #[arg(long, value_enum)]
        disease: Option<ForecastDisease>,

        /// Show every region instead of the top 5
        #[arg(long)]
        all: bool,

        /// Ignore the cached forecasts
        #[arg(long)]
        refresh: bool,

        /// Refresh periodically until Ctrl-C
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds for --watch (default: 4h)
        #[arg(long, default_value_t = REFRESH_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Manage the persisted session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print the session state
    Show,
    /// Store the auth token sent to the forecast backend
    SetToken { token: String },
    /// Remove token and cached forecasts
    Clear,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the surveillance CSV (data_epi_final.csv)
    #[arg(short, long)]
    pub csv: PathBuf,

    /// Reject rows with unreadable numeric values instead of defaulting them to 0
    #[arg(long)]
    pub strict: bool,
}

impl InputArgs {
    fn policy(&self) -> IngestPolicy {
        if self.strict {
            IngestPolicy::Strict
        } else {
            IngestPolicy::Lenient
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Year, or "Toutes"
    #[arg(long, default_value = "Toutes")]
    pub year: String,

    /// Disease (Paludisme, Dengue...), or "Toutes"
    #[arg(long, default_value = "Toutes")]
    pub disease: String,

    /// Month 01-12, or "Tous"
    #[arg(long, default_value = "Tous")]
    pub month: String,
}

impl FilterArgs {
    pub fn state(&self) -> FilterState {
        FilterState::new(&self.year, &self.disease, &self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

/// Charge le CSV; les lignes exclues sont journalisées
fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    let dataset = epidata::load(&input.csv, input.policy())
        .context(format!("Failed to load CSV: {}", input.csv.display()))?;

    if dataset.report.rows_rejected > 0 {
        warn!(
            rejected = dataset.report.rows_rejected,
            "Lignes exclues du jeu de données"
        );
    }
    Ok(dataset)
}

/// Exécute la commande summary
pub fn cmd_summary(
    input: &InputArgs,
    filter_args: &FilterArgs,
    report_path: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let dataset = load_dataset(input)?;
    let state = filter_args.state();
    info!(filter = %state, "Résumé");

    let selected = filter(&dataset.records, &state);

    let mut report = DashboardReport::new(
        &input.csv.display().to_string(),
        &dataset.fingerprint,
        &state.to_string(),
    );
    report.record_ingest(&dataset.report);
    report.facets = Facets::from_records(&dataset.records);
    report.kpis = Kpis::compute(selected.iter().copied());
    report.record_monthly(&aggregate_by_month(selected.iter().copied()));
    report.record_regions(&aggregate_by_region(selected.iter().copied(), "Region"));
    report.set_duration(start.elapsed());
    report.finalize();

    report.display();

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .context(format!("Failed to write report: {}", path.display()))?;
        println!("Report saved: {}", path.display());
    }

    Ok(())
}

/// Options de la commande map
pub struct MapOptions<'a> {
    pub layer: &'a str,
    pub config: &'a str,
    pub data_dir: &'a Path,
    pub output: &'a Path,
    pub theme: Theme,
    pub infra: Option<&'a str>,
    pub report: Option<&'a Path>,
}

/// Exécute la commande map
pub fn cmd_map(
    input: &InputArgs,
    filter_args: &FilterArgs,
    options: MapOptions<'_>,
) -> Result<()> {
    let start = Instant::now();
    let catalog = LayerCatalog::resolve(options.config)?;
    let layer = catalog.admin_layer(options.layer)?;
    let join_column = layer.join_column()?;

    let dataset = load_dataset(input)?;
    let state = filter_args.state();
    let selected = filter(&dataset.records, &state);
    let metrics = aggregate_by_region(selected.iter().copied(), join_column);

    let collection = layer
        .load(options.data_dir)
        .context(format!("Failed to load layer {}", layer.name))?;
    let mut join = join_metrics_to_features(&metrics, &collection, layer, options.theme)?;

    if let Some(infra_id) = options.infra {
        let infra_layer = catalog.point_layer(infra_id)?;
        let points = load_points(&infra_layer.load(options.data_dir)?, infra_layer)?;
        count_within(&mut join, &points);
    }

    export_layer(&join, options.output)?;

    let mut report = DashboardReport::new(
        &input.csv.display().to_string(),
        &dataset.fingerprint,
        &state.to_string(),
    );
    report.record_ingest(&dataset.report);
    report.kpis = Kpis::compute(selected.iter().copied());
    report.record_regions(&metrics);
    report.join = Some(join.stats.clone());
    report.set_duration(start.elapsed());
    report.finalize();

    println!("=== Map {} ===", layer.name);
    println!("{}", report.summary());
    println!(
        "Features: {} matched / {}",
        join.stats.matched, join.stats.features
    );
    if !join.stats.unmatched_features.is_empty() {
        println!("No data: {}", join.stats.unmatched_features.join(", "));
    }
    if !join.stats.orphan_metrics.is_empty() {
        println!(
            "CSV names without feature: {}",
            join.stats.orphan_metrics.join(", ")
        );
    }
    println!("Legend:");
    for bin in join.scale.legend() {
        println!("  {:>10.0} - {:<10.0} {}", bin.lower, bin.upper, bin.fill);
    }
    println!(
        "Output: {} ({:.2}s)",
        options.output.display(),
        report.duration_secs
    );

    if let Some(path) = options.report {
        report
            .save_to_file(path)
            .context(format!("Failed to write report: {}", path.display()))?;
        println!("Report saved: {}", path.display());
    }

    Ok(())
}

/// Exécute la commande export-csv
pub fn cmd_export_csv(input: &InputArgs, filter_args: &FilterArgs, output: &Path) -> Result<()> {
    let dataset = load_dataset(input)?;
    let state = filter_args.state();
    let selected = filter(&dataset.records, &state);

    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Utc::now().naive_utc();
    let path = epidata::export::export_to_dir(
        output,
        timestamp,
        &dataset.headers,
        selected.iter().copied(),
    )?;

    println!("Exported {} records to {}", selected.len(), path.display());
    Ok(())
}

/// Options de la commande forecast
pub struct ForecastOptions {
    pub disease: Option<ForecastDisease>,
    pub all: bool,
    pub refresh: bool,
    pub watch: bool,
    pub interval_secs: u64,
}

/// Exécute la commande forecast
pub async fn cmd_forecast(settings: &Settings, options: ForecastOptions) -> Result<()> {
    let backend = settings.require_backend()?;
    let mut store = SessionStore::open(&settings.session_file)?;
    let client = ForecastClient::new(backend, store.token())?;

    let diseases: Vec<ForecastDisease> = match options.disease {
        Some(d) => vec![d],
        None => ForecastDisease::ALL.to_vec(),
    };

    if options.watch {
        let period = std::time::Duration::from_secs(options.interval_secs.max(1));
        info!(
            backend = client.base_url(),
            interval = options.interval_secs,
            "Rafraîchissement périodique"
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Écoute de Ctrl-C impossible");
                std::future::pending::<()>().await;
            }
        };
        poller::watch(&client, &mut store, period, shutdown, |set| {
            print_forecasts(set, &diseases, options.all)
        })
        .await?;
        return Ok(());
    }

    let (set, source) =
        poller::load_or_fetch(&client, &mut store, REFRESH_INTERVAL, options.refresh).await?;
    if source == ForecastSource::Cache {
        println!("(cached, fetched at {})", set.fetched_at);
    }
    print_forecasts(&set, &diseases, options.all);
    Ok(())
}

fn print_forecasts(set: &ForecastSet, diseases: &[ForecastDisease], all: bool) {
    for &disease in diseases {
        let payload = set.payload(disease);
        let risk = set.risk(disease);

        println!("\n=== Prévisions {} ===", disease);
        if let Some(period) = period_label(disease, payload) {
            println!("Période: {}", period);
        }
        if let Some(generated_at) = &payload.generated_at {
            println!("Générées: {}", generated_at);
        }
        println!("Seuil: {} {}", disease.threshold(), disease.rate_label());

        if risk.is_empty() {
            println!("  (aucune région)");
            continue;
        }
        for entry in top_entries(&risk, all) {
            println!(
                "  {} {:<20} {:>8.0} {}  {:>4.0}%",
                if entry.above { "!" } else { " " },
                entry.region,
                entry.value,
                disease.rate_label(),
                entry.ratio
            );
        }
        let alerts = risk.iter().filter(|e| e.above).count();
        println!("Régions au-dessus du seuil: {}/{}", alerts, risk.len());
    }
}

/// Exécute la commande session
pub fn cmd_session(settings: &Settings, action: &SessionAction) -> Result<()> {
    let mut store = SessionStore::open(&settings.session_file)?;

    match action {
        SessionAction::Show => {
            println!("Session: {}", store.path().display());
            println!(
                "Token: {}",
                if store.token().is_some() { "set" } else { "none" }
            );
            match store.forecasts() {
                Some(set) => println!(
                    "Forecasts: fetched at {} ({})",
                    set.fetched_at,
                    if set.is_fresh(chrono::Utc::now(), REFRESH_INTERVAL) {
                        "fresh"
                    } else {
                        "stale"
                    }
                ),
                None => println!("Forecasts: none"),
            }
        }
        SessionAction::SetToken { token } => {
            store.set_token(Some(token.clone()));
            store.save()?;
            println!("Token saved to {}", store.path().display());
        }
        SessionAction::Clear => {
            store.clear();
            store.save()?;
            println!("Session cleared");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epidata::filter::Selection;

    #[test]
    fn test_filter_args_state() {
        let args = FilterArgs {
            year: "2023".into(),
            disease: "Toutes".into(),
            month: "3".into(),
        };
        let state = args.state();
        assert_eq!(state.year, Selection::Only("2023".into()));
        assert!(state.disease.is_all());
        assert_eq!(state.month, Selection::Only("03".into()));
    }

    #[test]
    fn test_input_policy() {
        let input = InputArgs {
            csv: PathBuf::from("data.csv"),
            strict: true,
        };
        assert_eq!(input.policy(), IngestPolicy::Strict);
    }

    #[test]
    fn test_export_csv_command() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("data.csv");
        std::fs::write(
            &csv,
            "Date,Region,Maladie,Cas_confirmes,Morts\n\
             15/03/2023,Dakar,Paludisme,120,3\n\
             15/04/2023,Dakar,Dengue,4,0\n",
        )
        .unwrap();

        let input = InputArgs { csv, strict: false };
        let filter_args = FilterArgs {
            year: "Toutes".into(),
            disease: "Dengue".into(),
            month: "Tous".into(),
        };
        let out = dir.path().join("out");
        cmd_export_csv(&input, &filter_args, &out).unwrap();

        let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(files.len(), 1);
        let path = files[0].as_ref().unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dashboard-epidemiologie-"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"Dengue\""));
    }

    #[test]
    fn test_map_command_report_carries_join_stats() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("data.csv");
        std::fs::write(
            &csv,
            "Date,Region,Maladie,Cas_confirmes,Morts\n\
             15/03/2023,Dakar,Paludisme,120,3\n\
             15/03/2023,Thies,Paludisme,40,0\n",
        )
        .unwrap();

        let layers = dir.path().join("delimitations_sen");
        std::fs::create_dir_all(&layers).unwrap();
        let square = |x: f64| {
            serde_json::json!({
                "type": "Polygon",
                "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
            })
        };
        let regions = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"NOMREG": "DAKAR"}, "geometry": square(0.0)},
                {"type": "Feature", "properties": {"NOMREG": "THIÈS"}, "geometry": square(2.0)},
                {"type": "Feature", "properties": {"NOMREG": "KOLDA"}, "geometry": square(4.0)}
            ]
        });
        std::fs::write(layers.join("Sen_regions.geojson"), regions.to_string()).unwrap();

        let input = InputArgs { csv, strict: false };
        let filter_args = FilterArgs {
            year: "Toutes".into(),
            disease: "Toutes".into(),
            month: "Tous".into(),
        };
        let output = dir.path().join("map.geojson");
        let report_path = dir.path().join("map-report.json");
        cmd_map(
            &input,
            &filter_args,
            MapOptions {
                layer: "regions",
                config: "senegal",
                data_dir: dir.path(),
                output: &output,
                theme: Theme::Light,
                infra: None,
                report: Some(&report_path),
            },
        )
        .unwrap();

        assert!(output.exists());
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["join"]["features"], 3);
        assert_eq!(json["join"]["matched"], 1);
        assert_eq!(json["join"]["orphan_metrics"], serde_json::json!(["THIES"]));
        assert_eq!(json["kpis"]["total_cases"], 160);
        assert_eq!(json["regions"][0]["key"], "DAKAR");
    }

    #[test]
    fn test_session_command() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default().with_overrides(None, Some(dir.path().join("s.json")));

        cmd_session(&settings, &SessionAction::SetToken { token: "abc".into() }).unwrap();
        assert_eq!(
            SessionStore::open(&settings.session_file).unwrap().token(),
            Some("abc")
        );

        cmd_session(&settings, &SessionAction::Clear).unwrap();
        assert!(SessionStore::open(&settings.session_file)
            .unwrap()
            .token()
            .is_none());
    }
}
