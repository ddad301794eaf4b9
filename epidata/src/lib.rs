//! # epidata
//!
//! Moteur de données du tableau de bord épidémiologique: ingestion du CSV de
//! surveillance, filtres, agrégations et jointure aux couches GeoJSON.
//!
//! ## Features
//!
//! - Décodage UTF-8 validé avec `simdutf8`, repli Windows-1252 via `encoding_rs`
//! - Détection du séparateur (`,` ou `;`) avec `memchr`
//! - Politique d'ingestion stricte ou tolérante, chaque ligne produisant un
//!   enregistrement ou un problème daté
//! - Agrégation par région (n'importe quelle colonne de jointure) et par mois
//! - Jointure aux features GeoJSON par nom normalisé, échelle choroplèthe
//! - Comptage des infrastructures par polygone (types `geo`, parallélisé)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use epidata::{aggregate_by_region, filter, join_metrics_to_features, FilterState};
//! use std::path::Path;
//!
//! let dataset = epidata::load(Path::new("data_epi_final.csv"), Default::default())?;
//! let state = FilterState::new("2023", "Paludisme", "Tous");
//! let selected = filter(&dataset.records, &state);
//! let metrics = aggregate_by_region(selected, "Region");
//!
//! let regions = layer.load(Path::new("public"))?;
//! let join = join_metrics_to_features(&metrics, &regions, &layer, Default::default())?;
//! println!("{} / {} features jointes", join.stats.matched, join.stats.features);
//! ```

pub mod aggregate;
pub mod error;
pub mod export;
pub mod filter;
pub mod geojoin;
pub mod ingest;
pub mod types;

pub use aggregate::{
    aggregate_by_month, aggregate_by_region, GroupMetrics, Kpis, Mean, MonthlyMetrics,
    RegionMetrics,
};
pub use error::EpiError;
pub use filter::{filter, Facets, FilterState, Selection};
pub use geojoin::{
    join_metrics_to_features, normalize_name, AdminLayerConfig, ColorScale, GeometryKind,
    LayerJoin, Theme,
};
pub use ingest::{load, parse_bytes};
pub use types::{Dataset, EpiRecord, IngestPolicy, IngestReport, IssueKind, RowIssue, Severity};
