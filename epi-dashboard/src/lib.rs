//! # epi-dashboard
//!
//! Tableau de bord épidémiologique en ligne de commande, au-dessus d'`epidata`.
//!
//! ## Features
//!
//! - Résumé KPI / séries mensuelles / classement régional, rapport JSON
//! - Couche choroplèthe GeoJSON (régions, districts) avec comptage des
//!   infrastructures sanitaires
//! - Export CSV horodaté du jeu filtré
//! - Prévisions régionales (paludisme au mois, dengue à la semaine) comparées
//!   aux seuils d'alerte, avec cache de session et rafraîchissement périodique
//!
//! ## Usage CLI
//!
//! ```bash
//! # Résumé filtré
//! epi-dashboard summary --csv data_epi_final.csv --year 2023 --disease Paludisme
//!
//! # Carte des régions
//! epi-dashboard map --csv data_epi_final.csv --data-dir public --output regions.geojson
//!
//! # Prévisions (EPI_BACKEND_URL dans .env)
//! epi-dashboard forecast --disease dengue --all
//! ```

pub mod config;
pub mod export;
pub mod forecast;
pub mod report;
pub mod session;

pub use config::{LayerCatalog, Settings};
pub use forecast::{ForecastClient, ForecastDisease, ForecastError, ForecastSet};
pub use report::{DashboardReport, ReportStatus};
pub use session::{SessionState, SessionStore};
