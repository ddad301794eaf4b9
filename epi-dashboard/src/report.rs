//! Rapport du tableau de bord
//!
//! Regroupe le bilan d'ingestion, les KPI, les séries par mois et par région
//! et le bilan de jointure pour l'affichage console ou l'export JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use epidata::filter::month_name_fr;
use epidata::geojoin::JoinStats;
use epidata::{Facets, IngestReport, Kpis, Mean, MonthlyMetrics, RegionMetrics, RowIssue};

/// Statut global du rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    /// Toutes les lignes lues sans problème
    Clean,
    /// Lignes exclues ou valeurs par défaut appliquées
    Degraded,
    /// Aucun enregistrement après filtrage
    Empty,
}

/// Ligne de la série mensuelle
#[derive(Debug, Clone, Serialize)]
pub struct MonthRow {
    pub month: String,
    pub label: String,
    pub cases: u64,
    pub deaths: u64,
    pub avg_temperature: Mean,
}

/// Ligne du classement régional
#[derive(Debug, Clone, Serialize)]
pub struct RegionRow {
    pub key: String,
    pub label: String,
    pub cases: u64,
    pub deaths: u64,
    pub avg_temperature: Mean,
    pub avg_humidity: Mean,
    pub density: Option<f64>,
}

/// Rapport complet
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    /// Fichier CSV source
    pub source: String,
    /// Empreinte BLAKE3 du fichier
    pub fingerprint: String,
    /// Filtre appliqué
    pub filter: String,
    pub status: ReportStatus,
    pub duration_secs: f64,

    // Ingestion
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_rejected: usize,
    pub issues_by_kind: BTreeMap<String, usize>,
    pub issues: Vec<RowIssue>,

    /// Valeurs disponibles pour les filtres
    pub facets: Facets,
    pub kpis: Kpis,
    pub monthly: Vec<MonthRow>,
    pub regions: Vec<RegionRow>,

    /// Bilan de jointure, si une couche a été jointe
    pub join: Option<JoinStats>,
}

impl DashboardReport {
    /// Crée un rapport pour un fichier et un filtre
    pub fn new(source: &str, fingerprint: &str, filter: &str) -> Self {
        Self {
            source: source.to_string(),
            fingerprint: fingerprint.to_string(),
            filter: filter.to_string(),
            status: ReportStatus::Clean,
            duration_secs: 0.0,
            rows_read: 0,
            rows_kept: 0,
            rows_rejected: 0,
            issues_by_kind: BTreeMap::new(),
            issues: Vec::new(),
            facets: Facets::default(),
            kpis: Kpis::default(),
            monthly: Vec::new(),
            regions: Vec::new(),
            join: None,
        }
    }

    /// Enregistre le bilan d'ingestion
    pub fn record_ingest(&mut self, report: &IngestReport) {
        self.rows_read = report.rows_read;
        self.rows_kept = report.rows_kept;
        self.rows_rejected = report.rows_rejected;
        self.issues_by_kind = report.count_by_kind();
        self.issues = report.issues.clone();
    }

    /// Enregistre la série mensuelle
    pub fn record_monthly(&mut self, monthly: &MonthlyMetrics) {
        self.monthly = monthly
            .iter()
            .map(|(month, m)| MonthRow {
                month: month.clone(),
                label: month_name_fr(month).unwrap_or(month.as_str()).to_string(),
                cases: m.total_cases,
                deaths: m.total_deaths,
                avg_temperature: m.avg_temperature(),
            })
            .collect();
    }

    /// Enregistre le classement régional (cas décroissants)
    pub fn record_regions(&mut self, metrics: &RegionMetrics) {
        let mut regions: Vec<RegionRow> = metrics
            .iter()
            .map(|(key, m)| RegionRow {
                key: key.clone(),
                label: m.label.clone(),
                cases: m.total_cases,
                deaths: m.total_deaths,
                avg_temperature: m.avg_temperature(),
                avg_humidity: m.avg_humidity(),
                density: m.density,
            })
            .collect();
        regions.sort_by(|a, b| b.cases.cmp(&a.cases).then_with(|| a.key.cmp(&b.key)));
        self.regions = regions;
    }

    /// Définit la durée du traitement
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.kpis.records == 0 {
            ReportStatus::Empty
        } else if !self.issues.is_empty() {
            ReportStatus::Degraded
        } else {
            ReportStatus::Clean
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("DASHBOARD REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Filter: {}", self.filter);
        println!("Fingerprint: {}", self.fingerprint);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- INGEST ---");
        println!(
            "Rows: {} read, {} kept, {} rejected",
            self.rows_read, self.rows_kept, self.rows_rejected
        );
        for (kind, count) in &self.issues_by_kind {
            println!("  {}: {}", kind, count);
        }

        println!("\n--- KPI ---");
        println!("Records: {}", self.kpis.records);
        println!(
            "Cases: {} (Paludisme {}, Dengue {})",
            self.kpis.total_cases,
            self.kpis.malaria_cases(),
            self.kpis.dengue_cases()
        );
        println!(
            "Deaths: {} (CFR {}%)",
            self.kpis.total_deaths,
            self.kpis.case_fatality_rate()
        );
        println!(
            "Temperature: {} °C, Humidity: {} %, Wind: {}",
            self.kpis.avg_temperature, self.kpis.avg_humidity, self.kpis.avg_wind_speed
        );

        if !self.monthly.is_empty() {
            println!("\n--- BY MONTH ---");
            for m in &self.monthly {
                println!(
                    "  {:<10} {:>8} cases {:>6} deaths  {} °C",
                    m.label, m.cases, m.deaths, m.avg_temperature
                );
            }
        }

        if !self.regions.is_empty() {
            println!("\n--- BY REGION ({}) ---", self.regions.len());
            for r in self.regions.iter().take(20) {
                println!(
                    "  {:<20} {:>8} cases {:>6} deaths  {} °C  {} %",
                    r.label, r.cases, r.deaths, r.avg_temperature, r.avg_humidity
                );
            }
            if self.regions.len() > 20 {
                println!("  ... and {} more", self.regions.len() - 20);
            }
        }

        if let Some(join) = &self.join {
            println!("\n--- JOIN ---");
            println!("Features: {} matched / {}", join.matched, join.features);
            if !join.unmatched_features.is_empty() {
                println!(
                    "No data ({}): {}",
                    join.unmatched_features.len(),
                    join.unmatched_features.join(", ")
                );
            }
            if !join.orphan_metrics.is_empty() {
                println!(
                    "CSV names without feature ({}): {}",
                    join.orphan_metrics.len(),
                    join.orphan_metrics.join(", ")
                );
            }
        }

        if !self.issues.is_empty() {
            println!("\n--- ISSUES ({}) ---", self.issues.len());
            for issue in self.issues.iter().take(20) {
                println!("  {:?} {}", issue.severity, issue);
            }
            if self.issues.len() > 20 {
                println!("  ... and {} more", self.issues.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} [{}]: {} records, {} cases, {} deaths, {} rejected",
            self.source,
            self.filter,
            self.kpis.records,
            self.kpis.total_cases,
            self.kpis.total_deaths,
            self.rows_rejected
        )
    }
}
