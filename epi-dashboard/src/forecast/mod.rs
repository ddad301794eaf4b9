//! Prévisions régionales du backend et évaluation du risque
//!
//! Le backend expose une prévision par maladie pour toutes les régions:
//! paludisme au mois, dengue à la semaine ISO. Chaque valeur est comparée à
//! un seuil d'alerte fixe.

pub mod client;
pub mod poller;

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use epidata::filter::month_name_fr;

pub use client::{ForecastClient, ForecastError};

/// Intervalle de rafraîchissement des prévisions (4 h)
pub const REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(4 * 60 * 60);

/// Nombre de régions affichées par défaut
pub const TOP_REGIONS: usize = 5;

/// Ratio affiché plafonné à 130 % du seuil
const RATIO_CAP: f64 = 130.0;

/// Maladie prévue par le backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastDisease {
    /// Paludisme, cas par mois
    #[value(alias = "palu")]
    Malaria,
    /// Dengue, cas par semaine
    Dengue,
}

impl ForecastDisease {
    pub const ALL: [ForecastDisease; 2] = [ForecastDisease::Malaria, ForecastDisease::Dengue];

    /// Chemin de l'endpoint, relatif à l'URL du backend
    pub fn endpoint(self) -> &'static str {
        match self {
            ForecastDisease::Malaria => "/epi/predict/palu-all",
            ForecastDisease::Dengue => "/epi/predict/dengue-all",
        }
    }

    /// Seuil d'alerte
    pub fn threshold(self) -> f64 {
        match self {
            ForecastDisease::Malaria => 2000.0,
            ForecastDisease::Dengue => 80.0,
        }
    }

    /// Unité quand le backend n'en fournit pas
    pub fn default_unit(self) -> &'static str {
        match self {
            ForecastDisease::Malaria => "malaria_cases",
            ForecastDisease::Dengue => "dengue_cases_ssa",
        }
    }

    /// Unité affichée
    pub fn rate_label(self) -> &'static str {
        match self {
            ForecastDisease::Malaria => "cas / mois",
            ForecastDisease::Dengue => "cas / semaine",
        }
    }
}

impl fmt::Display for ForecastDisease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastDisease::Malaria => f.write_str("Paludisme"),
            ForecastDisease::Dengue => f.write_str("Dengue"),
        }
    }
}

/// `null` ou absent: valeur par défaut
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Prévision brute d'une région
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRegionForecast {
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    /// Nombre attendu; toute valeur non numérique compte pour 0
    #[serde(default)]
    pub prediction: serde_json::Value,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Réponse d'un endpoint de prévision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Mois prévu (paludisme)
    #[serde(default)]
    pub month: Option<u32>,
    /// Semaine ISO prévue (dengue)
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub disease: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub regions: Vec<RawRegionForecast>,
}

/// Prévision normalisée d'une région
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionForecast {
    pub region: String,
    pub value: f64,
    pub unit: String,
}

impl ForecastPayload {
    /// Prévisions normalisées (valeur numérique, unité par défaut)
    pub fn forecasts(&self, disease: ForecastDisease) -> Vec<RegionForecast> {
        self.regions
            .iter()
            .map(|r| RegionForecast {
                region: r.region.clone(),
                value: r
                    .prediction
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0),
                unit: r
                    .unit
                    .clone()
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| disease.default_unit().to_string()),
            })
            .collect()
    }
}

/// Prévision d'une région comparée au seuil
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskEntry {
    pub region: String,
    pub value: f64,
    pub unit: String,
    /// Valeur au-dessus (ou au niveau) du seuil
    pub above: bool,
    /// Pourcentage du seuil, plafonné à 130
    pub ratio: f64,
    /// Pourcentage du seuil, plafonné à 100 (barre de progression)
    pub progress: f64,
}

/// Compare chaque prévision au seuil; tri par valeur décroissante
pub fn assess_risk(forecasts: &[RegionForecast], threshold: f64) -> Vec<RiskEntry> {
    let mut entries: Vec<RiskEntry> = forecasts
        .iter()
        .map(|f| {
            let percent = if threshold > 0.0 {
                f.value / threshold * 100.0
            } else {
                0.0
            };
            RiskEntry {
                region: f.region.clone(),
                value: f.value,
                unit: f.unit.clone(),
                above: f.value >= threshold,
                ratio: percent.min(RATIO_CAP),
                progress: percent.min(100.0),
            }
        })
        .collect();

    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    entries
}

/// Les `TOP_REGIONS` premières entrées, ou toutes
pub fn top_entries(entries: &[RiskEntry], all: bool) -> &[RiskEntry] {
    if all {
        entries
    } else {
        &entries[..entries.len().min(TOP_REGIONS)]
    }
}

/// Libellé de la période prévue
///
/// Paludisme: "mars 2024". Dengue: plage de la semaine ISO,
/// "du 04 mars 2024 au 10 mars 2024 (semaine 10, 2024)".
pub fn period_label(disease: ForecastDisease, payload: &ForecastPayload) -> Option<String> {
    let year = payload.year?;
    match disease {
        ForecastDisease::Malaria => {
            let month = payload.month.unwrap_or(1);
            let name = month_name_fr(&format!("{:02}", month))
                .map(str::to_lowercase)
                .unwrap_or_else(|| format!("mois {}", month));
            Some(format!("{} {}", name, year))
        }
        ForecastDisease::Dengue => {
            let week = payload.week?;
            let (start, end) = iso_week_range(year, week)?;
            Some(format!(
                "du {} au {} (semaine {}, {})",
                format_date_fr(start),
                format_date_fr(end),
                week,
                year
            ))
        }
    }
}

/// Lundi et dimanche d'une semaine ISO
pub fn iso_week_range(year: i32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    Some((start, start + Duration::days(6)))
}

fn format_date_fr(date: NaiveDate) -> String {
    use chrono::Datelike;

    let month = month_name_fr(&format!("{:02}", date.month()))
        .map(str::to_lowercase)
        .unwrap_or_default();
    format!("{:02} {} {}", date.day(), month, date.year())
}

/// Prévisions des deux maladies, récupérées ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub fetched_at: DateTime<Utc>,
    pub malaria: ForecastPayload,
    pub dengue: ForecastPayload,
}

impl ForecastSet {
    pub fn payload(&self, disease: ForecastDisease) -> &ForecastPayload {
        match disease {
            ForecastDisease::Malaria => &self.malaria,
            ForecastDisease::Dengue => &self.dengue,
        }
    }

    /// Vrai si le jeu a été récupéré il y a moins de `max_age`
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: std::time::Duration) -> bool {
        match Duration::from_std(max_age) {
            Ok(max_age) => now.signed_duration_since(self.fetched_at) < max_age,
            Err(_) => true,
        }
    }

    /// Risque trié pour une maladie
    pub fn risk(&self, disease: ForecastDisease) -> Vec<RiskEntry> {
        assess_risk(&self.payload(disease).forecasts(disease), disease.threshold())
    }
}
