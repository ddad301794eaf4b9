//! Agrégations par région, par mois, et indicateurs globaux (KPI)

pub mod stats;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::geojoin::normalize_name;
use crate::types::EpiRecord;

pub use stats::Mean;

/// Maladies suivies par les cartes KPI
pub const MALARIA: &str = "Paludisme";
pub const DENGUE: &str = "Dengue";

/// Cumuls pour une clé de regroupement (région, mois...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetrics {
    /// Libellé tel que vu dans le CSV (première occurrence)
    pub label: String,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
    pub wind_speeds: Vec<f64>,
    /// Dernière densité observée
    pub density: Option<f64>,
    /// Nombre d'enregistrements agrégés
    pub records: usize,
}

impl GroupMetrics {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn push(&mut self, record: &EpiRecord) {
        self.total_cases = self.total_cases.saturating_add(record.confirmed_cases);
        self.total_deaths = self.total_deaths.saturating_add(record.deaths);
        self.temperatures.push(record.avg_temperature);
        self.humidities.push(record.avg_humidity);
        self.wind_speeds.push(record.avg_wind_speed);
        self.density = Some(record.density);
        self.records += 1;
    }

    pub fn avg_temperature(&self) -> Mean {
        Mean::of(&self.temperatures)
    }

    pub fn avg_humidity(&self) -> Mean {
        Mean::of(&self.humidities)
    }

    pub fn avg_wind_speed(&self) -> Mean {
        Mean::of(&self.wind_speeds)
    }
}

/// Métriques par nom de région normalisé
pub type RegionMetrics = BTreeMap<String, GroupMetrics>;

/// Métriques par mois "01".."12" (ordre croissant)
pub type MonthlyMetrics = BTreeMap<String, GroupMetrics>;

/// Regroupe les enregistrements selon une clé
///
/// Les enregistrements sans clé sont ignorés.
pub fn aggregate_by<'a, I, F>(records: I, key: F) -> BTreeMap<String, GroupMetrics>
where
    I: IntoIterator<Item = &'a EpiRecord>,
    F: Fn(&EpiRecord) -> Option<(String, &str)>,
{
    let mut groups: BTreeMap<String, GroupMetrics> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some((key, label)) = key(record) else {
            skipped += 1;
            continue;
        };
        groups
            .entry(key)
            .or_insert_with(|| GroupMetrics::new(label))
            .push(record);
    }

    if skipped > 0 {
        debug!(skipped, "Enregistrements sans clé de regroupement");
    }
    groups
}

/// Agrège par la colonne de jointure d'une couche (`Region`, `District`...)
///
/// La clé est le nom normalisé, celui utilisé pour la jointure GeoJSON.
pub fn aggregate_by_region<'a, I>(records: I, join_column: &str) -> RegionMetrics
where
    I: IntoIterator<Item = &'a EpiRecord>,
{
    aggregate_by(records, |r| {
        let value = r.column(join_column)?;
        let key = normalize_name(value);
        (!key.is_empty()).then_some((key, value))
    })
}

/// Agrège par mois
pub fn aggregate_by_month<'a, I>(records: I) -> MonthlyMetrics
where
    I: IntoIterator<Item = &'a EpiRecord>,
{
    aggregate_by(records, |r| Some((r.month.clone(), r.month.as_str())))
}

/// Indicateurs globaux sur le jeu filtré
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub records: usize,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub cases_by_disease: BTreeMap<String, u64>,
    pub avg_temperature: Mean,
    pub avg_humidity: Mean,
    pub avg_wind_speed: Mean,
}

impl Kpis {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EpiRecord>,
    {
        let mut kpis = Kpis::default();
        let mut temperatures = Vec::new();
        let mut humidities = Vec::new();
        let mut winds = Vec::new();

        for record in records {
            kpis.records += 1;
            kpis.total_cases = kpis.total_cases.saturating_add(record.confirmed_cases);
            kpis.total_deaths = kpis.total_deaths.saturating_add(record.deaths);
            let disease = kpis.cases_by_disease.entry(record.disease.clone()).or_insert(0);
            *disease = disease.saturating_add(record.confirmed_cases);
            temperatures.push(record.avg_temperature);
            humidities.push(record.avg_humidity);
            winds.push(record.avg_wind_speed);
        }

        kpis.avg_temperature = Mean::of(&temperatures);
        kpis.avg_humidity = Mean::of(&humidities);
        kpis.avg_wind_speed = Mean::of(&winds);
        kpis
    }

    /// Cas de paludisme
    pub fn malaria_cases(&self) -> u64 {
        self.disease_cases(MALARIA)
    }

    /// Cas de dengue
    pub fn dengue_cases(&self) -> u64 {
        self.disease_cases(DENGUE)
    }

    pub fn disease_cases(&self, disease: &str) -> u64 {
        self.cases_by_disease.get(disease).copied().unwrap_or(0)
    }

    /// Taux de létalité en %, absent sans cas
    pub fn case_fatality_rate(&self) -> Mean {
        if self.total_cases == 0 {
            Mean::Absent
        } else {
            Mean::Value(self.total_deaths as f64 * 100.0 / self.total_cases as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(region: &str, month: u32, disease: &str, cases: u64, temp: f64) -> EpiRecord {
        EpiRecord {
            line: 0,
            date: NaiveDate::from_ymd_opt(2023, month, 1).unwrap(),
            year: "2023".into(),
            month: format!("{:02}", month),
            region: region.into(),
            disease: disease.into(),
            confirmed_cases: cases,
            deaths: 1,
            avg_temperature: temp,
            avg_humidity: 60.0,
            avg_wind_speed: 3.0,
            density: 100.0,
            extra: [("District".to_string(), format!("{} Nord", region))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_aggregate_by_region() {
        let records = vec![
            record("Dakar", 1, MALARIA, 10, 25.0),
            record(" dakar ", 2, DENGUE, 5, 27.0),
            record("Thiès", 1, MALARIA, 7, 30.0),
        ];
        let metrics = aggregate_by_region(&records, "Region");

        assert_eq!(metrics.len(), 2);
        let dakar = &metrics["DAKAR"];
        assert_eq!(dakar.label, "Dakar");
        assert_eq!(dakar.total_cases, 15);
        assert_eq!(dakar.total_deaths, 2);
        assert_eq!(dakar.avg_temperature(), Mean::Value(26.0));
        assert_eq!(dakar.records, 2);
        assert_eq!(metrics["THIÈS"].total_cases, 7);
    }

    #[test]
    fn test_aggregate_by_other_column() {
        let records = vec![record("Dakar", 1, MALARIA, 10, 25.0)];
        let metrics = aggregate_by_region(&records, "District");
        assert!(metrics.contains_key("DAKAR NORD"));

        let none = aggregate_by_region(&records, "Commune");
        assert!(none.is_empty());
    }

    #[test]
    fn test_aggregate_by_month_sorted() {
        let records = vec![
            record("Dakar", 11, MALARIA, 1, 25.0),
            record("Dakar", 2, MALARIA, 2, 25.0),
            record("Kolda", 2, DENGUE, 3, 25.0),
        ];
        let monthly = aggregate_by_month(&records);
        let months: Vec<_> = monthly.keys().cloned().collect();
        assert_eq!(months, vec!["02", "11"]);
        assert_eq!(monthly["02"].total_cases, 5);
    }

    #[test]
    fn test_empty_group_means_are_absent() {
        let group = GroupMetrics::new("Vide");
        assert_eq!(group.avg_temperature(), Mean::Absent);
        assert_eq!(group.avg_humidity().to_string(), "N/A");
    }

    #[test]
    fn test_kpis() {
        let records = vec![
            record("Dakar", 1, MALARIA, 10, 25.0),
            record("Dakar", 2, DENGUE, 5, 27.0),
            record("Thiès", 1, MALARIA, 7, 29.0),
        ];
        let kpis = Kpis::compute(&records);

        assert_eq!(kpis.total_cases, 22);
        assert_eq!(kpis.total_deaths, 3);
        assert_eq!(kpis.malaria_cases(), 17);
        assert_eq!(kpis.dengue_cases(), 5);
        assert_eq!(kpis.disease_cases("Choléra"), 0);
        assert_eq!(kpis.avg_temperature, Mean::Value(27.0));
    }

    #[test]
    fn test_large_counts_saturate() {
        let records = vec![
            record("Dakar", 1, MALARIA, u64::MAX - 10, 25.0),
            record("Dakar", 2, MALARIA, u64::MAX - 10, 25.0),
        ];

        let metrics = aggregate_by_region(&records, "Region");
        assert_eq!(metrics["DAKAR"].total_cases, u64::MAX);

        let kpis = Kpis::compute(&records);
        assert_eq!(kpis.total_cases, u64::MAX);
        assert_eq!(kpis.malaria_cases(), u64::MAX);
    }

    #[test]
    fn test_kpis_empty() {
        let kpis = Kpis::compute(&Vec::<EpiRecord>::new());
        assert_eq!(kpis.total_cases, 0);
        assert_eq!(kpis.avg_humidity, Mean::Absent);
        assert_eq!(kpis.case_fatality_rate(), Mean::Absent);
    }
}
