//! Résolution des colonnes du CSV source

use csv::StringRecord;
use tracing::warn;

use crate::types::{IngestPolicy, IssueKind, RowIssue};
use crate::EpiError;

pub const DATE: &str = "Date";
pub const REGION: &str = "Region";
pub const DISEASE: &str = "Maladie";
pub const CASES: &str = "Cas_confirmes";
pub const DEATHS: &str = "Morts";
pub const TEMPERATURE: &str = "Temperature_moy";
pub const HUMIDITY: &str = "Humidite_moy";
pub const WIND: &str = "Vent_vit_moy";
pub const DENSITY: &str = "Densite";

/// Colonnes dérivées ajoutées à l'export
pub const YEAR: &str = "Annee";
pub const MONTH: &str = "Mois";

/// Alias acceptés pour la colonne région
const REGION_ALIASES: &[&str] = &[REGION, "Région"];

/// Indices des colonnes connues dans l'en-tête
#[derive(Debug, Clone)]
pub struct Schema {
    pub date: usize,
    pub region: usize,
    pub disease: usize,
    pub cases: Option<usize>,
    pub deaths: Option<usize>,
    pub temperature: Option<usize>,
    pub humidity: Option<usize>,
    pub wind: Option<usize>,
    pub density: Option<usize>,
    /// Colonnes non reconnues (indice, en-tête)
    pub extra: Vec<(usize, String)>,
}

impl Schema {
    /// Résout les indices depuis l'en-tête
    ///
    /// `Date`, `Region` et `Maladie` sont obligatoires. Une colonne numérique
    /// absente est fatale en mode strict, signalée une fois sinon.
    pub fn resolve(
        headers: &StringRecord,
        policy: IngestPolicy,
    ) -> Result<(Self, Vec<RowIssue>), EpiError> {
        let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h));

        let date = find(&[DATE]).ok_or_else(|| EpiError::MissingColumn(DATE.into()))?;
        let region =
            find(REGION_ALIASES).ok_or_else(|| EpiError::MissingColumn(REGION.into()))?;
        let disease = find(&[DISEASE]).ok_or_else(|| EpiError::MissingColumn(DISEASE.into()))?;

        let mut issues = Vec::new();
        let mut numeric = |name: &'static str| -> Result<Option<usize>, EpiError> {
            match find(&[name]) {
                Some(idx) => Ok(Some(idx)),
                None if policy == IngestPolicy::Strict => {
                    Err(EpiError::MissingColumn(name.to_string()))
                }
                None => {
                    warn!(column = name, "Colonne absente, valeurs à 0");
                    issues.push(RowIssue::warning(0, name, IssueKind::MissingColumn, ""));
                    Ok(None)
                }
            }
        };

        let cases = numeric(CASES)?;
        let deaths = numeric(DEATHS)?;
        let temperature = numeric(TEMPERATURE)?;
        let humidity = numeric(HUMIDITY)?;
        let wind = numeric(WIND)?;
        let density = numeric(DENSITY)?;

        let known = [
            Some(date),
            Some(region),
            Some(disease),
            cases,
            deaths,
            temperature,
            humidity,
            wind,
            density,
        ];
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(idx, name)| !known.contains(&Some(*idx)) && !name.is_empty())
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        Ok((
            Self {
                date,
                region,
                disease,
                cases,
                deaths,
                temperature,
                humidity,
                wind,
                density,
                extra,
            },
            issues,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn test_resolve_full_header() {
        let h = headers(&[
            "Date",
            "Region",
            "District",
            "Maladie",
            "Cas_confirmes",
            "Morts",
            "Temperature_moy",
            "Humidite_moy",
            "Vent_vit_moy",
            "Densite",
        ]);
        let (schema, issues) = Schema::resolve(&h, IngestPolicy::Strict).unwrap();
        assert_eq!(schema.region, 1);
        assert_eq!(schema.disease, 3);
        assert_eq!(schema.extra, vec![(2, "District".to_string())]);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_resolve_region_alias() {
        let h = headers(&["Date", "Région", "Maladie"]);
        let (schema, issues) = Schema::resolve(&h, IngestPolicy::Lenient).unwrap();
        assert_eq!(schema.region, 1);
        assert_eq!(schema.cases, None);
        assert_eq!(issues.len(), 6);
    }

    #[test]
    fn test_resolve_missing_required() {
        let h = headers(&["Region", "Maladie"]);
        let err = Schema::resolve(&h, IngestPolicy::Lenient).unwrap_err();
        assert!(matches!(err, EpiError::MissingColumn(c) if c == "Date"));
    }

    #[test]
    fn test_resolve_strict_missing_numeric() {
        let h = headers(&["Date", "Region", "Maladie", "Cas_confirmes"]);
        let err = Schema::resolve(&h, IngestPolicy::Strict).unwrap_err();
        assert!(matches!(err, EpiError::MissingColumn(c) if c == "Morts"));
    }
}
