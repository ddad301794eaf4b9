//! Conversion d'une ligne CSV brute en `EpiRecord`

use std::collections::BTreeMap;

use csv::StringRecord;

use super::date;
use super::schema::{self, Schema};
use crate::types::{EpiRecord, IngestPolicy, IssueKind, RowIssue};

/// Résultat du parsing d'un champ numérique
#[derive(Debug, Clone, Copy, PartialEq)]
enum Parsed<T> {
    Ok(T),
    /// Valeur utilisable mais dégradée (ex: 12.7 tronqué à 12)
    Degraded(T, IssueKind),
    Invalid(IssueKind),
}

/// Parse un compteur (entier positif)
fn parse_count(raw: &str) -> Parsed<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Parsed::Invalid(IssueKind::MissingValue);
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Parsed::Ok(value);
    }

    match parse_decimal(raw) {
        Some(v) if v < 0.0 => Parsed::Invalid(IssueKind::NegativeCount),
        // Hors de u64 ("1e20", "1e300"): illisible plutôt que saturé
        Some(v) if v >= u64::MAX as f64 => Parsed::Invalid(IssueKind::InvalidNumber),
        Some(v) if v.fract() == 0.0 => Parsed::Ok(v as u64),
        Some(v) => Parsed::Degraded(v.trunc() as u64, IssueKind::TruncatedCount),
        None => Parsed::Invalid(IssueKind::InvalidNumber),
    }
}

/// Parse une mesure flottante
fn parse_measure(raw: &str) -> Parsed<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Parsed::Invalid(IssueKind::MissingValue);
    }
    match parse_decimal(raw) {
        Some(v) => Parsed::Ok(v),
        None => Parsed::Invalid(IssueKind::InvalidNumber),
    }
}

/// Décimal fini, virgule décimale acceptée ("27,5")
fn parse_decimal(raw: &str) -> Option<f64> {
    let value: f64 = if raw.contains(',') && !raw.contains('.') {
        fast_float::parse(raw.replace(',', ".")).ok()?
    } else {
        fast_float::parse(raw).ok()?
    };
    value.is_finite().then_some(value)
}

/// Applique la politique d'ingestion à un champ
struct FieldReader<'a> {
    record: &'a StringRecord,
    line: u64,
    policy: IngestPolicy,
    warnings: Vec<RowIssue>,
}

impl<'a> FieldReader<'a> {
    fn resolve<T: Default>(
        &mut self,
        column: &str,
        idx: Option<usize>,
        parse: fn(&str) -> Parsed<T>,
    ) -> Result<T, RowIssue> {
        // Colonne absente: déjà signalée au niveau du fichier
        let Some(idx) = idx else {
            return Ok(T::default());
        };
        let record = self.record;
        let raw = record.get(idx).unwrap_or("");

        let (value, kind) = match parse(raw) {
            Parsed::Ok(value) => return Ok(value),
            Parsed::Degraded(value, kind) => (value, kind),
            Parsed::Invalid(kind) => (T::default(), kind),
        };

        match self.policy {
            IngestPolicy::Strict => Err(RowIssue::error(
                self.line,
                Some(column),
                kind,
                Some(raw),
            )),
            IngestPolicy::Lenient => {
                self.warnings
                    .push(RowIssue::warning(self.line, column, kind, raw));
                Ok(value)
            }
        }
    }
}

/// Convertit une ligne en enregistrement
///
/// Retourne l'enregistrement et ses warnings, ou le problème qui exclut la
/// ligne (date invalide, ou valeur illisible en mode strict).
pub fn parse_row(
    record: &StringRecord,
    line: u64,
    schema: &Schema,
    policy: IngestPolicy,
) -> Result<(EpiRecord, Vec<RowIssue>), RowIssue> {
    let raw_date = record.get(schema.date).unwrap_or("");
    let Some(parsed_date) = date::parse_date(raw_date) else {
        return Err(RowIssue::error(
            line,
            Some(schema::DATE),
            IssueKind::InvalidDate,
            Some(raw_date),
        ));
    };
    let (year, month) = date::year_month(parsed_date);

    let mut reader = FieldReader {
        record,
        line,
        policy,
        warnings: Vec::new(),
    };

    let confirmed_cases = reader.resolve(schema::CASES, schema.cases, parse_count)?;
    let deaths = reader.resolve(schema::DEATHS, schema.deaths, parse_count)?;
    let avg_temperature =
        reader.resolve(schema::TEMPERATURE, schema.temperature, parse_measure)?;
    let avg_humidity = reader.resolve(schema::HUMIDITY, schema.humidity, parse_measure)?;
    let avg_wind_speed = reader.resolve(schema::WIND, schema.wind, parse_measure)?;
    let density = reader.resolve(schema::DENSITY, schema.density, parse_measure)?;

    let extra: BTreeMap<String, String> = schema
        .extra
        .iter()
        .filter_map(|(idx, name)| record.get(*idx).map(|v| (name.clone(), v.to_string())))
        .collect();

    let epi = EpiRecord {
        line,
        date: parsed_date,
        year,
        month,
        region: record.get(schema.region).unwrap_or("").to_string(),
        disease: record.get(schema.disease).unwrap_or("").to_string(),
        confirmed_cases,
        deaths,
        avg_temperature,
        avg_humidity,
        avg_wind_speed,
        density,
        extra,
    };

    Ok((epi, reader.warnings))
}
