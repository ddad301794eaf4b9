//! Export CSV du jeu filtré

use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

use crate::ingest::date::format_date;
use crate::ingest::schema;
use crate::types::EpiRecord;
use crate::EpiError;

/// Nom du fichier d'export horodaté
pub fn export_file_name(timestamp: NaiveDateTime) -> String {
    format!(
        "dashboard-epidemiologie-{}.csv",
        timestamp.format("%Y-%m-%d-%H-%M-%S")
    )
}

/// Colonnes exportées: en-têtes source puis `Annee` et `Mois`
pub fn export_headers(source_headers: &[String]) -> Vec<String> {
    let mut headers = source_headers.to_vec();
    for derived in [schema::YEAR, schema::MONTH] {
        if !headers.iter().any(|h| h == derived) {
            headers.push(derived.to_string());
        }
    }
    headers
}

/// Valeur d'une colonne pour un enregistrement
fn field(record: &EpiRecord, header: &str) -> String {
    match header {
        schema::DATE => format_date(record.date),
        schema::DISEASE => record.disease.clone(),
        schema::CASES => record.confirmed_cases.to_string(),
        schema::DEATHS => record.deaths.to_string(),
        schema::TEMPERATURE => record.avg_temperature.to_string(),
        schema::HUMIDITY => record.avg_humidity.to_string(),
        schema::WIND => record.avg_wind_speed.to_string(),
        schema::DENSITY => record.density.to_string(),
        schema::YEAR => record.year.clone(),
        schema::MONTH => record.month.clone(),
        other => record.column(other).unwrap_or_default().to_string(),
    }
}

/// Écrit les enregistrements en CSV, tous les champs entre guillemets
pub fn write_csv<'a, W, I>(
    writer: W,
    source_headers: &[String],
    records: I,
) -> Result<usize, EpiError>
where
    W: Write,
    I: IntoIterator<Item = &'a EpiRecord>,
{
    let headers = export_headers(source_headers);
    let mut csv = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    csv.write_record(&headers)?;

    let mut count = 0;
    for record in records {
        csv.write_record(headers.iter().map(|h| field(record, h)))?;
        count += 1;
    }
    csv.flush().map_err(|e| EpiError::io("<csv>", e))?;
    Ok(count)
}

/// Écrit l'export dans `dir` et retourne le chemin du fichier
pub fn export_to_dir<'a, I>(
    dir: &Path,
    timestamp: NaiveDateTime,
    source_headers: &[String],
    records: I,
) -> Result<std::path::PathBuf, EpiError>
where
    I: IntoIterator<Item = &'a EpiRecord>,
{
    let path = dir.join(export_file_name(timestamp));
    let file = std::fs::File::create(&path).map_err(|e| EpiError::io(&path, e))?;
    let count = write_csv(std::io::BufWriter::new(file), source_headers, records)?;
    info!(path = %path.display(), rows = count, "Export CSV écrit");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_bytes, IngestPolicy};
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Date;Region;District;Maladie;Cas_confirmes;Morts;Temperature_moy;Humidite_moy;Vent_vit_moy;Densite
15/03/2023;Dakar;Pikine;Paludisme;120;3;28.4;71;3.2;5735
02/04/2023;Thiès;Mbour;Dengue;4;0;30.1;65;4.1;260
";

    #[test]
    fn test_export_file_name() {
        let ts = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        assert_eq!(
            export_file_name(ts),
            "dashboard-epidemiologie-2024-07-01-09-05-03.csv"
        );
    }

    #[test]
    fn test_export_headers_no_duplicate() {
        let headers = vec!["Date".to_string(), "Annee".to_string()];
        assert_eq!(export_headers(&headers), vec!["Date", "Annee", "Mois"]);
    }

    #[test]
    fn test_write_csv_quotes_everything() {
        let dataset = parse_bytes(SAMPLE.as_bytes(), IngestPolicy::Strict).unwrap();
        let mut out = Vec::new();
        let count = write_csv(&mut out, &dataset.headers, &dataset.records).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "\"Date\",\"Region\",\"District\",\"Maladie\",\"Cas_confirmes\",\"Morts\",\
             \"Temperature_moy\",\"Humidite_moy\",\"Vent_vit_moy\",\"Densite\",\"Annee\",\"Mois\""
        );
        assert_eq!(
            lines[1],
            "\"15/03/2023\",\"Dakar\",\"Pikine\",\"Paludisme\",\"120\",\"3\",\
             \"28.4\",\"71\",\"3.2\",\"5735\",\"2023\",\"03\""
        );
    }
}
