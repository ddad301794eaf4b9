//! Ingestion du CSV épidémiologique
//!
//! Pipeline: octets -> décodage -> détection du séparateur -> résolution de
//! l'en-tête -> une `Result` par ligne (enregistrement ou problème).

pub mod date;
pub mod decode;
pub mod row;
pub mod schema;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::types::{Dataset, IngestPolicy, IngestReport, IssueKind, RowIssue, Severity};
use crate::EpiError;

pub use schema::Schema;

/// Charge un fichier CSV depuis le disque
pub fn load(path: &Path, policy: IngestPolicy) -> Result<Dataset, EpiError> {
    let data = std::fs::read(path).map_err(|e| EpiError::io(path, e))?;
    info!(path = %path.display(), bytes = data.len(), "Lecture du CSV");
    parse_bytes(&data, policy)
}

/// Parse le contenu brut d'un CSV
pub fn parse_bytes(data: &[u8], policy: IngestPolicy) -> Result<Dataset, EpiError> {
    let fingerprint = hex::encode(blake3::hash(data).as_bytes());

    let (text, fallback) = decode::decode(data);
    if text.trim().is_empty() {
        return Err(EpiError::EmptyInput("no header line".into()));
    }

    let mut report = IngestReport::default();
    if fallback {
        warn!("CSV non UTF-8, décodé en Windows-1252");
        report.issues.push(RowIssue {
            line: 0,
            column: None,
            kind: IssueKind::Encoding,
            severity: Severity::Warning,
            value: Some("windows-1252".into()),
        });
    }

    let delimiter = decode::sniff_delimiter(&text);
    debug!(delimiter = %(delimiter as char), "Séparateur détecté");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let (schema, header_issues) = Schema::resolve(&headers, policy)?;
    report.issues.extend(header_issues);

    let mut records = Vec::new();
    for result in reader.records() {
        report.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                debug!(line, error = %e, "Ligne CSV illisible");
                report.rows_rejected += 1;
                report
                    .issues
                    .push(RowIssue::error(line, None, IssueKind::Malformed, None));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        match row::parse_row(&record, line, &schema, policy) {
            Ok((epi, warnings)) => {
                report.issues.extend(warnings);
                records.push(epi);
            }
            Err(issue) => {
                debug!(%issue, "Ligne exclue");
                report.rows_rejected += 1;
                report.issues.push(issue);
            }
        }
    }
    report.rows_kept = records.len();

    info!(
        read = report.rows_read,
        kept = report.rows_kept,
        rejected = report.rows_rejected,
        warnings = report.warnings().count(),
        "Ingestion terminée"
    );

    Ok(Dataset {
        records,
        headers: headers.iter().map(str::to_string).collect(),
        report,
        fingerprint,
    })
}
