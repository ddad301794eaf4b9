//! Dérivation année / mois depuis la colonne `Date` (JJ/MM/AAAA)

use chrono::{Datelike, NaiveDate};

/// Parse une date au format `JJ/MM/AAAA`
///
/// Les trois parties doivent être présentes, l'année sur 4 chiffres, et la
/// date doit exister dans le calendrier (pas de 30/02).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (day, month, year) = (day.trim(), month.trim(), year.trim());
    if day.is_empty() || month.is_empty() || year.len() != 4 {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Année sur 4 chiffres et mois sur 2 chiffres
pub fn year_month(date: NaiveDate) -> (String, String) {
    (
        format!("{:04}", date.year()),
        format!("{:02}", date.month()),
    )
}

/// Formate une date au format source `JJ/MM/AAAA`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
