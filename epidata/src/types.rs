//! Types de données pour le crate epidata

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Une observation épidémiologique enrichie (une ligne CSV valide)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpiRecord {
    /// Numéro de ligne dans le fichier source
    pub line: u64,

    /// Date d'observation (colonne `Date`, format JJ/MM/AAAA)
    pub date: NaiveDate,

    /// Année dérivée de la date, sur 4 chiffres ("2023")
    pub year: String,

    /// Mois dérivé de la date, sur 2 chiffres ("03")
    pub month: String,

    /// Région administrative (colonne `Region`)
    pub region: String,

    /// Maladie (colonne `Maladie`, ex: "Paludisme", "Dengue")
    pub disease: String,

    /// Cas confirmés (colonne `Cas_confirmes`)
    pub confirmed_cases: u64,

    /// Décès (colonne `Morts`)
    pub deaths: u64,

    /// Température moyenne en °C (colonne `Temperature_moy`)
    pub avg_temperature: f64,

    /// Humidité moyenne en % (colonne `Humidite_moy`)
    pub avg_humidity: f64,

    /// Vitesse moyenne du vent (colonne `Vent_vit_moy`)
    pub avg_wind_speed: f64,

    /// Densité de population (colonne `Densite`)
    pub density: f64,

    /// Autres colonnes du CSV (en-tête -> valeur), ex: `District`
    pub extra: BTreeMap<String, String>,
}

impl EpiRecord {
    /// Valeur d'une colonne de jointure (`Region` ou toute colonne annexe)
    pub fn column(&self, name: &str) -> Option<&str> {
        match name {
            "Region" | "Région" => Some(self.region.as_str()),
            "Maladie" => Some(self.disease.as_str()),
            _ => self.extra.get(name).map(String::as_str),
        }
    }
}

/// Politique appliquée aux valeurs numériques illisibles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestPolicy {
    /// Valeur par défaut (0 / 0.0) et warning
    #[default]
    Lenient,
    /// Ligne rejetée
    Strict,
}

/// Niveau de sévérité d'un problème de ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Ligne exclue du jeu de données
    Error,
    /// Ligne conservée avec une valeur par défaut
    Warning,
}

/// Nature d'un problème détecté à l'ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Date absente ou invalide
    InvalidDate,
    /// Champ numérique vide
    MissingValue,
    /// Champ numérique illisible
    InvalidNumber,
    /// Compteur négatif
    NegativeCount,
    /// Compteur non entier, tronqué
    TruncatedCount,
    /// Colonne absente de l'en-tête
    MissingColumn,
    /// Fichier non UTF-8, décodé en Windows-1252
    Encoding,
    /// Ligne CSV mal formée
    Malformed,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::InvalidDate => "invalid date",
            IssueKind::MissingValue => "missing value",
            IssueKind::InvalidNumber => "invalid number",
            IssueKind::NegativeCount => "negative count",
            IssueKind::TruncatedCount => "truncated count",
            IssueKind::MissingColumn => "missing column",
            IssueKind::Encoding => "encoding",
            IssueKind::Malformed => "malformed row",
        };
        f.write_str(label)
    }
}

/// Problème rencontré sur une ligne (ou sur le fichier si `line` vaut 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub line: u64,
    pub column: Option<String>,
    pub kind: IssueKind,
    pub severity: Severity,
    /// Valeur brute en cause
    pub value: Option<String>,
}

impl RowIssue {
    pub fn warning(line: u64, column: &str, kind: IssueKind, value: &str) -> Self {
        Self {
            line,
            column: Some(column.to_string()),
            kind,
            severity: Severity::Warning,
            value: Some(value.to_string()),
        }
    }

    pub fn error(line: u64, column: Option<&str>, kind: IssueKind, value: Option<&str>) -> Self {
        Self {
            line,
            column: column.map(str::to_string),
            kind,
            severity: Severity::Error,
            value: value.map(str::to_string),
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)?;
        if let Some(column) = &self.column {
            write!(f, " in {}", column)?;
        }
        if let Some(value) = &self.value {
            write!(f, " ({:?})", value)?;
        }
        Ok(())
    }
}

/// Bilan de l'ingestion d'un fichier CSV
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Lignes de données lues (hors en-tête et lignes vides)
    pub rows_read: usize,
    /// Lignes conservées
    pub rows_kept: usize,
    /// Lignes exclues
    pub rows_rejected: usize,
    /// Problèmes rencontrés, dans l'ordre du fichier
    pub issues: Vec<RowIssue>,
}

impl IngestReport {
    pub fn warnings(&self) -> impl Iterator<Item = &RowIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &RowIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Nombre de problèmes par nature
    pub fn count_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Jeu de données chargé
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Enregistrements valides, dans l'ordre du fichier
    pub records: Vec<EpiRecord>,

    /// En-têtes du fichier source (pour l'export)
    pub headers: Vec<String>,

    /// Bilan de l'ingestion
    pub report: IngestReport,

    /// Empreinte BLAKE3 (hex) des octets source
    pub fingerprint: String,
}
