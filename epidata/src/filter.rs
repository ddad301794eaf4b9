//! Filtres année / maladie / mois

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::types::EpiRecord;

/// Libellé "toutes les années / maladies"
pub const ALL_FEMININE: &str = "Toutes";
/// Libellé "tous les mois"
pub const ALL_MASCULINE: &str = "Tous";

/// Sélection d'une dimension: joker ou valeur exacte
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Construit une sélection depuis un libellé d'interface
    ///
    /// `Toutes`, `Tous` et la chaîne vide valent joker.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_FEMININE || value == ALL_MASCULINE {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("*"),
            Selection::Only(value) => f.write_str(value),
        }
    }
}

/// Sélection courante du tableau de bord
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterState {
    pub year: Selection,
    pub disease: Selection,
    pub month: Selection,
}

impl FilterState {
    /// Construit un filtre depuis les libellés (`Toutes`, `2023`, `03`...)
    ///
    /// Un mois saisi sur un chiffre ("3") est complété à "03".
    pub fn new(year: &str, disease: &str, month: &str) -> Self {
        let month = match Selection::parse(month) {
            Selection::Only(m) if m.len() == 1 && m.chars().all(|c| c.is_ascii_digit()) => {
                Selection::Only(format!("0{}", m))
            }
            other => other,
        };
        Self {
            year: Selection::parse(year),
            disease: Selection::parse(disease),
            month,
        }
    }

    pub fn matches(&self, record: &EpiRecord) -> bool {
        self.year.matches(&record.year)
            && self.disease.matches(&record.disease)
            && self.month.matches(&record.month)
    }

    pub fn is_wildcard(&self) -> bool {
        self.year.is_all() && self.disease.is_all() && self.month.is_all()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year={} disease={} month={}",
            self.year, self.disease, self.month
        )
    }
}

/// Filtre les enregistrements (conjonction des trois dimensions)
pub fn filter<'a, I>(records: I, state: &FilterState) -> Vec<&'a EpiRecord>
where
    I: IntoIterator<Item = &'a EpiRecord>,
{
    records.into_iter().filter(|r| state.matches(r)).collect()
}

/// Valeurs observées, pour construire les sélecteurs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    /// Années, de la plus récente à la plus ancienne
    pub years: Vec<String>,
    /// Maladies, ordre alphabétique
    pub diseases: Vec<String>,
    /// Mois "01".."12", ordre croissant
    pub months: Vec<String>,
}

impl Facets {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EpiRecord>,
    {
        let mut years = BTreeSet::new();
        let mut diseases = BTreeSet::new();
        let mut months = BTreeSet::new();

        for record in records {
            years.insert(record.year.clone());
            diseases.insert(record.disease.clone());
            months.insert(record.month.clone());
        }

        Self {
            years: years.into_iter().rev().collect(),
            diseases: diseases.into_iter().collect(),
            months: months.into_iter().collect(),
        }
    }
}

/// Nom français d'un mois "01".."12"
pub fn month_name_fr(month: &str) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "Janvier",
        "Février",
        "Mars",
        "Avril",
        "Mai",
        "Juin",
        "Juillet",
        "Août",
        "Septembre",
        "Octobre",
        "Novembre",
        "Décembre",
    ];
    let idx: usize = month.parse().ok()?;
    NAMES.get(idx.checked_sub(1)?).copied()
}
