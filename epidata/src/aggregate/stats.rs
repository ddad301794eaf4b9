//! Moyennes avec sentinelle d'absence

use std::fmt;

use serde::{Serialize, Serializer};

/// Libellé affiché quand aucune valeur n'est disponible
pub const ABSENT_LABEL: &str = "N/A";

/// Moyenne d'une série, ou absence de donnée
///
/// Distinct d'une moyenne nulle: une série vide ne donne jamais `0` ni `NaN`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Mean {
    Value(f64),
    #[default]
    Absent,
}

impl Mean {
    /// Moyenne des valeurs finies de la série
    pub fn of(values: &[f64]) -> Self {
        let (sum, count) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

        if count == 0 {
            Mean::Absent
        } else {
            Mean::Value(sum / count as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Mean::Value(v) => Some(*v),
            Mean::Absent => None,
        }
    }
}

/// Une décimale, ou "N/A"
impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mean::Value(v) => write!(f, "{:.1}", v),
            Mean::Absent => f.write_str(ABSENT_LABEL),
        }
    }
}

/// Sérialisé en nombre, ou `null` si absent
impl Serialize for Mean {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}
