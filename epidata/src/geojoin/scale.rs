//! Échelle de couleurs quantifiée pour la carte choroplèthe

use serde::{Deserialize, Serialize};

/// Remplissage d'une feature sans donnée
pub const NO_DATA_FILL: &str = "#F5F4F6";

const LIGHT_PALETTE: [&str; 9] = [
    "#e6f3ff", "#b3d9ff", "#80bfff", "#4da6ff", "#1a8cff", "#0073e6", "#0059b3", "#004080",
    "#00264d",
];

const DARK_PALETTE: [&str; 9] = [
    "#1a365d", "#2c5282", "#2b6cb0", "#3182ce", "#4299e1", "#63b3ed", "#90cdf4", "#bee3f8",
    "#ebf8ff",
];

/// Thème de la palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn palette(self) -> &'static [&'static str] {
        match self {
            Theme::Light => &LIGHT_PALETTE,
            Theme::Dark => &DARK_PALETTE,
        }
    }
}

/// Tranche de légende: `[lower, upper)` -> couleur
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBin {
    pub lower: f64,
    pub upper: f64,
    pub fill: &'static str,
}

/// Échelle quantifiée: `[0, max]` découpé en segments égaux, un par couleur
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    max: f64,
    theme: Theme,
}

impl ColorScale {
    pub fn new(max_cases: u64, theme: Theme) -> Self {
        Self {
            max: max_cases as f64,
            theme,
        }
    }

    /// Couleur d'une valeur; les valeurs hors domaine sont ramenées aux bornes
    pub fn fill(&self, cases: u64) -> &'static str {
        let palette = self.theme.palette();
        if self.max <= 0.0 {
            return palette[0];
        }
        let n = palette.len();
        let idx = (cases as f64 * n as f64 / self.max).floor() as usize;
        palette[idx.min(n - 1)]
    }

    /// Tranches de la légende, de la plus claire à la plus foncée
    pub fn legend(&self) -> Vec<LegendBin> {
        let palette = self.theme.palette();
        let step = self.max / palette.len() as f64;
        palette
            .iter()
            .copied()
            .enumerate()
            .map(|(i, fill)| LegendBin {
                lower: step * i as f64,
                upper: step * (i + 1) as f64,
                fill,
            })
            .collect()
    }
}
