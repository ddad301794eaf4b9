//! Types d'erreurs pour le crate epidata

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs fatales pouvant survenir lors du chargement ou de la jointure
///
/// Les problèmes ligne par ligne ne sont pas des erreurs: ils sont collectés
/// dans [`crate::IngestReport`] sous forme de [`crate::RowIssue`].
#[derive(Debug, Error)]
pub enum EpiError {
    /// Erreur d'I/O lors de la lecture d'un fichier
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Erreur du lecteur/écrivain CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// GeoJSON illisible
    #[error("Invalid GeoJSON in {source_name}: {reason}")]
    GeoJson { source_name: String, reason: String },

    /// Colonne obligatoire absente de l'en-tête
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Fichier vide ou sans en-tête
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Couche mal configurée pour l'opération demandée
    #[error("Invalid layer {layer}: {reason}")]
    InvalidLayer { layer: String, reason: String },
}

impl EpiError {
    /// Crée une erreur d'I/O avec le chemin concerné
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Crée une erreur GeoJSON avec contexte
    pub fn geojson(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GeoJson {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de couche invalide
    pub fn invalid_layer(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayer {
            layer: layer.into(),
            reason: reason.into(),
        }
    }
}
