//! Configuration: catalogue des couches et paramètres d'environnement

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use epidata::{AdminLayerConfig, GeometryKind};

/// Fichier de session par défaut
const DEFAULT_SESSION_FILE: &str = ".epi-dashboard/session.json";

/// Catalogue des couches (identifiant -> configuration)
#[derive(Debug, Deserialize, Serialize)]
pub struct LayerCatalog {
    #[serde(flatten)]
    pub layers: BTreeMap<String, AdminLayerConfig>,
}

impl LayerCatalog {
    /// Charge un catalogue depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read layer config: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse layer config JSON")
    }

    /// Charge un catalogue embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "senegal" => Self::load_embedded(include_str!("presets/senegal.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: senegal", preset),
        }
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        match spec {
            "senegal" => Self::from_preset(spec),
            _ => Self::load(Path::new(spec)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded layer config")
    }

    /// Couches choroplèthes (jointes au CSV)
    pub fn admin_layers(&self) -> impl Iterator<Item = (&String, &AdminLayerConfig)> {
        self.of_kind(GeometryKind::Polygon)
    }

    /// Couches de points
    pub fn point_layers(&self) -> impl Iterator<Item = (&String, &AdminLayerConfig)> {
        self.of_kind(GeometryKind::Point)
    }

    fn of_kind(&self, kind: GeometryKind) -> impl Iterator<Item = (&String, &AdminLayerConfig)> {
        self.layers
            .iter()
            .filter(move |(_, l)| l.geometry_type == kind)
    }

    /// Couche choroplèthe par identifiant
    pub fn admin_layer(&self, id: &str) -> Result<&AdminLayerConfig> {
        Self::find(self.admin_layers(), id, "choropleth")
    }

    /// Couche de points par identifiant
    pub fn point_layer(&self, id: &str) -> Result<&AdminLayerConfig> {
        Self::find(self.point_layers(), id, "point")
    }

    fn find<'a>(
        layers: impl Iterator<Item = (&'a String, &'a AdminLayerConfig)>,
        id: &str,
        kind: &str,
    ) -> Result<&'a AdminLayerConfig> {
        let mut available = Vec::new();
        for (layer_id, layer) in layers {
            if layer_id == id {
                return Ok(layer);
            }
            available.push(layer_id.as_str());
        }
        anyhow::bail!(
            "Unknown {} layer: {}. Available: {}",
            kind,
            id,
            available.join(", ")
        )
    }
}

/// Paramètres issus de l'environnement (`.env` compris)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// URL du backend de prévision (`EPI_BACKEND_URL`)
    pub backend_url: Option<String>,
    /// Fichier de session (`EPI_SESSION_FILE`)
    pub session_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl Settings {
    /// Charge les paramètres depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self {
            backend_url: std::env::var("EPI_BACKEND_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            session_file: std::env::var("EPI_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    /// Applique les options de ligne de commande
    pub fn with_overrides(mut self, backend: Option<String>, state: Option<PathBuf>) -> Self {
        if let Some(backend) = backend {
            self.backend_url = Some(backend);
        }
        if let Some(state) = state {
            self.session_file = state;
        }
        self
    }

    /// URL du backend, obligatoire pour les prévisions
    pub fn require_backend(&self) -> Result<&str> {
        self.backend_url
            .as_deref()
            .context("No forecast backend configured: set EPI_BACKEND_URL or pass --backend")
    }
}
