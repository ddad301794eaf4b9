//! État de session persistant (jeton d'authentification, cache de prévisions)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::forecast::ForecastSet;

/// Contenu du fichier de session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub forecasts: Option<ForecastSet>,
}

/// Session chargée depuis un fichier JSON, sauvegardée explicitement
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    state: SessionState,
}

impl SessionStore {
    /// Ouvre la session; un fichier absent donne une session vide
    ///
    /// Un fichier illisible est ignoré avec un warning, il sera écrasé à la
    /// prochaine sauvegarde.
    pub fn open(path: &Path) -> Result<Self> {
        let state = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Session illisible, réinitialisée");
                    SessionState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Pas de session existante");
                SessionState::default()
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read session: {}", path.display()))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.state.token = token.filter(|t| !t.trim().is_empty());
    }

    pub fn forecasts(&self) -> Option<&ForecastSet> {
        self.state.forecasts.as_ref()
    }

    pub fn set_forecasts(&mut self, forecasts: ForecastSet) {
        self.state.forecasts = Some(forecasts);
    }

    /// Vide la session (déconnexion)
    pub fn clear(&mut self) {
        self.state = SessionState::default();
    }

    /// Écrit la session sur disque
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, json)
            .context(format!("Failed to write session: {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Session sauvegardée");
        Ok(())
    }
}
