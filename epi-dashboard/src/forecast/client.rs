//! Client HTTP du backend de prévision

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::{debug, info};

use super::{ForecastDisease, ForecastPayload, ForecastSet};

/// Délai maximal d'une requête
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid auth token: {0}")]
    InvalidToken(String),

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} on {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid JSON from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Client du backend `/epi/predict/*`
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    /// Crée un client; le jeton de session est envoyé en `Bearer` s'il existe
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ForecastError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ForecastError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ForecastError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Récupère la prévision d'une maladie
    pub async fn fetch(&self, disease: ForecastDisease) -> Result<ForecastPayload, ForecastError> {
        let endpoint = disease.endpoint();
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "Requête de prévision");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ForecastError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ForecastError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        let payload: ForecastPayload = response.json().await.map_err(|source| {
            ForecastError::Decode {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        debug!(
            disease = %disease,
            regions = payload.regions.len(),
            "Prévision reçue"
        );
        Ok(payload)
    }

    /// Récupère les deux prévisions en parallèle
    ///
    /// Échoue si l'une des deux requêtes échoue: les prévisions sont
    /// affichées ensemble.
    pub async fn fetch_all(&self) -> Result<ForecastSet, ForecastError> {
        let (malaria, dengue) = tokio::try_join!(
            self.fetch(ForecastDisease::Malaria),
            self.fetch(ForecastDisease::Dengue)
        )?;

        info!(
            malaria = malaria.regions.len(),
            dengue = dengue.regions.len(),
            "Prévisions récupérées"
        );

        Ok(ForecastSet {
            fetched_at: Utc::now(),
            malaria,
            dengue,
        })
    }
}
