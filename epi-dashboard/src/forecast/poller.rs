//! Rafraîchissement périodique des prévisions

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{ForecastClient, ForecastSet};
use crate::session::SessionStore;

/// Origine des prévisions retournées
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Cache,
    Backend,
}

/// Prévisions du cache si assez récentes, sinon du backend
///
/// Le résultat d'une requête réussie est enregistré dans la session.
pub async fn load_or_fetch(
    client: &ForecastClient,
    store: &mut SessionStore,
    max_age: Duration,
    force: bool,
) -> Result<(ForecastSet, ForecastSource)> {
    if !force {
        if let Some(cached) = store.forecasts().filter(|f| f.is_fresh(Utc::now(), max_age)) {
            info!(fetched_at = %cached.fetched_at, "Prévisions en cache");
            return Ok((cached.clone(), ForecastSource::Cache));
        }
    }

    let set = client.fetch_all().await?;
    store.set_forecasts(set.clone());
    store.save()?;
    Ok((set, ForecastSource::Backend))
}

/// Rafraîchit les prévisions à intervalle fixe jusqu'à `shutdown`
///
/// Le premier tick est immédiat. Une requête en échec est journalisée et
/// retentée au tick suivant; une requête en cours est abandonnée à l'arrêt.
/// Retourne le nombre de rafraîchissements réussis.
pub async fn watch<S, F>(
    client: &ForecastClient,
    store: &mut SessionStore,
    period: Duration,
    shutdown: S,
    mut on_update: F,
) -> Result<usize>
where
    S: Future<Output = ()>,
    F: FnMut(&ForecastSet),
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    futures::pin_mut!(shutdown);

    let mut refreshed = 0;
    loop {
        // L'arrêt est prioritaire sur le tick et sur la requête
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = client.fetch_all() => result,
        };

        match result {
            Ok(set) => {
                store.set_forecasts(set.clone());
                if let Err(e) = store.save() {
                    warn!(error = %e, "Sauvegarde de la session impossible");
                }
                refreshed += 1;
                on_update(&set);
            }
            Err(e) => warn!(error = %e, "Échec du rafraîchissement des prévisions"),
        }
    }

    info!(refreshed, "Arrêt du rafraîchissement");
    Ok(refreshed)
}
