//! Jointure des métriques agrégées aux features d'une couche administrative

use std::collections::BTreeSet;

use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::layer::AdminLayerConfig;
use super::scale::{ColorScale, Theme, NO_DATA_FILL};
use crate::aggregate::{GroupMetrics, Mean, RegionMetrics};
use crate::EpiError;

/// Contenu de l'info-bulle d'une feature jointe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPayload {
    /// Libellé côté CSV
    pub label: String,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub avg_temperature: Mean,
    pub avg_humidity: Mean,
    pub density: Option<f64>,
    pub fill: &'static str,
}

impl RegionPayload {
    fn new(metrics: &GroupMetrics, scale: &ColorScale) -> Self {
        Self {
            label: metrics.label.clone(),
            total_cases: metrics.total_cases,
            total_deaths: metrics.total_deaths,
            avg_temperature: metrics.avg_temperature(),
            avg_humidity: metrics.avg_humidity(),
            density: metrics.density,
            fill: scale.fill(metrics.total_cases),
        }
    }
}

/// Données d'une feature, ou absence explicite de données
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeaturePayload {
    Data(RegionPayload),
    NoData,
}

impl FeaturePayload {
    pub fn has_data(&self) -> bool {
        matches!(self, FeaturePayload::Data(_))
    }

    pub fn fill(&self) -> &'static str {
        match self {
            FeaturePayload::Data(payload) => payload.fill,
            FeaturePayload::NoData => NO_DATA_FILL,
        }
    }
}

/// Une feature de la couche et son résultat de jointure
#[derive(Debug, Clone)]
pub struct JoinedFeature {
    /// Clé normalisée (vide si la feature n'a pas de nom)
    pub key: String,
    /// Nom brut côté GeoJSON
    pub name: Option<String>,
    pub payload: FeaturePayload,
    /// Nombre d'infrastructures contenues, si la couche de points est chargée
    pub infrastructures: Option<usize>,
    /// Feature source, géométrie intacte
    pub feature: Feature,
}

impl JoinedFeature {
    /// Feature GeoJSON enrichie des propriétés d'affichage
    pub fn to_geojson_feature(&self) -> Feature {
        let mut feature = self.feature.clone();

        feature.set_property("join_key", self.key.clone());
        feature.set_property("has_data", self.payload.has_data());
        feature.set_property("fill", self.payload.fill());

        match &self.payload {
            FeaturePayload::Data(data) => {
                feature.set_property("label", data.label.clone());
                feature.set_property("cases", data.total_cases);
                feature.set_property("deaths", data.total_deaths);
                feature.set_property("avg_temperature", mean_value(data.avg_temperature));
                feature.set_property("avg_temperature_label", data.avg_temperature.to_string());
                feature.set_property("avg_humidity", mean_value(data.avg_humidity));
                feature.set_property("avg_humidity_label", data.avg_humidity.to_string());
                feature.set_property("density", json!(data.density));
            }
            FeaturePayload::NoData => {
                feature.set_property("label", self.name.clone().unwrap_or_default());
            }
        }

        if let Some(count) = self.infrastructures {
            feature.set_property("infrastructures", count);
        }
        feature
    }
}

fn mean_value(mean: Mean) -> Value {
    json!(mean.value())
}

/// Bilan de la jointure
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinStats {
    pub features: usize,
    pub matched: usize,
    /// Noms GeoJSON sans métrique correspondante
    pub unmatched_features: Vec<String>,
    /// Clés CSV sans feature correspondante
    pub orphan_metrics: Vec<String>,
}

/// Couche jointe, recalculée à chaque changement de filtre
#[derive(Debug, Clone)]
pub struct LayerJoin {
    pub layer: String,
    pub scale: ColorScale,
    pub features: Vec<JoinedFeature>,
    pub stats: JoinStats,
}

impl LayerJoin {
    /// FeatureCollection prête à l'affichage
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .map(JoinedFeature::to_geojson_feature)
                .collect(),
            foreign_members: None,
        }
    }
}

/// Joint les métriques régionales aux features de la couche
///
/// La jointure se fait par égalité stricte des noms normalisés. Une feature
/// sans correspondance est conservée avec `FeaturePayload::NoData`.
pub fn join_metrics_to_features(
    metrics: &RegionMetrics,
    collection: &FeatureCollection,
    layer: &AdminLayerConfig,
    theme: Theme,
) -> Result<LayerJoin, EpiError> {
    // Vérifie que la couche est joignable
    layer.join_column()?;

    let max_cases = metrics.values().map(|m| m.total_cases).max().unwrap_or(0);
    let scale = ColorScale::new(max_cases, theme);

    let mut stats = JoinStats {
        features: collection.features.len(),
        ..Default::default()
    };
    let mut used_keys = BTreeSet::new();

    let features = collection
        .features
        .iter()
        .enumerate()
        .map(|(idx, feature)| {
            let name = layer.feature_name(feature);
            let key = layer.join_key(feature).unwrap_or_default();

            let payload = match metrics.get(&key) {
                Some(group) if !key.is_empty() => {
                    stats.matched += 1;
                    used_keys.insert(key.clone());
                    FeaturePayload::Data(RegionPayload::new(group, &scale))
                }
                _ => {
                    let label = name
                        .clone()
                        .or_else(|| layer.feature_key(feature))
                        .unwrap_or_else(|| format!("#{}", idx));
                    debug!(layer = %layer.name, feature = %label, "Feature sans donnée");
                    stats.unmatched_features.push(label);
                    FeaturePayload::NoData
                }
            };

            JoinedFeature {
                key,
                name,
                payload,
                infrastructures: None,
                feature: feature.clone(),
            }
        })
        .collect();

    stats.orphan_metrics = metrics
        .keys()
        .filter(|k| !used_keys.contains(*k))
        .cloned()
        .collect();

    if !stats.orphan_metrics.is_empty() {
        warn!(
            layer = %layer.name,
            orphans = ?stats.orphan_metrics,
            "Noms CSV sans feature correspondante"
        );
    }
    info!(
        layer = %layer.name,
        features = stats.features,
        matched = stats.matched,
        unmatched = stats.unmatched_features.len(),
        "Jointure terminée"
    );

    Ok(LayerJoin {
        layer: layer.name.clone(),
        scale,
        features,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by_region;
    use crate::geojoin::layer::{parse_feature_collection, GeometryKind};
    use crate::types::EpiRecord;
    use chrono::NaiveDate;

    fn layer() -> AdminLayerConfig {
        AdminLayerConfig {
            name: "Régions".into(),
            path: "regions.geojson".into(),
            geometry_type: GeometryKind::Polygon,
            key_property: None,
            name_property: "NOMREG".into(),
            csv_join_column: Some("Region".into()),
        }
    }

    fn record(region: &str, cases: u64) -> EpiRecord {
        EpiRecord {
            line: 0,
            date: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
            year: "2023".into(),
            month: "03".into(),
            region: region.into(),
            disease: "Paludisme".into(),
            confirmed_cases: cases,
            deaths: 1,
            avg_temperature: 28.0,
            avg_humidity: 70.0,
            avg_wind_speed: 3.0,
            density: 250.0,
            extra: Default::default(),
        }
    }

    fn collection() -> FeatureCollection {
        parse_feature_collection(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"NOMREG":"THIÈS"},"geometry":null},
                {"type":"Feature","properties":{"NOMREG":"DAKAR"},"geometry":null},
                {"type":"Feature","properties":{"NOMREG":"KOLDA"},"geometry":null},
                {"type":"Feature","properties":{},"geometry":null}
            ]}"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_join_matches_normalized_names() {
        let records = vec![record("thiès", 40), record("Dakar", 90), record("Thies", 5)];
        let metrics = aggregate_by_region(&records, "Region");

        let join =
            join_metrics_to_features(&metrics, &collection(), &layer(), Theme::Light).unwrap();

        assert_eq!(join.stats.features, 4);
        assert_eq!(join.stats.matched, 2);
        assert_eq!(join.stats.unmatched_features, vec!["KOLDA", "#3"]);
        // "Thies" sans accent ne rejoint pas "THIÈS"
        assert_eq!(join.stats.orphan_metrics, vec!["THIES"]);

        let thies = &join.features[0];
        assert_eq!(thies.key, "THIÈS");
        match &thies.payload {
            FeaturePayload::Data(data) => {
                assert_eq!(data.total_cases, 40);
                assert_eq!(data.label, "thiès");
            }
            FeaturePayload::NoData => panic!("THIÈS should have data"),
        }
        assert_eq!(join.features[1].payload.fill(), "#00264d");
    }

    #[test]
    fn test_unmatched_features_are_kept() {
        let join = join_metrics_to_features(
            &RegionMetrics::new(),
            &collection(),
            &layer(),
            Theme::Light,
        )
        .unwrap();

        assert_eq!(join.features.len(), 4);
        assert!(join.features.iter().all(|f| !f.payload.has_data()));
        assert!(join
            .features
            .iter()
            .all(|f| f.payload.fill() == NO_DATA_FILL));
    }

    #[test]
    fn test_geojson_properties() {
        let records = vec![record("Dakar", 90)];
        let metrics = aggregate_by_region(&records, "Region");
        let join =
            join_metrics_to_features(&metrics, &collection(), &layer(), Theme::Light).unwrap();
        let output = join.to_feature_collection();

        let dakar = &output.features[1];
        assert_eq!(dakar.property("cases"), Some(&json!(90)));
        assert_eq!(dakar.property("avg_temperature_label"), Some(&json!("28.0")));
        assert_eq!(dakar.property("has_data"), Some(&json!(true)));

        let kolda = &output.features[2];
        assert_eq!(kolda.property("has_data"), Some(&json!(false)));
        assert_eq!(kolda.property("fill"), Some(&json!(NO_DATA_FILL)));
        assert_eq!(kolda.property("cases"), None);
        assert_eq!(kolda.property("NOMREG"), Some(&json!("KOLDA")));
    }

    #[test]
    fn test_point_layer_is_rejected() {
        let points = AdminLayerConfig {
            geometry_type: GeometryKind::Point,
            ..layer()
        };
        let result =
            join_metrics_to_features(&RegionMetrics::new(), &collection(), &points, Theme::Light);
        assert!(result.is_err());
    }
}
