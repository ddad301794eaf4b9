//! Configuration d'une couche GeoJSON (limites administratives ou points)

use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};
use serde::{Deserialize, Serialize};

use super::normalize::{normalize_name, property_text};
use crate::EpiError;

/// Type de géométrie d'une couche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Polygon,
    Point,
}

/// Couche GeoJSON, définie une fois pour toutes au chargement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLayerConfig {
    /// Libellé affiché (ex: "Régions")
    pub name: String,

    /// Chemin du fichier GeoJSON, relatif à la racine des données
    pub path: String,

    pub geometry_type: GeometryKind,

    /// Propriété identifiant la feature (défaut: `name_property`)
    #[serde(default)]
    pub key_property: Option<String>,

    /// Propriété portant le nom joint au CSV
    pub name_property: String,

    /// Colonne CSV de jointure (absente pour les couches de points)
    #[serde(default)]
    pub csv_join_column: Option<String>,
}

impl AdminLayerConfig {
    /// Colonne CSV de jointure, obligatoire pour une couche choroplèthe
    pub fn join_column(&self) -> Result<&str, EpiError> {
        if self.geometry_type != GeometryKind::Polygon {
            return Err(EpiError::invalid_layer(
                &self.name,
                "point layers cannot be joined to CSV metrics",
            ));
        }
        self.csv_join_column
            .as_deref()
            .ok_or_else(|| EpiError::invalid_layer(&self.name, "csv_join_column is not set"))
    }

    /// Nom brut de la feature
    pub fn feature_name(&self, feature: &Feature) -> Option<String> {
        feature
            .property(&self.name_property)
            .and_then(property_text)
    }

    /// Identifiant de la feature
    pub fn feature_key(&self, feature: &Feature) -> Option<String> {
        let key = self.key_property.as_deref().unwrap_or(&self.name_property);
        feature.property(key).and_then(property_text)
    }

    /// Clé de jointure normalisée de la feature
    pub fn join_key(&self, feature: &Feature) -> Option<String> {
        self.feature_name(feature)
            .map(|name| normalize_name(&name))
            .filter(|key| !key.is_empty())
    }

    /// Charge le GeoJSON de la couche depuis `root`
    pub fn load(&self, root: &Path) -> Result<FeatureCollection, EpiError> {
        read_feature_collection(&root.join(self.path.trim_start_matches('/')))
    }
}

/// Lit un fichier GeoJSON (FeatureCollection ou Feature isolée)
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection, EpiError> {
    let content = std::fs::read_to_string(path).map_err(|e| EpiError::io(path, e))?;
    parse_feature_collection(&content, &path.display().to_string())
}

/// Parse un texte GeoJSON en FeatureCollection
pub fn parse_feature_collection(
    content: &str,
    source_name: &str,
) -> Result<FeatureCollection, EpiError> {
    let geojson: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| EpiError::geojson(source_name, e.to_string()))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(EpiError::geojson(
            source_name,
            "expected a FeatureCollection, found a bare Geometry",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> AdminLayerConfig {
        AdminLayerConfig {
            name: "Régions".into(),
            path: "/delimitations_sen/Sen_regions.geojson".into(),
            geometry_type: GeometryKind::Polygon,
            key_property: None,
            name_property: "NOMREG".into(),
            csv_join_column: Some("Region".into()),
        }
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NOMREG": " thiès ", "CODE": 7},
             "geometry": {"type": "Point", "coordinates": [-16.9, 14.8]}}
        ]
    }"#;

    #[test]
    fn test_join_key() {
        let collection = parse_feature_collection(COLLECTION, "inline").unwrap();
        let feature = &collection.features[0];
        let layer = regions();

        assert_eq!(layer.feature_name(feature).as_deref(), Some(" thiès "));
        assert_eq!(layer.join_key(feature).as_deref(), Some("THIÈS"));

        let keyed = AdminLayerConfig {
            key_property: Some("CODE".into()),
            ..regions()
        };
        assert_eq!(keyed.feature_key(feature).as_deref(), Some("7"));
    }

    #[test]
    fn test_join_column() {
        assert_eq!(regions().join_column().unwrap(), "Region");

        let points = AdminLayerConfig {
            geometry_type: GeometryKind::Point,
            csv_join_column: None,
            ..regions()
        };
        assert!(matches!(
            points.join_column(),
            Err(EpiError::InvalidLayer { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bare_geometry() {
        let err = parse_feature_collection(r#"{"type":"Point","coordinates":[0,0]}"#, "g")
            .unwrap_err();
        assert!(matches!(err, EpiError::GeoJson { .. }));

        let err = parse_feature_collection("{", "broken").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_deserialize_layer() {
        let json = r#"{"name":"Districts","path":"/Sen_districts.geojson",
            "geometry_type":"polygon","name_property":"NAME","csv_join_column":"District"}"#;
        let layer: AdminLayerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(layer.geometry_type, GeometryKind::Polygon);
        assert_eq!(layer.key_property, None);
        assert_eq!(layer.join_column().unwrap(), "District");
    }
}
