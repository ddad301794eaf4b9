//! Export de la couche jointe en GeoJSON (écriture en flux)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use epidata::geojoin::{JoinedFeature, LayerJoin};

/// Écrit la couche jointe dans un fichier GeoJSON
///
/// Chaque feature porte ses propriétés d'origine plus la charge utile
/// d'info-bulle et la couleur de remplissage.
pub fn export_layer(join: &LayerJoin, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_layer(&mut writer, join)?;
    writer.flush()?;

    Ok(())
}

/// Écrit une FeatureCollection feature par feature
pub fn write_layer<W: Write>(writer: &mut W, join: &LayerJoin) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"FeatureCollection","name":{},"features":["#,
        serde_json::to_string(&join.layer)?
    )?;

    for (i, joined) in join.features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, joined)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, joined: &JoinedFeature) -> Result<()> {
    serde_json::to_writer(&mut *writer, &joined.to_geojson_feature())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epidata::geojoin::parse_feature_collection;
    use epidata::{
        aggregate_by_region, join_metrics_to_features, parse_bytes, AdminLayerConfig,
        GeometryKind, IngestPolicy, Theme,
    };
    use ::geojson::GeoJson;

    fn join() -> LayerJoin {
        let dataset = parse_bytes(
            b"Date,Region,Maladie,Cas_confirmes,Morts\n01/01/2024,Dakar,Dengue,12,1\n",
            IngestPolicy::Lenient,
        )
        .unwrap();
        let metrics = aggregate_by_region(&dataset.records, "Region");
        let collection = parse_feature_collection(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"NOMREG":"DAKAR"},
                 "geometry":{"type":"Point","coordinates":[-17.4,14.7]}},
                {"type":"Feature","properties":{"NOMREG":"LOUGA \"nord\""},"geometry":null}
            ]}"#,
            "test",
        )
        .unwrap();
        let layer = AdminLayerConfig {
            name: "Régions".into(),
            path: "regions.geojson".into(),
            geometry_type: GeometryKind::Polygon,
            key_property: None,
            name_property: "NOMREG".into(),
            csv_join_column: Some("Region".into()),
        };
        join_metrics_to_features(&metrics, &collection, &layer, Theme::Light).unwrap()
    }

    #[test]
    fn test_write_layer_is_valid_geojson() {
        let mut buffer = Vec::new();
        write_layer(&mut buffer, &join()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = parsed else {
            panic!("expected a FeatureCollection");
        };

        assert_eq!(collection.features.len(), 2);
        assert_eq!(
            collection.features[0].property("cases"),
            Some(&serde_json::json!(12))
        );
        assert_eq!(
            collection.features[1].property("has_data"),
            Some(&serde_json::json!(false))
        );
        assert!(text.contains(r#""name":"Régions""#));
    }

    #[test]
    fn test_export_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.geojson");

        export_layer(&join(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(r#"{"type":"FeatureCollection""#));
        assert!(content.contains("#F5F4F6"));
    }
}
