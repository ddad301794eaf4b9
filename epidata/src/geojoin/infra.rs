//! Couche de points (infrastructures sanitaires) et comptage par polygone

use geo::{Contains, Geometry, Point};
use geojson::FeatureCollection;
use rayon::prelude::*;
use tracing::{debug, info};

use super::join::LayerJoin;
use super::layer::{AdminLayerConfig, GeometryKind};
use crate::EpiError;

/// Une infrastructure positionnée
#[derive(Debug, Clone, PartialEq)]
pub struct InfraPoint {
    pub name: Option<String>,
    pub point: Point<f64>,
}

/// Extrait les points d'une couche `point`
///
/// Les features sans géométrie ou non ponctuelles sont ignorées.
pub fn load_points(
    collection: &FeatureCollection,
    layer: &AdminLayerConfig,
) -> Result<Vec<InfraPoint>, EpiError> {
    if layer.geometry_type != GeometryKind::Point {
        return Err(EpiError::invalid_layer(&layer.name, "not a point layer"));
    }

    let mut skipped = 0usize;
    let mut points = Vec::with_capacity(collection.features.len());

    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            skipped += 1;
            continue;
        };
        match Geometry::<f64>::try_from(geometry.value.clone()) {
            Ok(Geometry::Point(point)) => points.push(InfraPoint {
                name: layer.feature_name(feature),
                point,
            }),
            Ok(Geometry::MultiPoint(multi)) => {
                for point in multi {
                    points.push(InfraPoint {
                        name: layer.feature_name(feature),
                        point,
                    });
                }
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(layer = %layer.name, skipped, "Features non ponctuelles ignorées");
    }
    info!(layer = %layer.name, points = points.len(), "Points chargés");
    Ok(points)
}

/// Nombre de points contenus dans une géométrie surfacique
fn count_in(geometry: &Geometry<f64>, points: &[InfraPoint]) -> usize {
    match geometry {
        Geometry::Polygon(polygon) => points.iter().filter(|p| polygon.contains(&p.point)).count(),
        Geometry::MultiPolygon(multi) => points.iter().filter(|p| multi.contains(&p.point)).count(),
        _ => 0,
    }
}

/// Compte les infrastructures de chaque feature de la couche jointe
///
/// Les features sans géométrie surfacique restent à `None`.
pub fn count_within(join: &mut LayerJoin, points: &[InfraPoint]) {
    join.features.par_iter_mut().for_each(|joined| {
        joined.infrastructures = joined
            .feature
            .geometry
            .as_ref()
            .and_then(|g| Geometry::<f64>::try_from(g.value.clone()).ok())
            .filter(|g| matches!(g, Geometry::Polygon(_) | Geometry::MultiPolygon(_)))
            .map(|g| count_in(&g, points));
    });

    let total: usize = join.features.iter().filter_map(|f| f.infrastructures).sum();
    debug!(layer = %join.layer, total, "Infrastructures rattachées");
}
