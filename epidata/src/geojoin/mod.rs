//! Couches GeoJSON, jointure des métriques et échelle choroplèthe

pub mod infra;
pub mod join;
pub mod layer;
pub mod normalize;
pub mod scale;

pub use infra::{count_within, load_points, InfraPoint};
pub use join::{
    join_metrics_to_features, FeaturePayload, JoinStats, JoinedFeature, LayerJoin, RegionPayload,
};
pub use layer::{parse_feature_collection, read_feature_collection, AdminLayerConfig, GeometryKind};
pub use normalize::normalize_name;
pub use scale::{ColorScale, LegendBin, Theme, NO_DATA_FILL};
