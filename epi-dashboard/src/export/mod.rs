//! Modules d'export (GeoJSON; le CSV est fourni par `epidata::export`)

pub mod geojson;
