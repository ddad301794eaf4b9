//! Normalisation des noms pour la jointure CSV <-> GeoJSON

use serde_json::Value;

/// Clé de jointure: espaces de bord retirés, majuscules
///
/// Les accents sont conservés: "Thiès" donne "THIÈS", "Thies" donne
/// "THIES", et les deux ne se joignent pas.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Texte d'une propriété GeoJSON (chaîne ou nombre)
pub fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
