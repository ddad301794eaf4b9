//! Décodage des octets source et détection du séparateur

use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Décode le contenu en UTF-8, ou en Windows-1252 si les octets ne sont pas
/// de l'UTF-8 valide (exports tableur). Le booléen indique le repli.
pub fn decode(data: &[u8]) -> (Cow<'_, str>, bool) {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    // Validation SIMD, le cas nominal
    match simdutf8::basic::from_utf8(data) {
        Ok(text) => (Cow::Borrowed(text), false),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(data);
            (Cow::Owned(decoded.into_owned()), true)
        }
    }
}

/// Détecte le séparateur (`;` ou `,`) sur la ligne d'en-tête
pub fn sniff_delimiter(text: &str) -> u8 {
    let bytes = text.as_bytes();
    let header_end = memchr::memchr(b'\n', bytes).unwrap_or(bytes.len());
    let header = &bytes[..header_end];

    let semicolons = memchr::memchr_iter(b';', header).count();
    let commas = memchr::memchr_iter(b',', header).count();

    if semicolons > commas {
        b';'
    } else {
        b','
    }
}
