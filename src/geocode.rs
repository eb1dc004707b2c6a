//! Address geocoding for the restaurant write path.
//!
//! Two providers in fallback order: OpenStreetMap Nominatim, then Photon.
//! A record whose address cannot be resolved is stored without
//! coordinates and simply never shows up in proximity results.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::geo::Point;

const USER_AGENT: &str = "CrescentEats/0.3 (halal-directory)";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("no match for address")]
    NoMatch,
}

/// Blocking geocoding client. Handlers call it through `spawn_blocking`.
pub struct Geocoder {
    offline: bool,
}

impl Geocoder {
    pub fn new(offline: bool) -> Self {
        Self { offline }
    }

    /// Resolve a street address to coordinates, or `None` when offline or
    /// when both providers fail. The caller stores the record either way.
    pub fn geocode(&self, address: &str) -> Option<Point> {
        if self.offline {
            return None;
        }

        match nominatim_lookup(address) {
            Ok(point) => return Some(point),
            Err(e) => warn!(provider = "nominatim", error = %e, "geocoding failed, trying fallback"),
        }

        match photon_lookup(address) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!(provider = "photon", error = %e, "geocoding failed on both providers");
                None
            }
        }
    }
}

// ─── Nominatim ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

fn nominatim_lookup(address: &str) -> Result<Point, GeocodeError> {
    let url = format!(
        "https://nominatim.openstreetmap.org/search?q={}&format=json&limit=1",
        urlencode(address),
    );

    let body = ureq::get(&url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| GeocodeError::Network(e.to_string()))?
        .into_string()
        .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    parse_nominatim_body(&body)
}

fn parse_nominatim_body(body: &str) -> Result<Point, GeocodeError> {
    let hits: Vec<NominatimHit> =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;
    let hit = hits.first().ok_or(GeocodeError::NoMatch)?;

    let lat: f64 = hit
        .lat
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("non-numeric lat '{}'", hit.lat)))?;
    let lon: f64 = hit
        .lon
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("non-numeric lon '{}'", hit.lon)))?;

    let point = Point::new(lat, lon);
    if !point.in_range() {
        return Err(GeocodeError::InvalidResponse(format!(
            "coordinates out of range: {lat}, {lon}"
        )));
    }
    Ok(point)
}

// ─── Photon ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PhotonBody {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

#[derive(Deserialize)]
struct PhotonFeature {
    geometry: PhotonGeometry,
}

#[derive(Deserialize)]
struct PhotonGeometry {
    /// GeoJSON order: longitude first.
    coordinates: [f64; 2],
}

fn photon_lookup(address: &str) -> Result<Point, GeocodeError> {
    let url = format!(
        "https://photon.komoot.io/api/?q={}&limit=1",
        urlencode(address),
    );

    let body = ureq::get(&url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| GeocodeError::Network(e.to_string()))?
        .into_string()
        .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    parse_photon_body(&body)
}

fn parse_photon_body(body: &str) -> Result<Point, GeocodeError> {
    let parsed: PhotonBody =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;
    let feature = parsed.features.first().ok_or(GeocodeError::NoMatch)?;

    let [lon, lat] = feature.geometry.coordinates;
    let point = Point::new(lat, lon);
    if !point.in_range() {
        return Err(GeocodeError::InvalidResponse(format!(
            "coordinates out of range: {lat}, {lon}"
        )));
    }
    Ok(point)
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_first_hit() {
        let body = r#"[
            {"lat": "33.7490", "lon": "-84.3880", "display_name": "Atlanta, Georgia, USA"},
            {"lat": "33.9519", "lon": "-83.3576", "display_name": "Athens, Georgia, USA"}
        ]"#;
        let p = parse_nominatim_body(body).unwrap();
        assert!((p.lat - 33.7490).abs() < 1e-9);
        assert!((p.lng + 84.3880).abs() < 1e-9);
    }

    #[test]
    fn test_parse_nominatim_empty_is_no_match() {
        assert!(matches!(
            parse_nominatim_body("[]"),
            Err(GeocodeError::NoMatch)
        ));
    }

    #[test]
    fn test_parse_nominatim_rejects_garbage_coordinates() {
        let body = r#"[{"lat": "north-ish", "lon": "-84.3880"}]"#;
        assert!(matches!(
            parse_nominatim_body(body),
            Err(GeocodeError::InvalidResponse(_))
        ));

        let out_of_range = r#"[{"lat": "133.0", "lon": "-84.3880"}]"#;
        assert!(matches!(
            parse_nominatim_body(out_of_range),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_photon_swaps_geojson_order() {
        let body = r#"{"features": [{"geometry": {"type": "Point", "coordinates": [-84.3880, 33.7490]}}]}"#;
        let p = parse_photon_body(body).unwrap();
        assert!((p.lat - 33.7490).abs() < 1e-9);
        assert!((p.lng + 84.3880).abs() < 1e-9);
    }

    #[test]
    fn test_parse_photon_empty_is_no_match() {
        assert!(matches!(
            parse_photon_body(r#"{"features": []}"#),
            Err(GeocodeError::NoMatch)
        ));
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("12 Peachtree St"), "12%20Peachtree%20St");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("café"), "caf%C3%A9");
        assert_eq!(urlencode("plain-ok_.~"), "plain-ok_.~");
    }

    #[test]
    fn test_offline_geocoder_skips_network() {
        let geocoder = Geocoder::new(true);
        assert!(geocoder.geocode("12 Peachtree St, Atlanta").is_none());
    }
}
