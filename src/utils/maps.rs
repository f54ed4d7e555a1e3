use regex::Regex;
use std::sync::OnceLock;

use crate::models::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

fn at_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("static coordinate pattern is valid")
    })
}

/// Pull "@lat,lng" out of a Google Maps share link.
pub fn extract_coordinates(map_link: &str) -> Option<Coordinates> {
    let caps = at_pattern().captures(map_link)?;
    let latitude = caps.get(1)?.as_str().parse().ok()?;
    let longitude = caps.get(2)?.as_str().parse().ok()?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
