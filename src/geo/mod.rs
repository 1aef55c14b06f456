pub mod location;

pub use location::{parse_location_url, web_link, LocationLookup};

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both values must be finite and inside the WGS84 ranges.
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then(|| Self::new(latitude, longitude))
    }

    /// Build from optional columns; a missing half means no coordinates.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::checked(lat, lng),
            _ => None,
        }
    }

    /// Link that shows this spot in the maps web application.
    pub fn maps_url(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }

    /// Turn-by-turn directions to this spot.
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Great-circle distance in kilometers (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// An item paired with its distance from the device, when both sides are known.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub distance_km: Option<f64>,
}

/// Annotate items with their distance from `origin` and order them nearest first.
///
/// Without an origin the original order is kept. Items without coordinates
/// stay in their original slot; the items with a known distance are sorted
/// among the remaining slots.
pub fn rank_by_distance<T, F>(items: Vec<T>, origin: Option<Coordinates>, coords: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> Option<Coordinates>,
{
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let distance_km = match (origin, coords(&item)) {
                (Some(from), Some(to)) => Some(distance_km(from, to)),
                _ => None,
            };
            Ranked { item, distance_km }
        })
        .collect();

    if origin.is_none() {
        return ranked;
    }

    let known_slots: Vec<usize> = ranked
        .iter()
        .enumerate()
        .filter(|(_, r)| r.distance_km.is_some())
        .map(|(i, _)| i)
        .collect();

    let mut known: Vec<(f64, usize)> = known_slots
        .iter()
        .filter_map(|&i| ranked[i].distance_km.map(|d| (d, i)))
        .collect();
    // Stable: ties keep their original relative order
    known.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut slots: Vec<Option<Ranked<T>>> = ranked.drain(..).map(Some).collect();
    let mut placed: Vec<Option<Ranked<T>>> = (0..slots.len()).map(|_| None).collect();

    for (slot, (_, source)) in known_slots.iter().zip(known.iter()) {
        placed[*slot] = slots[*source].take();
    }
    for (i, entry) in slots.into_iter().enumerate() {
        if entry.is_some() {
            placed[i] = entry;
        }
    }

    placed.into_iter().flatten().collect()
}

/// Render a distance the way the map page shows it.
pub fn format_km(distance_km: f64) -> String {
    format!("{:.1} km", distance_km)
}
