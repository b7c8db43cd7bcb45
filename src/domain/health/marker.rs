// ============================================================
// MARKERS, VIEWPORT AND STATS
// ============================================================
// Value objects handed to the rendering surface and stats display

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Category;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Rendering handle for one classified record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Stable identity: record id, else `"{lat},{lng}:{category}"`
    pub key: String,
    pub position: LatLng,
    pub category: Category,
    pub color: &'static str,
    pub icon: &'static str,
    pub popup_content: String,
}

/// An ordered marker collection with unique keys
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker; returns false (and keeps the set unchanged) when the
    /// key is already present
    pub fn insert(&mut self, marker: Marker) -> bool {
        if self.contains_key(&marker.key) {
            return false;
        }
        self.markers.push(marker);
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.markers.iter().any(|marker| marker.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.key == key)
    }

    pub fn keys(&self) -> HashSet<&str> {
        self.markers.iter().map(|marker| marker.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }
}

/// Bounding box the map should fit to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Viewport {
    /// Bounds over `positions`, each side extended by `padding` times the
    /// span (Leaflet's `pad`). `None` when there are no positions.
    pub fn around<'a, I>(positions: I, padding: f64) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = Viewport {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };

        for position in iter {
            bounds.south = bounds.south.min(position.lat);
            bounds.north = bounds.north.max(position.lat);
            bounds.west = bounds.west.min(position.lng);
            bounds.east = bounds.east.max(position.lng);
        }

        let lat_pad = (bounds.north - bounds.south) * padding;
        let lng_pad = (bounds.east - bounds.west) * padding;

        Some(Viewport {
            south: (bounds.south - lat_pad).max(-90.0),
            west: (bounds.west - lng_pad).max(-180.0),
            north: (bounds.north + lat_pad).min(90.0),
            east: (bounds.east + lng_pad).min(180.0),
        })
    }

    pub fn contains(&self, position: &LatLng) -> bool {
        (self.south..=self.north).contains(&position.lat)
            && (self.west..=self.east).contains(&position.lng)
    }
}

/// Category counts. `total` covers the three displayed categories only;
/// `unknown` is tracked on the side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub pregnant: usize,
    pub low_weight: usize,
    pub normal_weight: usize,
    pub unknown: usize,
}
