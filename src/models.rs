//! Domain models that mirror the SQLite schema and get passed between the
//! store, the command line and the TUI. These types stay light-weight data
//! holders so the other layers can focus on presentation and persistence.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Store-assigned primary key of a persisted place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlaceId(i64);

impl PlaceId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PlaceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(PlaceId)
    }
}

/// A latitude/longitude pair. No range validation happens anywhere: the store
/// keeps whatever the caller hands it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// OpenStreetMap link centred on this coordinate with a marker.
    pub fn osm_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=15/{lat}/{lon}",
            lat = self.latitude,
            lon = self.longitude
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// A place that exists only in memory. It has no id until the store assigns
/// one, so there is no way to hand an unsaved place to `update` or
/// `delete_by_id` by mistake.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewPlace {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn at(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self::new(name, coordinate.latitude, coordinate.longitude)
    }

    /// Attach the id handed back by the store.
    pub fn with_id(self, id: PlaceId) -> Place {
        Place {
            id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A persisted row of the `places` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// Primary key from the database. Edit and delete flows bubble the id back
    /// to the persistence layer.
    pub id: PlaceId,
    /// User-facing label, either typed in or suggested by reverse geocoding.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl fmt::Display for Place {
    /// Write the place name to any formatter so the type plays nicely with
    /// Ratatui widgets that consume strings implicitly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
