//! Reverse geocoding used to suggest a default name for a freshly picked
//! coordinate. Failures never reach the user: `suggest_name` falls back to a
//! timestamp label instead.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::Deserialize;

use crate::models::Coordinate;

/// Public Nominatim instance used unless configured otherwise.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
/// `strftime` pattern for the fallback name, e.g. `14:05 2026-10-19`.
pub const FALLBACK_NAME_FORMAT: &str = "%H:%M %Y-%m-%d";

const USER_AGENT: &str = concat!("favorite-places/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Map a coordinate to a human-readable address.
pub trait ReverseGeocoder {
    /// `Ok(None)` means the service answered but knows nothing about the spot.
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>>;
}

/// Geocoder that never resolves anything, used with `--offline`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

impl ReverseGeocoder for OfflineGeocoder {
    fn reverse(&self, _coordinate: Coordinate) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Nominatim `/reverse` response. Only the fields we read are declared.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl ReverseResponse {
    fn into_address(self) -> Option<String> {
        if let Some(error) = self.error {
            debug!("nominatim reported: {error}");
            return None;
        }
        self.display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

/// Blocking client for the Nominatim reverse geocoding endpoint.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let url = self.reverse_url();
        debug!("reverse geocoding {coordinate} via {url}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
            ])
            .send()
            .context("nominatim request failed")?;

        if !response.status().is_success() {
            warn!("nominatim returned status {}", response.status());
            return Ok(None);
        }

        let body: ReverseResponse = response
            .json()
            .context("failed to parse nominatim response")?;
        Ok(body.into_address())
    }
}

/// Label used when no address is available.
pub fn fallback_name(now: &DateTime<Local>) -> String {
    now.format(FALLBACK_NAME_FORMAT).to_string()
}

/// Default name offered in the naming dialog: the geocoded address when there
/// is one, otherwise the current time.
pub fn suggest_name(
    geocoder: &dyn ReverseGeocoder,
    coordinate: Coordinate,
    now: &DateTime<Local>,
) -> String {
    match geocoder.reverse(coordinate) {
        Ok(Some(address)) if !address.trim().is_empty() => address.trim().to_string(),
        Ok(_) => fallback_name(now),
        Err(err) => {
            warn!("reverse geocoding {coordinate} failed: {err:#}");
            fallback_name(now)
        }
    }
}
