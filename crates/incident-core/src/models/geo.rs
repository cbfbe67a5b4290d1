//! Canonical location type shared by the form pipeline and the read model.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair, optionally with a human-readable address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl GeoPoint {
    /// Create a point without an address
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, address: None }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Whether both coordinates are finite and inside WGS 84 bounds
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Short label: the address when known, else "lat, lng" with 5 decimals
    pub fn label(&self) -> Option<String> {
        if let Some(address) = &self.address {
            return Some(address.clone());
        }
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Some(format!("{:.5}, {:.5}", self.latitude, self.longitude))
        } else {
            None
        }
    }
}
