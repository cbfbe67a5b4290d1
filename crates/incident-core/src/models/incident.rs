use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geo::GeoPoint;
use crate::error::IncidentError;

/// Incident categories accepted by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentType {
    Fire,
    Electrical,
    Hazmat,
}

impl IncidentType {
    /// All types in the order they are offered to the user
    pub const ALL: [IncidentType; 3] =
        [IncidentType::Fire, IncidentType::Electrical, IncidentType::Hazmat];

    /// Wire value, also used as the display label
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::Fire => "FIRE",
            IncidentType::Electrical => "ELECTRICAL",
            IncidentType::Hazmat => "HAZMAT",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIRE" => Ok(IncidentType::Fire),
            "ELECTRICAL" => Ok(IncidentType::Electrical),
            "HAZMAT" => Ok(IncidentType::Hazmat),
            _ => Err(IncidentError::UnknownIncidentType(s.to_string())),
        }
    }
}

/// Server-assigned identifier; older servers hand out numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncidentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentId::Number(n) => write!(f, "{}", n),
            IncidentId::Text(s) => f.write_str(s),
        }
    }
}

/// Read model of a reported incident, owned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kept as sent so unknown categories still render
    pub incident_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(
        rename = "createdAt",
        alias = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl Incident {
    /// Interpret the category, if it is one the client knows
    pub fn kind(&self) -> Option<IncidentType> {
        self.incident_type.parse().ok()
    }

    /// Creation time, when present and RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
    }

    /// Absolute image URL; the server returns paths relative to the API
    pub fn resolved_image_url(&self, base_url: &str) -> Option<String> {
        self.image_url.as_ref().map(|path| format!("{}{}", base_url, path))
    }
}

/// Decode a list response body.
///
/// Accepts a bare array or an object with an `items` array. Any other shape
/// yields an empty list. Entries that do not decode are skipped.
pub fn parse_incident_list(body: &[u8]) -> Vec<Incident> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Incident list is not valid JSON; showing empty list");
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("items") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Incident>(item) {
            Ok(incident) => Some(incident),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed incident");
                None
            }
        })
        .collect()
}
