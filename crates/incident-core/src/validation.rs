//! Field validation and location building for the create form.
//!
//! Both functions are pure: no I/O, no clock, same input same output.

use crate::models::{FieldKey, FormFields, GeoPoint, IncidentType, ValidationErrors};

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const INCIDENT_TYPE_REQUIRED: &str = "Incident type is required.";
pub const LOCATION_INCOMPLETE: &str = "If you set latitude or longitude, you must fill both.";
pub const LATITUDE_OUT_OF_RANGE: &str = "Latitude must be a number between -90 and 90.";
pub const LONGITUDE_OUT_OF_RANGE: &str = "Longitude must be a number between -180 and 180.";

/// Validate raw form input.
///
/// Every rule is checked; each field gets at most one message. Both
/// coordinate problems share the single `location` entry.
pub fn validate(
    title: &str,
    incident_type: Option<IncidentType>,
    lat: &str,
    lng: &str,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if title.trim().is_empty() {
        errors.insert(FieldKey::Title, TITLE_REQUIRED);
    }

    if incident_type.is_none() {
        errors.insert(FieldKey::IncidentType, INCIDENT_TYPE_REQUIRED);
    }

    let has_lat = !lat.trim().is_empty();
    let has_lng = !lng.trim().is_empty();

    if has_lat != has_lng {
        errors.insert(FieldKey::Location, LOCATION_INCOMPLETE);
    } else if has_lat && has_lng {
        let lat_num = parse_coordinate(lat);
        let lng_num = parse_coordinate(lng);

        if !lat_num.is_finite() || !(-90.0..=90.0).contains(&lat_num) {
            errors.append(FieldKey::Location, LATITUDE_OUT_OF_RANGE);
        }
        if !lng_num.is_finite() || !(-180.0..=180.0).contains(&lng_num) {
            errors.append(FieldKey::Location, LONGITUDE_OUT_OF_RANGE);
        }
    }

    errors
}

/// Validate the current state of a form
pub fn validate_fields(fields: &FormFields) -> ValidationErrors {
    validate(&fields.title, fields.incident_type, &fields.lat, &fields.lng)
}

/// Build a point from raw coordinates.
///
/// Returns `None` when either side is blank or not a finite number. Range is
/// not checked here; `validate` owns that rule and must run first.
pub fn build_location(lat: &str, lng: &str) -> Option<GeoPoint> {
    if lat.trim().is_empty() || lng.trim().is_empty() {
        return None;
    }

    let latitude = parse_coordinate(lat);
    let longitude = parse_coordinate(lng);
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    Some(GeoPoint::new(latitude, longitude))
}

/// Parse a decimal coordinate (sign, fraction and exponent allowed), mapping
/// anything else to NaN. Radix prefixes such as `0x10` are not coordinates.
fn parse_coordinate(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}
