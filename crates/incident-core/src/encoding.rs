//! Turns a validated form into a create request.
//!
//! The shape depends only on whether an image is attached: multipart when it
//! is, JSON otherwise. In both shapes `location` travels as a JSON string.

use serde::Serialize;

use crate::error::{IncidentError, Result};
use crate::models::{FormFields, GeoPoint, ImageAttachment, IncidentType};

/// Path of the incidents endpoint, relative to the API base URL
pub const INCIDENTS_PATH: &str = "/api/incidents";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// JSON body of a create request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIncidentPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub incident_type: IncidentType,
    /// JSON-encoded `GeoPoint`, sent as a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// One part of a multipart create request
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    Text { name: &'static str, value: String },
    File { name: &'static str, image: ImageAttachment },
}

impl MultipartPart {
    pub fn name(&self) -> &'static str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => *name,
        }
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionBody {
    /// Boundary-delimited form data; the transport sets the content type
    Multipart(Vec<MultipartPart>),
    Json(CreateIncidentPayload),
}

/// A fully encoded `POST /api/incidents` request
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub path: &'static str,
    pub body: SubmissionBody,
}

impl SubmissionRequest {
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, SubmissionBody::Multipart(_))
    }

    /// Explicit content type, if the encoding needs one
    pub fn content_type(&self) -> Option<&'static str> {
        match self.body {
            SubmissionBody::Json(_) => Some(JSON_CONTENT_TYPE),
            SubmissionBody::Multipart(_) => None,
        }
    }

    /// Serialized JSON body; `None` for multipart requests
    pub fn json_bytes(&self) -> Result<Option<Vec<u8>>> {
        match &self.body {
            SubmissionBody::Json(payload) => Ok(Some(serde_json::to_vec(payload)?)),
            SubmissionBody::Multipart(_) => Ok(None),
        }
    }
}

/// Encode the form. `location` must come from `build_location` after the
/// form passed validation.
pub fn encode(fields: &FormFields, location: Option<&GeoPoint>) -> Result<SubmissionRequest> {
    let incident_type = fields
        .incident_type
        .ok_or_else(|| IncidentError::Incomplete { field: "incident_type".to_string() })?;

    let title = fields.title.trim().to_string();
    let description = Some(fields.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let location = location.map(serde_json::to_string).transpose()?;

    let body = match &fields.image {
        Some(image) => {
            let mut parts = vec![
                MultipartPart::Text { name: "title", value: title },
                MultipartPart::Text {
                    name: "incident_type",
                    value: incident_type.as_str().to_string(),
                },
            ];
            if let Some(description) = description {
                parts.push(MultipartPart::Text { name: "description", value: description });
            }
            if let Some(location) = location {
                parts.push(MultipartPart::Text { name: "location", value: location });
            }
            parts.push(MultipartPart::File { name: "image", image: image.clone() });
            SubmissionBody::Multipart(parts)
        }
        None => SubmissionBody::Json(CreateIncidentPayload {
            title,
            description,
            incident_type,
            location,
        }),
    };

    Ok(SubmissionRequest { path: INCIDENTS_PATH, body })
}
