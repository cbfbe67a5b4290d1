//! In-memory `IncidentApi` for development and testing.
//!
//! Create requests are checked and stored the way the incidents server does
//! it. Failures and latency can be scripted. Locks are never held across an
//! await; a poisoned lock is recovered since the data stays consistent
//! between statements.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use incident_core::encoding::{MultipartPart, SubmissionBody, SubmissionRequest};
use incident_core::error::{IncidentError, Result};
use incident_core::models::{GeoPoint, Incident, IncidentId, IncidentType};
use incident_core::ports::IncidentApi;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

const INVALID_INCIDENT: &str = "title and valid incident_type are required";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory implementation of IncidentApi
#[derive(Debug, Default)]
pub struct MemoryIncidentApi {
    incidents: Mutex<Vec<Incident>>,
    received: Mutex<Vec<SubmissionRequest>>,
    create_failures: Mutex<VecDeque<(u16, String)>>,
    list_failure: Mutex<Option<u16>>,
    create_delay: Mutex<Duration>,
    list_delay: Mutex<Duration>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl MemoryIncidentApi {
    /// Create an empty in-memory API
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing incidents
    pub fn with_incidents(incidents: Vec<Incident>) -> Self {
        let api = Self::new();
        *lock(&api.incidents) = incidents;
        api
    }

    pub fn with_create_delay(self, delay: Duration) -> Self {
        *lock(&self.create_delay) = delay;
        self
    }

    pub fn with_list_delay(self, delay: Duration) -> Self {
        *lock(&self.list_delay) = delay;
        self
    }

    /// Answer the next create request with this status and body
    pub fn fail_next_create(&self, status: u16, body: impl Into<String>) {
        lock(&self.create_failures).push_back((status, body.into()));
    }

    /// Answer list requests with this status until cleared with `None`
    pub fn fail_lists(&self, status: Option<u16>) {
        *lock(&self.list_failure) = status;
    }

    /// Stored incidents
    pub fn incidents(&self) -> Vec<Incident> {
        lock(&self.incidents).clone()
    }

    /// Every create request received, in order
    pub fn received(&self) -> Vec<SubmissionRequest> {
        lock(&self.received).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn store(&self, request: &SubmissionRequest) -> Result<Incident> {
        let draft = Draft::from_request(request)?;

        let title = draft.title.trim().to_string();
        let incident_type = draft.incident_type.as_deref().map(str::parse::<IncidentType>);
        let incident_type = match incident_type {
            Some(Ok(t)) if !title.is_empty() => t,
            _ => return Err(rejection(400, INVALID_INCIDENT)),
        };

        let location = match draft.location {
            Some(raw) => Some(
                serde_json::from_str::<GeoPoint>(&raw)
                    .map_err(|_| rejection(400, "invalid location"))?,
            ),
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let image_url = draft.image_name.map(|name| {
            let ext = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
                .unwrap_or_default();
            format!("/uploads/{}{}", Uuid::new_v4(), ext)
        });
        let description = draft.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

        let incident = Incident {
            id: IncidentId::Text(id),
            title,
            description,
            incident_type: incident_type.as_str().to_string(),
            location,
            image_url,
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };

        lock(&self.incidents).push(incident.clone());
        Ok(incident)
    }
}

fn rejection(status: u16, message: &str) -> IncidentError {
    IncidentError::rejected(status, serde_json::json!({ "error": message }).to_string())
}

/// Fields of a create request, whatever its encoding
struct Draft {
    title: String,
    description: Option<String>,
    incident_type: Option<String>,
    location: Option<String>,
    image_name: Option<String>,
}

impl Draft {
    fn from_request(request: &SubmissionRequest) -> Result<Self> {
        match &request.body {
            SubmissionBody::Json(payload) => Ok(Self {
                title: payload.title.clone(),
                description: payload.description.clone(),
                incident_type: Some(payload.incident_type.as_str().to_string()),
                location: payload.location.clone(),
                image_name: None,
            }),
            SubmissionBody::Multipart(parts) => {
                let mut draft = Self {
                    title: String::new(),
                    description: None,
                    incident_type: None,
                    location: None,
                    image_name: None,
                };
                for part in parts {
                    match part {
                        MultipartPart::Text { name: "title", value } => draft.title = value.clone(),
                        MultipartPart::Text { name: "description", value } => {
                            draft.description = Some(value.clone())
                        }
                        MultipartPart::Text { name: "incident_type", value } => {
                            draft.incident_type = Some(value.clone())
                        }
                        MultipartPart::Text { name: "location", value } => {
                            draft.location = Some(value.clone())
                        }
                        MultipartPart::File { name: "image", image } => {
                            draft.image_name = Some(image.file_name.clone())
                        }
                        _ => {}
                    }
                }
                Ok(draft)
            }
        }
    }
}

#[async_trait]
impl IncidentApi for MemoryIncidentApi {
    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.list_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = *lock(&self.list_failure) {
            return Err(IncidentError::ListUnavailable { status });
        }
        Ok(self.incidents())
    }

    async fn create_incident(&self, request: &SubmissionRequest) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.received).push(request.clone());

        let delay = *lock(&self.create_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = lock(&self.create_failures).pop_front();
        if let Some((status, body)) = scripted {
            return Err(IncidentError::rejected(status, body));
        }

        let incident = self.store(request)?;
        tracing::debug!(id = %incident.id, "Stored incident in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident_core::encoding::{encode, CreateIncidentPayload, INCIDENTS_PATH};
    use incident_core::models::{FormFields, ImageAttachment};
    use incident_core::validation::build_location;

    fn json_request(title: &str) -> SubmissionRequest {
        let fields = FormFields {
            title: title.to_string(),
            description: "  near gate 3 ".to_string(),
            incident_type: Some(IncidentType::Fire),
            lat: "40.7128".to_string(),
            lng: "-74.0060".to_string(),
            image: None,
        };
        let location = build_location(&fields.lat, &fields.lng);
        encode(&fields, location.as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let api = MemoryIncidentApi::new();
        api.create_incident(&json_request("Warehouse fire")).await.unwrap();

        let incidents = api.list_incidents().await.unwrap();
        assert_eq!(incidents.len(), 1);
        let incident = &incidents[0];
        assert_eq!(incident.title, "Warehouse fire");
        assert_eq!(incident.description.as_deref(), Some("near gate 3"));
        assert_eq!(incident.kind(), Some(IncidentType::Fire));
        assert_eq!(incident.location, Some(GeoPoint::new(40.7128, -74.006)));
        assert!(incident.created_at_utc().is_some());
        assert_eq!(api.list_calls(), 1);
        assert_eq!(api.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_seeded_incidents_are_listed() {
        let seeded = Incident {
            id: IncidentId::Number(1),
            title: "Gas leak".to_string(),
            description: None,
            incident_type: "HAZMAT".to_string(),
            location: None,
            image_url: None,
            created_at: None,
        };
        let api = MemoryIncidentApi::with_incidents(vec![seeded.clone()]);
        assert_eq!(api.list_incidents().await.unwrap(), vec![seeded]);
    }

    #[tokio::test]
    async fn test_multipart_create_stores_image_url() {
        let fields = FormFields {
            title: "Sparks".to_string(),
            incident_type: Some(IncidentType::Electrical),
            image: Some(ImageAttachment::new("pole.jpeg", "image/jpeg", vec![0xff, 0xd8])),
            ..Default::default()
        };
        let api = MemoryIncidentApi::new();
        api.create_incident(&encode(&fields, None).unwrap()).await.unwrap();

        let stored = api.incidents();
        let url = stored[0].image_url.as_deref().unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpeg"));
        assert!(stored[0].location.is_none());
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected_like_the_server() {
        let request = SubmissionRequest {
            path: INCIDENTS_PATH,
            body: SubmissionBody::Json(CreateIncidentPayload {
                title: "   ".to_string(),
                description: None,
                incident_type: IncidentType::Hazmat,
                location: None,
            }),
        };
        let api = MemoryIncidentApi::new();
        let err = api.create_incident(&request).await.unwrap_err();
        assert!(matches!(err, IncidentError::Rejected { status: 400, .. }));
        assert!(err.to_string().contains(INVALID_INCIDENT));
        assert!(api.incidents().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let api = MemoryIncidentApi::new();
        api.fail_next_create(500, "server error");
        let err = api.create_incident(&json_request("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "server error");

        api.fail_lists(Some(503));
        let err = api.list_incidents().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed: 503");
        api.fail_lists(None);
        assert!(api.list_incidents().await.is_ok());
    }
}
