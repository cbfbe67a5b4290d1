//! View-models for the incident list.

use chrono::{DateTime, Utc};

use crate::feed::FeedSnapshot;
use crate::models::Incident;

/// Placeholder cards rendered while the first load is in progress
pub const SKELETON_CARDS: usize = 6;

/// Badge background for an incident type (case-insensitive)
pub fn type_color(incident_type: &str) -> &'static str {
    match incident_type.to_lowercase().as_str() {
        "fire" => "#ef4444",
        "medical" => "#10b981",
        "police" => "#6366f1",
        _ => "#6b7280",
    }
}

/// Coarse relative age: "3d ago", "5h ago", "12m ago", "40s ago".
/// Timestamps in the future count as zero.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d ago", days)
    } else if hours > 0 {
        format!("{}h ago", hours)
    } else if minutes > 0 {
        format!("{}m ago", minutes)
    } else {
        format!("{}s ago", seconds)
    }
}

/// Everything a card needs, precomputed
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentCard {
    pub key: String,
    pub title: String,
    pub badge: String,
    pub badge_color: &'static str,
    pub description: Option<String>,
    pub location: Option<String>,
    pub age: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl IncidentCard {
    pub fn from_incident(incident: &Incident, base_url: &str, now: DateTime<Utc>) -> Self {
        let created_at = incident.created_at_utc();
        Self {
            key: incident.id.to_string(),
            title: incident.title.clone(),
            badge: incident.incident_type.clone(),
            badge_color: type_color(&incident.incident_type),
            description: incident.description.clone().filter(|d| !d.is_empty()),
            location: incident.location.as_ref().and_then(|l| l.label()),
            age: created_at.map(|then| time_ago(then, now)),
            created_at,
            image_url: incident.resolved_image_url(base_url),
        }
    }
}

/// Body of the list view
#[derive(Debug, Clone, PartialEq)]
pub enum ListBody {
    Skeleton(usize),
    Empty,
    Cards(Vec<IncidentCard>),
}

/// Full list view: an optional error banner above the body
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub error: Option<String>,
    pub body: ListBody,
}

impl ListView {
    pub fn from_snapshot(snapshot: &FeedSnapshot, base_url: &str, now: DateTime<Utc>) -> Self {
        let body = if snapshot.loading {
            ListBody::Skeleton(SKELETON_CARDS)
        } else if snapshot.incidents.is_empty() {
            ListBody::Empty
        } else {
            ListBody::Cards(
                snapshot
                    .incidents
                    .iter()
                    .map(|incident| IncidentCard::from_incident(incident, base_url, now))
                    .collect(),
            )
        };

        Self { error: snapshot.error.clone(), body }
    }
}
