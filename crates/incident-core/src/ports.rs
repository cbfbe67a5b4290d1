//! Port trait definitions
//!
//! Network adapters implement [`IncidentApi`]; the session only talks to
//! this trait.

use async_trait::async_trait;

use crate::encoding::SubmissionRequest;
use crate::error::Result;
use crate::models::Incident;

/// Port for the incidents REST endpoint
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// Fetch the current list (`GET /api/incidents`)
    ///
    /// Unexpected response shapes come back as an empty list, not an error.
    async fn list_incidents(&self) -> Result<Vec<Incident>>;

    /// Create an incident (`POST /api/incidents`)
    ///
    /// Any 2xx is success; anything else is `IncidentError::Rejected`.
    async fn create_incident(&self, request: &SubmissionRequest) -> Result<()>;
}
