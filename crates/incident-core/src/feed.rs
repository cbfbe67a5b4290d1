//! Owner of the incident list snapshot.
//!
//! Views read cloned [`FeedSnapshot`]s; only [`IncidentFeed::refresh`]
//! writes. Every refresh replaces the list wholesale. Refreshes are numbered
//! and a response older than the last applied one is dropped, so a slow early
//! request cannot overwrite newer data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{IncidentError, LIST_FALLBACK_MESSAGE};
use crate::models::Incident;
use crate::ports::IncidentApi;

/// What the list view renders
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub incidents: Vec<Incident>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the refresh that produced `incidents`; 0 before any
    pub generation: u64,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self { incidents: Vec::new(), loading: true, error: None, generation: 0 }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    snapshot: FeedSnapshot,
    applied_seq: u64,
}

#[derive(Debug, Default)]
pub struct IncidentFeed {
    state: Mutex<FeedState>,
    issued: AtomicU64,
}

impl IncidentFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Refetch the list and replace the snapshot.
    ///
    /// Failures keep the previous incidents and set `error`; they never
    /// propagate.
    pub async fn refresh<A>(&self, api: &A, timeout: Duration) -> FeedSnapshot
    where
        A: IncidentApi + ?Sized,
    {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            state.snapshot.loading = true;
            state.snapshot.error = None;
        }

        let result = match tokio::time::timeout(timeout, api.list_incidents()).await {
            Ok(result) => result,
            Err(_) => Err(IncidentError::Timeout { after: timeout }),
        };

        let mut state = self.state.lock().await;
        if seq < state.applied_seq {
            tracing::debug!(seq, applied = state.applied_seq, "Dropping stale incident list");
        } else {
            state.applied_seq = seq;
            match result {
                Ok(incidents) => {
                    tracing::debug!(seq, count = incidents.len(), "Incident list refreshed");
                    state.snapshot.incidents = incidents;
                    state.snapshot.generation = seq;
                }
                Err(e) => {
                    tracing::warn!(seq, error = %e, "Failed to load incidents");
                    state.snapshot.error = Some(e.user_message(LIST_FALLBACK_MESSAGE));
                }
            }
        }

        if seq == self.issued.load(Ordering::SeqCst) {
            state.snapshot.loading = false;
        }

        state.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SubmissionRequest;
    use crate::error::Result;
    use crate::models::IncidentId;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Answers list calls from a script of (delay, result) pairs
    struct ScriptedApi {
        script: StdMutex<VecDeque<(Duration, Result<Vec<Incident>>)>>,
    }

    impl ScriptedApi {
        fn new(script: Vec<(Duration, Result<Vec<Incident>>)>) -> Self {
            Self { script: StdMutex::new(script.into()) }
        }
    }

    #[async_trait]
    impl IncidentApi for ScriptedApi {
        async fn list_incidents(&self) -> Result<Vec<Incident>> {
            let (delay, result) = self.script.lock().unwrap().pop_front().unwrap();
            tokio::time::sleep(delay).await;
            result
        }

        async fn create_incident(&self, _request: &SubmissionRequest) -> Result<()> {
            Ok(())
        }
    }

    fn incident(id: i64, title: &str) -> Incident {
        Incident {
            id: IncidentId::Number(id),
            title: title.to_string(),
            description: None,
            incident_type: "FIRE".to_string(),
            location: None,
            image_url: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_loading() {
        let feed = IncidentFeed::new();
        let snapshot = feed.snapshot().await;
        assert!(snapshot.loading);
        assert!(snapshot.incidents.is_empty());
        assert_eq!(snapshot.generation, 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_list() {
        let api = ScriptedApi::new(vec![
            (Duration::ZERO, Ok(vec![incident(1, "a"), incident(2, "b")])),
            (Duration::ZERO, Ok(vec![incident(3, "c")])),
        ]);
        let feed = IncidentFeed::new();

        let first = feed.refresh(&api, Duration::from_secs(1)).await;
        assert_eq!(first.incidents.len(), 2);
        assert!(!first.loading);

        let second = feed.refresh(&api, Duration::from_secs(1)).await;
        assert_eq!(second.incidents, vec![incident(3, "c")]);
        assert_eq!(second.generation, 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_items() {
        let api = ScriptedApi::new(vec![
            (Duration::ZERO, Ok(vec![incident(1, "a")])),
            (Duration::ZERO, Err(IncidentError::ListUnavailable { status: 500 })),
            (Duration::ZERO, Err(IncidentError::Transport(String::new()))),
        ]);
        let feed = IncidentFeed::new();
        feed.refresh(&api, Duration::from_secs(1)).await;

        let snapshot = feed.refresh(&api, Duration::from_secs(1)).await;
        assert_eq!(snapshot.error.as_deref(), Some("Failed: 500"));
        assert_eq!(snapshot.incidents.len(), 1);

        let snapshot = feed.refresh(&api, Duration::from_secs(1)).await;
        assert_eq!(snapshot.error.as_deref(), Some("Could not load incidents."));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let api = ScriptedApi::new(vec![(Duration::from_millis(200), Ok(vec![]))]);
        let feed = IncidentFeed::new();
        let snapshot = feed.refresh(&api, Duration::from_millis(20)).await;
        assert_eq!(snapshot.error.as_deref(), Some("Request timed out after 20ms"));
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let api = ScriptedApi::new(vec![
            (Duration::from_millis(150), Ok(vec![incident(1, "old")])),
            (Duration::from_millis(10), Ok(vec![incident(2, "new")])),
        ]);
        let feed = IncidentFeed::new();
        let timeout = Duration::from_secs(1);

        let (slow, fast) = tokio::join!(feed.refresh(&api, timeout), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            feed.refresh(&api, timeout).await
        });

        assert_eq!(fast.incidents, vec![incident(2, "new")]);
        assert!(!fast.loading);
        assert_eq!(slow.incidents, vec![incident(2, "new")]);
        assert_eq!(feed.snapshot().await.generation, 2);
    }
}
