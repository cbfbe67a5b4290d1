//! Async orchestration of the create form and the incident list.
//!
//! A submit runs validation synchronously, makes one bounded network call,
//! records the result on the form, dispatches a list refresh and only then
//! releases the in-flight ticket. Everything after the ticket is issued runs
//! on a spawned task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::encoding::SubmissionRequest;
use crate::error::{IncidentError, Result, CREATE_FALLBACK_MESSAGE};
use crate::feed::{FeedSnapshot, IncidentFeed};
use crate::form::{FormPhase, SubmissionForm, SubmissionTicket, SubmitStep};
use crate::models::ValidationErrors;
use crate::ports::IncidentApi;

/// What a submit attempt did
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A submission was already in flight
    Ignored,
    /// Validation failed; no request was sent and no refresh was triggered
    Invalid(ValidationErrors),
    /// A request was attempted and a list refresh dispatched
    Completed {
        succeeded: bool,
        message: String,
        /// The refresh runs on its own; awaiting it is optional
        refresh: JoinHandle<FeedSnapshot>,
    },
}

pub struct IncidentSession<A> {
    api: Arc<A>,
    form: Arc<Mutex<SubmissionForm>>,
    feed: Arc<IncidentFeed>,
    timeout: Duration,
}

impl<A> IncidentSession<A>
where
    A: IncidentApi + 'static,
{
    /// Create a session using the configured request timeout
    pub fn new(api: A, config: &ClientConfig) -> Self {
        Self::with_timeout(Arc::new(api), config.request_timeout())
    }

    pub fn with_timeout(api: Arc<A>, timeout: Duration) -> Self {
        Self {
            api,
            form: Arc::new(Mutex::new(SubmissionForm::new())),
            feed: Arc::new(IncidentFeed::new()),
            timeout,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Shared handle to the list state, for views
    pub fn feed(&self) -> Arc<IncidentFeed> {
        Arc::clone(&self.feed)
    }

    /// Apply user input to the form
    pub async fn edit<R>(&self, f: impl FnOnce(&mut SubmissionForm) -> R) -> R {
        let mut form = self.form.lock().await;
        f(&mut form)
    }

    /// Copy of the current form state
    pub async fn form(&self) -> SubmissionForm {
        self.form.lock().await.clone()
    }

    /// Load the list, e.g. on start-up
    pub async fn refresh(&self) -> FeedSnapshot {
        self.feed.refresh(self.api.as_ref(), self.timeout).await
    }

    /// Submit the form.
    ///
    /// Concurrent calls while a request is outstanding return
    /// [`SubmitOutcome::Ignored`]. Once a ticket is issued the attempt runs
    /// on its own task, so dropping this future never strands the ticket.
    pub async fn submit(&self) -> SubmitOutcome {
        let step = self.form.lock().await.begin_submit();

        let (ticket, request) = match step {
            SubmitStep::Busy => return SubmitOutcome::Ignored,
            SubmitStep::Invalid(errors) => return SubmitOutcome::Invalid(errors),
            SubmitStep::Ready { ticket, request } => (ticket, Some(request)),
            SubmitStep::Aborted { ticket } => (ticket, None),
        };

        let attempt = Attempt {
            api: Arc::clone(&self.api),
            form: Arc::clone(&self.form),
            feed: Arc::clone(&self.feed),
            timeout: self.timeout,
        };

        match tokio::spawn(attempt.run(ticket, request)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Submission task failed");
                SubmitOutcome::Completed {
                    succeeded: false,
                    message: CREATE_FALLBACK_MESSAGE.to_string(),
                    refresh: self.spawn_refresh(),
                }
            }
        }
    }

    fn spawn_refresh(&self) -> JoinHandle<FeedSnapshot> {
        spawn_refresh(Arc::clone(&self.api), Arc::clone(&self.feed), self.timeout)
    }
}

fn spawn_refresh<A>(api: Arc<A>, feed: Arc<IncidentFeed>, timeout: Duration) -> JoinHandle<FeedSnapshot>
where
    A: IncidentApi + 'static,
{
    tokio::spawn(async move { feed.refresh(api.as_ref(), timeout).await })
}

/// One submission after its ticket was issued
struct Attempt<A> {
    api: Arc<A>,
    form: Arc<Mutex<SubmissionForm>>,
    feed: Arc<IncidentFeed>,
    timeout: Duration,
}

impl<A> Attempt<A>
where
    A: IncidentApi + 'static,
{
    async fn run(self, ticket: SubmissionTicket, request: Option<SubmissionRequest>) -> SubmitOutcome {
        let result = match &request {
            Some(request) => {
                tracing::info!(
                    ticket = ticket.id(),
                    multipart = request.is_multipart(),
                    "Submitting incident"
                );
                Some(self.send(request).await)
            }
            // Encoding failed; the form already holds the failure
            None => None,
        };

        let mut form = self.form.lock().await;
        if let Some(result) = result {
            if let Err(e) = &result {
                tracing::warn!(ticket = ticket.id(), error = %e, "Incident submission failed");
            }
            form.complete(&ticket, result);
        }
        let succeeded = form.phase() == FormPhase::Succeeded;
        let message = form.message().unwrap_or_default().to_string();

        let refresh = spawn_refresh(self.api, self.feed, self.timeout);
        form.settle(ticket);

        SubmitOutcome::Completed { succeeded, message, refresh }
    }

    async fn send(&self, request: &SubmissionRequest) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.api.create_incident(request)).await {
            Ok(result) => result,
            Err(_) => Err(IncidentError::Timeout { after: self.timeout }),
        }
    }
}
