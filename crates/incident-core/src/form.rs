//! Create-form state machine.
//!
//! `SubmissionForm` owns the raw fields, the latest validation errors, the
//! transient result message and the incident type picker. A submission moves
//! through the phases of [`FormPhase`]; the only way in is
//! [`SubmissionForm::begin_submit`], which hands out a [`SubmissionTicket`].
//! While a ticket is outstanding every further submit is ignored.

use crate::dropdown::{incident_type_options, DropdownController, DropdownEffect, DropdownEvent};
use crate::encoding::{encode, SubmissionRequest};
use crate::error::{Result, CREATE_FALLBACK_MESSAGE};
use crate::models::{FormFields, ImageAttachment, IncidentType, ValidationErrors};
use crate::validation::{build_location, validate_fields};

pub const SUCCESS_MESSAGE: &str = "Incident created successfully.";

/// Phases of one submit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Validating,
    Invalid,
    Submitting,
    Succeeded,
    Failed,
}

/// Inputs that drive [`FormPhase`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    SubmitRequested,
    ValidationFailed,
    ValidationPassed,
    ServerAccepted,
    ServerRejected,
    /// Errors surfaced, or the post-submit refresh dispatched
    Settled,
}

impl FormPhase {
    /// Transition table; `None` means the event is not allowed in this phase
    pub fn next(self, event: FormEvent) -> Option<FormPhase> {
        match (self, event) {
            (FormPhase::Idle, FormEvent::SubmitRequested) => Some(FormPhase::Validating),
            (FormPhase::Validating, FormEvent::ValidationFailed) => Some(FormPhase::Invalid),
            (FormPhase::Validating, FormEvent::ValidationPassed) => Some(FormPhase::Submitting),
            (FormPhase::Submitting, FormEvent::ServerAccepted) => Some(FormPhase::Succeeded),
            (FormPhase::Submitting, FormEvent::ServerRejected) => Some(FormPhase::Failed),
            (FormPhase::Invalid | FormPhase::Succeeded | FormPhase::Failed, FormEvent::Settled) => {
                Some(FormPhase::Idle)
            }
            _ => None,
        }
    }
}

/// Token for the single in-flight submission.
///
/// Not `Clone`: it is released by passing it back to
/// [`SubmissionForm::settle`].
#[derive(Debug, PartialEq, Eq)]
pub struct SubmissionTicket {
    id: u64,
}

impl SubmissionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Result of asking the form to submit
#[derive(Debug)]
pub enum SubmitStep {
    /// Another submission holds the ticket; nothing happened
    Busy,
    /// Validation failed; errors are stored on the form as well
    Invalid(ValidationErrors),
    /// Send `request`, then call `complete` and `settle` with the ticket
    Ready {
        ticket: SubmissionTicket,
        request: SubmissionRequest,
    },
    /// Encoding failed and the form is already `Failed`; only `settle` remains
    Aborted { ticket: SubmissionTicket },
}

#[derive(Debug, Clone)]
pub struct SubmissionForm {
    fields: FormFields,
    errors: ValidationErrors,
    message: Option<String>,
    phase: FormPhase,
    in_flight: Option<u64>,
    next_ticket: u64,
    type_picker: DropdownController<IncidentType>,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self {
            fields: FormFields::default(),
            errors: ValidationErrors::new(),
            message: None,
            phase: FormPhase::Idle,
            in_flight: None,
            next_ticket: 0,
            type_picker: DropdownController::new("Incident Type", incident_type_options()),
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Label of the submit button
    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            "Saving..."
        } else {
            "Create Incident"
        }
    }

    pub fn type_picker(&self) -> &DropdownController<IncidentType> {
        &self.type_picker
    }

    // Field edits

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.fields.description = description.into();
    }

    pub fn set_lat(&mut self, lat: impl Into<String>) {
        self.fields.lat = lat.into();
    }

    pub fn set_lng(&mut self, lng: impl Into<String>) {
        self.fields.lng = lng.into();
    }

    pub fn set_image(&mut self, image: Option<ImageAttachment>) {
        self.fields.image = image;
    }

    pub fn set_incident_type(&mut self, incident_type: Option<IncidentType>) {
        self.fields.incident_type = incident_type;
        self.type_picker.set_selected(incident_type.as_ref());
    }

    /// Route an input event to the type picker; a commit updates the field
    pub fn handle_type_picker(&mut self, event: DropdownEvent) -> Vec<DropdownEffect<IncidentType>> {
        let effects = self.type_picker.handle(event);
        for effect in &effects {
            if let DropdownEffect::Commit(value) = effect {
                self.fields.incident_type = Some(*value);
            }
        }
        effects
    }

    // Submission

    /// Validate and, when the form is clean, encode the request.
    pub fn begin_submit(&mut self) -> SubmitStep {
        if self.in_flight.is_some() {
            tracing::debug!("Submission already in flight; ignoring submit");
            return SubmitStep::Busy;
        }

        self.transition(FormEvent::SubmitRequested);
        self.message = None;
        self.errors = validate_fields(&self.fields);

        if !self.errors.is_empty() {
            tracing::debug!(fields = self.errors.len(), "Form has validation errors");
            self.transition(FormEvent::ValidationFailed);
            self.transition(FormEvent::Settled);
            return SubmitStep::Invalid(self.errors.clone());
        }

        self.transition(FormEvent::ValidationPassed);
        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        let ticket = SubmissionTicket { id: self.next_ticket };

        let location = build_location(&self.fields.lat, &self.fields.lng);
        match encode(&self.fields, location.as_ref()) {
            Ok(request) => SubmitStep::Ready { ticket, request },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode submission");
                self.complete(&ticket, Err(e));
                SubmitStep::Aborted { ticket }
            }
        }
    }

    /// Record the server's answer for the in-flight submission.
    ///
    /// Success clears every field and error; failure keeps the fields for a
    /// retry. Returns the message now shown, or `None` if the ticket is not
    /// the one in flight or the answer was already recorded.
    pub fn complete(&mut self, ticket: &SubmissionTicket, result: Result<()>) -> Option<&str> {
        if self.in_flight != Some(ticket.id) || self.phase != FormPhase::Submitting {
            return None;
        }

        match result {
            Ok(()) => {
                self.transition(FormEvent::ServerAccepted);
                self.message = Some(SUCCESS_MESSAGE.to_string());
                self.fields.clear();
                self.errors.clear();
                self.type_picker.set_selected(None);
            }
            Err(e) => {
                self.transition(FormEvent::ServerRejected);
                self.message = Some(e.user_message(CREATE_FALLBACK_MESSAGE));
            }
        }

        self.message.as_deref()
    }

    /// Release the ticket once the list refresh has been dispatched
    pub fn settle(&mut self, ticket: SubmissionTicket) {
        if self.in_flight != Some(ticket.id) {
            return;
        }
        if self.phase == FormPhase::Submitting {
            // Settling without an answer counts as a failure
            self.complete(&ticket, Err(crate::IncidentError::Transport(String::new())));
        }
        self.transition(FormEvent::Settled);
        self.in_flight = None;
    }

    fn transition(&mut self, event: FormEvent) {
        match self.phase.next(event) {
            Some(next) => self.phase = next,
            None => tracing::warn!(phase = ?self.phase, event = ?event, "Ignoring illegal form transition"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropdown::Key;
    use crate::error::IncidentError;
    use crate::models::FieldKey;

    fn filled_form() -> SubmissionForm {
        let mut form = SubmissionForm::new();
        form.set_title("Warehouse fire");
        form.set_incident_type(Some(IncidentType::Fire));
        form.set_lat("40.7128");
        form.set_lng("-74.0060");
        form
    }

    #[test]
    fn test_transition_table() {
        assert_eq!(FormPhase::Idle.next(FormEvent::SubmitRequested), Some(FormPhase::Validating));
        assert_eq!(
            FormPhase::Validating.next(FormEvent::ValidationPassed),
            Some(FormPhase::Submitting)
        );
        assert_eq!(FormPhase::Submitting.next(FormEvent::ServerRejected), Some(FormPhase::Failed));
        assert_eq!(FormPhase::Failed.next(FormEvent::Settled), Some(FormPhase::Idle));
        assert_eq!(FormPhase::Submitting.next(FormEvent::SubmitRequested), None);
        assert_eq!(FormPhase::Idle.next(FormEvent::ServerAccepted), None);
    }

    #[test]
    fn test_invalid_submit_returns_to_idle_without_ticket() {
        let mut form = SubmissionForm::new();
        let step = form.begin_submit();

        let SubmitStep::Invalid(errors) = step else {
            panic!("expected validation errors");
        };
        assert!(errors.contains(FieldKey::Title));
        assert!(errors.contains(FieldKey::IncidentType));
        assert_eq!(form.phase(), FormPhase::Idle);
        assert!(!form.is_submitting());
        assert_eq!(form.errors(), &errors);
    }

    #[test]
    fn test_successful_submit_clears_form() {
        let mut form = filled_form();
        let SubmitStep::Ready { ticket, request } = form.begin_submit() else {
            panic!("expected a ready submission");
        };
        assert!(!request.is_multipart());
        assert_eq!(form.phase(), FormPhase::Submitting);
        assert_eq!(form.submit_label(), "Saving...");

        assert_eq!(form.complete(&ticket, Ok(())), Some(SUCCESS_MESSAGE));
        assert_eq!(form.phase(), FormPhase::Succeeded);
        assert_eq!(form.fields(), &FormFields::default());
        assert_eq!(form.type_picker().selected_value(), None);

        form.settle(ticket);
        assert_eq!(form.phase(), FormPhase::Idle);
        assert!(!form.is_submitting());
        assert_eq!(form.message(), Some(SUCCESS_MESSAGE));
    }

    #[test]
    fn test_failed_submit_keeps_fields() {
        let mut form = filled_form();
        let SubmitStep::Ready { ticket, .. } = form.begin_submit() else {
            panic!("expected a ready submission");
        };

        form.complete(&ticket, Err(IncidentError::rejected(500, "server error")));
        assert_eq!(form.message(), Some("server error"));
        assert_eq!(form.fields().title, "Warehouse fire");
        form.settle(ticket);
        assert_eq!(form.phase(), FormPhase::Idle);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_ignored() {
        let mut form = filled_form();
        let SubmitStep::Ready { ticket, .. } = form.begin_submit() else {
            panic!("expected a ready submission");
        };

        assert!(matches!(form.begin_submit(), SubmitStep::Busy));
        assert_eq!(form.phase(), FormPhase::Submitting);

        form.complete(&ticket, Ok(()));
        form.settle(ticket);
        form.set_title("Second report");
        form.set_incident_type(Some(IncidentType::Hazmat));
        assert!(matches!(form.begin_submit(), SubmitStep::Ready { .. }));
    }

    #[test]
    fn test_new_submit_clears_previous_message() {
        let mut form = filled_form();
        let SubmitStep::Ready { ticket, .. } = form.begin_submit() else {
            panic!("expected a ready submission");
        };
        form.complete(&ticket, Err(IncidentError::rejected(400, "bad")));
        form.settle(ticket);
        assert_eq!(form.message(), Some("bad"));

        form.set_title("");
        form.begin_submit();
        assert_eq!(form.message(), None);
    }

    #[test]
    fn test_settle_without_answer_counts_as_failure() {
        let mut form = filled_form();
        let SubmitStep::Ready { ticket, .. } = form.begin_submit() else {
            panic!("expected a ready submission");
        };
        form.settle(ticket);
        assert_eq!(form.phase(), FormPhase::Idle);
        assert_eq!(form.message(), Some(CREATE_FALLBACK_MESSAGE));
    }

    #[test]
    fn test_picker_commit_sets_incident_type() {
        let mut form = SubmissionForm::new();
        form.handle_type_picker(DropdownEvent::TriggerClicked);
        form.handle_type_picker(DropdownEvent::MenuKey(Key::ArrowUp));
        form.handle_type_picker(DropdownEvent::MenuKey(Key::Space));
        assert_eq!(form.fields().incident_type, Some(IncidentType::Hazmat));

        // Highlight changes alone never touch the field
        form.handle_type_picker(DropdownEvent::TriggerClicked);
        form.handle_type_picker(DropdownEvent::MenuKey(Key::ArrowDown));
        form.handle_type_picker(DropdownEvent::GlobalKey(Key::Escape));
        assert_eq!(form.fields().incident_type, Some(IncidentType::Hazmat));
    }
}
