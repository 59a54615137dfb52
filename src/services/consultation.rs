//! Consultation controller: the `Intake` / `Active` state machine.
//!
//! DESIGN
//! ======
//! `Intake --submit--> Active`: validate, build prompts, ask the model with
//! only the instruction prompt, then commit intake + `[summary, reply]` in
//! one step. `Active --message--> Active`: append the user message, replay
//! the whole transcript, append the reply. `Active --reset--> Intake`.
//!
//! The first call deliberately sees the instruction prompt and not the
//! summary; every later call sees the summary and never the instruction.
//!
//! ERROR HANDLING
//! ==============
//! Validation and state errors leave the session untouched and make no
//! completion call. A failed completion is not retried. On submit nothing
//! has been committed yet, so the session stays in `Intake`; on a follow-up
//! message the user's text stays in the transcript without a reply.

use std::sync::Arc;

use tracing::{info, warn};

use super::intake::{IntakeForm, IntakeVariant, ValidationError};
use super::prompt;
use super::session::SessionState;
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("completion service failed: {0}")]
    Service(#[from] LlmError),
    #[error("a consultation is already in progress; start over to submit new details")]
    AlreadyStarted,
    #[error("no consultation in progress; submit your details first")]
    NotStarted,
    #[error("message is empty")]
    EmptyMessage,
}

/// Conversation controller bound to one completion client and intake variant.
#[derive(Clone)]
pub struct Consultation {
    llm: Arc<dyn LlmChat>,
    variant: IntakeVariant,
}

impl Consultation {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, variant: IntakeVariant) -> Self {
        Self { llm, variant }
    }

    #[must_use]
    pub fn variant(&self) -> IntakeVariant {
        self.variant
    }

    /// `Intake --submit--> Active`.
    ///
    /// # Errors
    ///
    /// [`ConsultationError::AlreadyStarted`] when the session is active,
    /// [`ConsultationError::Validation`] for a bad form, and
    /// [`ConsultationError::Service`] when the first completion fails.
    pub async fn submit(&self, session: &mut SessionState, form: &IntakeForm) -> Result<(), ConsultationError> {
        if session.is_started() {
            return Err(ConsultationError::AlreadyStarted);
        }
        let intake = self.variant.validate(form)?;
        let built = prompt::build(&intake);

        info!(
            variant = self.variant.as_str(),
            instruction_len = built.instruction.len(),
            "consultation: requesting first reply"
        );
        let reply = self
            .llm
            .chat(&[Message::user(built.instruction)])
            .await
            .inspect_err(|e| warn!(error = %e, "consultation: first completion failed"))?;

        session.begin(intake, Message::user(built.summary), reply.into_message());
        info!(transcript_len = session.transcript().len(), "consultation: started");
        Ok(())
    }

    /// `Active --message--> Active`.
    ///
    /// # Errors
    ///
    /// [`ConsultationError::NotStarted`] in `Intake`,
    /// [`ConsultationError::EmptyMessage`] for blank text, and
    /// [`ConsultationError::Service`] when the completion fails (the user
    /// message has already been appended at that point).
    pub async fn send_message(&self, session: &mut SessionState, text: &str) -> Result<(), ConsultationError> {
        if !session.is_started() {
            return Err(ConsultationError::NotStarted);
        }
        if text.trim().is_empty() {
            return Err(ConsultationError::EmptyMessage);
        }

        session.push(Message::user(text));
        info!(
            transcript_len = session.transcript().len(),
            message_len = text.len(),
            "consultation: requesting reply"
        );
        let reply = self
            .llm
            .chat(session.transcript())
            .await
            .inspect_err(|e| warn!(error = %e, "consultation: completion failed, message left unanswered"))?;

        session.push(reply.into_message());
        Ok(())
    }

    /// `Active --reset--> Intake`. Also a no-op in `Intake`.
    pub fn reset(&self, session: &mut SessionState) {
        if session.is_started() {
            info!(transcript_len = session.transcript().len(), "consultation: reset");
        }
        session.reset();
    }
}

#[cfg(test)]
#[path = "consultation_test.rs"]
mod tests;
