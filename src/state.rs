//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the consultation controller (completion client + intake
//! variant), the in-memory session store, compiled page templates, and
//! cookie settings. Per-session data lives in the store, never here.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmChat;
use crate::services::consultation::Consultation;
use crate::services::intake::IntakeVariant;
use crate::services::session::SessionStore;
use crate::view::{RenderError, Views};

/// How the session cookie is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: u64,
}

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub consultation: Consultation,
    pub sessions: SessionStore,
    pub views: Arc<Views>,
    pub cookies: CookieSettings,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the embedded templates fail to compile.
    pub fn new(llm: Arc<dyn LlmChat>, config: &AppConfig) -> Result<Self, RenderError> {
        Self::with_parts(
            llm,
            config.variant,
            CookieSettings { secure: config.cookie_secure, max_age_secs: config.session_idle_secs },
        )
    }

    /// # Errors
    ///
    /// Returns an error if the embedded templates fail to compile.
    pub fn with_parts(
        llm: Arc<dyn LlmChat>,
        variant: IntakeVariant,
        cookies: CookieSettings,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            consultation: Consultation::new(llm, variant),
            sessions: SessionStore::new(),
            views: Arc::new(Views::new()?),
            cookies,
        })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
