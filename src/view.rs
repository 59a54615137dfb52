//! Server-side page rendering.
//!
//! SYSTEM CONTEXT
//! ==============
//! Rendering is a pure function of a `SessionState` snapshot plus optional
//! form echo and validation errors. It never mutates the session and never
//! touches the completion client, so a page can be rendered any number of
//! times. Templates are compiled into the binary; `.html` templates
//! auto-escape, so transcript text is always inserted as text.

use std::collections::BTreeMap;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::llm::types::Message;
use crate::services::intake::{Gender, IntakeForm, IntakeVariant, ValidationError};
use crate::services::session::SessionState;

pub const PAGE_TITLE: &str = "DocAI - Your AI Medical Assistant";

pub const BUSY_NOTICE: &str = "Doctor is thinking...";

/// Reload interval for the page shown while a reply is pending.
const BUSY_REFRESH_SECS: u64 = 3;

const PAGE_TEMPLATE: &str = "page.html";

#[derive(Debug, thiserror::Error)]
#[error("template rendering failed: {0}")]
pub struct RenderError(#[from] minijinja::Error);

/// Everything the page template needs.
#[derive(Debug, Default, Serialize)]
pub struct PageContext {
    pub variant: &'static str,
    pub started: bool,
    /// A transition is in flight; the session can't be read yet.
    pub busy: bool,
    pub transcript: Vec<Message>,
    /// Values to re-fill the intake form with after a rejected submission.
    pub form: IntakeForm,
    /// Field name -> message, shown next to the field.
    pub errors: BTreeMap<&'static str, String>,
    /// Banner shown above the form or transcript.
    pub notice: Option<String>,
}

impl PageContext {
    #[must_use]
    pub fn from_session(session: &SessionState, variant: IntakeVariant) -> Self {
        Self {
            variant: variant.as_str(),
            started: session.is_started(),
            transcript: session.transcript().to_vec(),
            ..Self::default()
        }
    }

    /// Placeholder page while another request holds the session.
    #[must_use]
    pub fn busy(variant: IntakeVariant) -> Self {
        Self { variant: variant.as_str(), busy: true, notice: Some(BUSY_NOTICE.to_owned()), ..Self::default() }
    }

    /// Echo the rejected form back with the error attached to its field.
    #[must_use]
    pub fn with_validation_error(mut self, form: IntakeForm, err: &ValidationError) -> Self {
        self.errors.insert(err.field().name(), err.to_string());
        self.form = form;
        self
    }

    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Compiled templates.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// # Errors
    ///
    /// Returns an error if an embedded template has a syntax error.
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("templates/page.html"))?;
        Ok(Self { env })
    }

    /// # Errors
    ///
    /// Returns an error if the template fails to evaluate.
    pub fn render_page(&self, page: &PageContext) -> Result<String, RenderError> {
        let genders: Vec<&str> = Gender::ALL.iter().map(|g| g.as_str()).collect();
        let tmpl = self.env.get_template(PAGE_TEMPLATE)?;
        Ok(tmpl.render(context! {
            title => PAGE_TITLE,
            busy_refresh_secs => BUSY_REFRESH_SECS,
            genders => genders,
            page => page,
        })?)
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
