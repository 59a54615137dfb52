//! Consultation routes: render the page, apply form posts, expose JSON.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::{error, info};

use crate::services::consultation::ConsultationError;
use crate::services::intake::IntakeForm;
use crate::services::session::{SessionState, SharedSession, log_id};
use crate::state::AppState;
use crate::view::PageContext;

pub(crate) const COOKIE_NAME: &str = "docai_session";

const SERVICE_UNAVAILABLE_NOTICE: &str =
    "The doctor could not be reached just now. Your details were not lost; please try again.";

// =============================================================================
// SESSION COOKIE
// =============================================================================

/// Resolve the caller's session, issuing a fresh cookie when needed. The
/// cookie is re-sent on every response so its max-age tracks activity.
async fn open_session(state: &AppState, jar: CookieJar) -> (CookieJar, String, SharedSession) {
    let presented = jar.get(COOKIE_NAME).map(|c| c.value().to_owned());
    let (token, session) = state.sessions.open(presented.as_deref()).await;
    let max_age = Duration::seconds(i64::try_from(state.cookies.max_age_secs).unwrap_or(i64::MAX));
    let cookie = Cookie::build((COOKIE_NAME, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookies.secure)
        .max_age(max_age);
    (jar.add(cookie), token, session)
}

// =============================================================================
// RESPONSES
// =============================================================================

pub(crate) fn consultation_error_to_status(err: &ConsultationError) -> StatusCode {
    match err {
        ConsultationError::Validation(_) | ConsultationError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        ConsultationError::AlreadyStarted | ConsultationError::NotStarted => StatusCode::CONFLICT,
        ConsultationError::Service(_) => StatusCode::BAD_GATEWAY,
    }
}

fn render(state: &AppState, status: StatusCode, page: &PageContext) -> Response {
    match state.views.render_page(page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page rendering failed").into_response()
        }
    }
}

/// Page shown after a rejected transition. The session is re-read so the
/// page reflects whatever the transition left behind.
fn error_page(state: &AppState, session: &SessionState, err: ConsultationError, form: Option<IntakeForm>) -> Response {
    let status = consultation_error_to_status(&err);
    let page = PageContext::from_session(session, state.consultation.variant());
    let page = match (err, form) {
        (ConsultationError::Validation(v), Some(form)) => page.with_validation_error(form, &v),
        (ConsultationError::Service(_), Some(form)) => {
            PageContext { form, ..page }.with_notice(SERVICE_UNAVAILABLE_NOTICE)
        }
        (ConsultationError::Service(_), None) => page.with_notice(SERVICE_UNAVAILABLE_NOTICE),
        (other, _) => page.with_notice(other.to_string()),
    };
    render(state, status, &page)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: intake form or consultation transcript. Read-only.
///
/// Never waits on the session lock: while a completion is in flight the
/// page shows a self-refreshing notice instead.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, _, session) = open_session(&state, jar).await;
    let variant = state.consultation.variant();
    let page = match session.try_lock() {
        Ok(session) => PageContext::from_session(&session, variant),
        Err(_) => PageContext::busy(variant),
    };
    (jar, render(&state, StatusCode::OK, &page)).into_response()
}

/// `POST /consultation`: submit the intake form and get the first reply.
pub async fn submit(State(state): State<AppState>, jar: CookieJar, Form(form): Form<IntakeForm>) -> Response {
    let (jar, token, session) = open_session(&state, jar).await;
    let mut session = session.lock().await;

    let outcome = state.consultation.submit(&mut session, &form).await;
    state.sessions.touch(&token).await;
    match outcome {
        Ok(()) => {
            info!(session = log_id(&token), "intake accepted");
            (jar, Redirect::to("/")).into_response()
        }
        Err(e) => {
            info!(session = log_id(&token), error = %e, "intake rejected");
            (jar, error_page(&state, &session, e, Some(form))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub message: String,
}

/// `POST /consultation/messages`: send a follow-up message.
pub async fn send_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<MessageForm>,
) -> Response {
    let (jar, token, session) = open_session(&state, jar).await;
    let mut session = session.lock().await;

    let outcome = state
        .consultation
        .send_message(&mut session, &body.message)
        .await;
    state.sessions.touch(&token).await;
    match outcome {
        Ok(()) => (jar, Redirect::to("/")).into_response(),
        Err(e) => {
            info!(session = log_id(&token), error = %e, "message rejected");
            (jar, error_page(&state, &session, e, None)).into_response()
        }
    }
}

/// `POST /consultation/reset`: discard intake and transcript.
pub async fn reset(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, _, session) = open_session(&state, jar).await;
    let mut session = session.lock().await;
    state.consultation.reset(&mut session);
    (jar, Redirect::to("/")).into_response()
}

/// `GET /api/session`: JSON snapshot. Never creates a session.
pub async fn session_snapshot(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    let snapshot = match state.sessions.get(token).await {
        Some(session) => session.lock().await.snapshot(),
        None => SessionState::new().snapshot(),
    };
    Json(snapshot).into_response()
}

#[cfg(test)]
#[path = "consultation_test.rs"]
mod tests;
