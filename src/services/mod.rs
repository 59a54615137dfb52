//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `intake` validates the form, `prompt` turns a valid intake into the
//! opening instruction, `session` owns per-visitor state, and
//! `consultation` drives the transitions between them. Route handlers stay
//! focused on cookies, forms and status codes.

pub mod consultation;
pub mod intake;
pub mod prompt;
pub mod session;
