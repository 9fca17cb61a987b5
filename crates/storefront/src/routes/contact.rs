//! Contact form route handler.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

use super::Ack;
use crate::error::Result;
use crate::services::{ContactMessage, submit_contact};

#[derive(Debug, Serialize)]
pub struct Received {}

/// POST /api/contact
///
/// The message is recorded as a structured log event.
#[instrument(skip(form), fields(subject = %form.subject))]
pub async fn submit(Json(form): Json<ContactMessage>) -> Result<Json<Ack<Received>>> {
    submit_contact(&form)?;
    Ok(Json(Ack::ok(
        "Thanks for your message, we'll get back to you soon",
        Received {},
    )))
}
