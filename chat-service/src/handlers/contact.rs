use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;
use crate::models::{ContactDetails, ContactSubject, ContactSubmission};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(
        length(max = 200, message = "Name is too long"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub subject: ContactSubject,
    #[validate(
        length(max = 5000, message = "Message is too long"),
        custom(function = "not_blank")
    )]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
    pub warnings: Vec<String>,
}

#[tracing::instrument(skip(state, request), fields(subject = request.subject.label()))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    request.validate()?;

    let submission = ContactSubmission::new(
        ContactDetails {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            subject: request.subject,
        },
        request.message,
    );

    let warnings = state.chat.submit_contact(submission).await;
    if !warnings.is_empty() {
        tracing::warn!(?warnings, "Contact submission accepted but not fully recorded");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ContactResponse {
            status: "received",
            warnings,
        }),
    ))
}
