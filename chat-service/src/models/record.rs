//! Persisted conversation log entries.

use super::turn::now_millis;
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    ChatTurn,
    ContactForm,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::ChatTurn => write!(f, "chat_turn"),
            RecordKind::ContactForm => write!(f, "contact_form"),
        }
    }
}

/// Topics offered on the portal's contact form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactSubject {
    #[serde(rename = "Admission Inquiry")]
    AdmissionInquiry,
    #[serde(rename = "Program Information")]
    ProgramInformation,
    #[serde(rename = "Campus Visit Request")]
    CampusVisitRequest,
    #[serde(rename = "Current Student Issue")]
    CurrentStudentIssue,
    #[serde(rename = "Technical Support (Portal)")]
    TechnicalSupport,
    #[serde(rename = "General Question")]
    #[default]
    GeneralQuestion,
    #[serde(rename = "Feedback")]
    Feedback,
    #[serde(rename = "Other")]
    Other,
}

impl ContactSubject {
    pub fn label(&self) -> &'static str {
        match self {
            ContactSubject::AdmissionInquiry => "Admission Inquiry",
            ContactSubject::ProgramInformation => "Program Information",
            ContactSubject::CampusVisitRequest => "Campus Visit Request",
            ContactSubject::CurrentStudentIssue => "Current Student Issue",
            ContactSubject::TechnicalSupport => "Technical Support (Portal)",
            ContactSubject::GeneralQuestion => "General Question",
            ContactSubject::Feedback => "Feedback",
            ContactSubject::Other => "Other",
        }
    }
}

/// Who wrote in through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub subject: ContactSubject,
}

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactSubmission {
    pub details: ContactDetails,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

impl ContactSubmission {
    pub fn new(details: ContactDetails, message: String) -> Self {
        Self {
            details,
            message,
            submitted_at: now_millis(),
        }
    }
}

/// One entry in the conversations collection. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Assigned by the store on insert.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub kind: RecordKind,

    /// Visitor text. For contact forms, the submitted message.
    pub user_query: String,

    /// Assistant reply. Empty for contact forms.
    pub bot_response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactDetails>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Record a completed question/answer exchange.
    pub fn chat_turn(
        session_id: impl Into<String>,
        user_query: impl Into<String>,
        bot_response: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind: RecordKind::ChatTurn,
            user_query: user_query.into(),
            bot_response: bot_response.into(),
            session_id: Some(session_id.into()),
            contact: None,
            created_at: now_millis(),
        }
    }

    /// Record a contact form submission.
    pub fn contact_form(submission: &ContactSubmission) -> Self {
        Self {
            id: None,
            kind: RecordKind::ContactForm,
            user_query: submission.message.clone(),
            bot_response: String::new(),
            session_id: None,
            contact: Some(submission.details.clone()),
            created_at: submission.submitted_at,
        }
    }

    /// Hex form of the store identifier, if assigned.
    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn chat_turn_record_bson_shape() {
        let record = ConversationRecord::chat_turn("s-1", "What programs?", "Engineering, ...");
        let doc = bson::to_document(&record).unwrap();

        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("contact"));
        assert_eq!(doc.get_str("kind").unwrap(), "chat_turn");
        assert_eq!(doc.get_str("user_query").unwrap(), "What programs?");
        assert!(doc.get_datetime("created_at").is_ok());
    }

    #[test]
    fn bson_round_trip_keeps_timestamp() {
        let record = ConversationRecord::chat_turn("s-1", "hi", "hello");
        let doc = bson::to_document(&record).unwrap();
        let back: ConversationRecord = bson::from_document(doc).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn contact_form_record_carries_details() {
        let submission = ContactSubmission::new(
            ContactDetails {
                name: "Mona".to_string(),
                email: "mona@example.com".to_string(),
                subject: ContactSubject::CampusVisitRequest,
            },
            "Can I visit on Sunday?".to_string(),
        );
        let record = ConversationRecord::contact_form(&submission);

        assert_eq!(record.kind, RecordKind::ContactForm);
        assert_eq!(record.user_query, "Can I visit on Sunday?");
        assert!(record.bot_response.is_empty());
        assert_eq!(record.created_at, submission.submitted_at);

        let doc = bson::to_document(&record).unwrap();
        let contact = doc.get_document("contact").unwrap();
        assert_eq!(contact.get_str("subject").unwrap(), "Campus Visit Request");
    }
}
