pub mod chat;
pub mod contact;
pub mod conversations;
pub mod diagnostics;
pub mod health;
pub mod metrics;
pub mod session;

pub use session::{SessionId, SESSION_HEADER};

use validator::ValidationError;

/// Rejects text that is empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("cannot be blank".into());
        return Err(error);
    }
    Ok(())
}
