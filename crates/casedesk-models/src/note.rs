//! Agent notes attached to a ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NoteId;

/// A note an agent left on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketNote {
    pub id: NoteId,
    pub text: String,

    /// Internal notes are visible to agents only. Records without the flag
    /// are treated as internal.
    #[serde(default = "default_internal")]
    pub internal: bool,

    pub at: DateTime<Utc>,
}

fn default_internal() -> bool {
    true
}

impl TicketNote {
    /// Creates a note stamped with the current time. The text is trimmed.
    pub fn new(text: impl AsRef<str>, internal: bool) -> Self {
        Self {
            id: NoteId::new(),
            text: text.as_ref().trim().to_string(),
            internal,
            at: Utc::now(),
        }
    }

    /// Label shown next to the note.
    pub fn visibility(&self) -> &'static str {
        if self.internal {
            "Internal Note"
        } else {
            "Public Note"
        }
    }
}
