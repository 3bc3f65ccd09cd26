//! Chat session and message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CustomerId, MessageId, SessionId, TicketId};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
    User,
}

/// Persisted session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

/// Persisted record of one continuous chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub status: SessionStatus,
    /// Customer the session was linked to when a ticket was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Ticket produced by this session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    /// Set when a human agent has taken over the conversation.
    #[serde(default)]
    pub takeover: bool,
    pub started_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates a new active session.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            status: SessionStatus::Active,
            customer_id: None,
            ticket_id: None,
            takeover: false,
            started_at: Utc::now(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A single message in a session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender: Sender,
    pub text: String,
    /// Structured ticket reference attached to the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn new(session_id: SessionId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            sender,
            text: text.into(),
            ticket_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches a ticket reference.
    pub fn with_ticket(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }
}
