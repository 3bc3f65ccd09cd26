//! Request DTOs for the API.

use serde::Deserialize;

/// Send a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Turn human takeover on or off.
#[derive(Debug, Clone, Deserialize)]
pub struct TakeoverRequest {
    pub enabled: bool,
}

/// Ticket list query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketListQuery {
    /// Filter by status (open, in_progress, resolved, closed).
    pub status: Option<String>,
    /// Maximum number of tickets to return.
    pub limit: Option<usize>,
}

/// Move a ticket to another status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status (open, in_progress, resolved, closed).
    pub status: String,
    /// Optional summary of how the ticket was resolved.
    pub resolution_notes: Option<String>,
}

/// Add a note to a ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct AddNoteRequest {
    pub text: String,
    /// Internal notes are for agents only. Defaults to internal.
    #[serde(default)]
    pub internal: Option<bool>,
}
