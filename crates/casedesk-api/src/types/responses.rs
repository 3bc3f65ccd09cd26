//! Response DTOs for the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use casedesk_core::SlaStatus;
use casedesk_intake::{BotReply, ChatEntry, Conversation, Stage};
use casedesk_models::{ChatMessage, Sender, SlaRule, Ticket, TicketNote};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Whether a persistence store is configured.
    pub store: bool,
}

/// One chat message as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub sender: Sender,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatEntry> for MessageView {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            sender: entry.sender,
            text: entry.text.clone(),
            ticket_id: entry.ticket_id.as_ref().map(|id| id.to_string()),
            created_at: entry.at,
        }
    }
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender: message.sender,
            text: message.text.clone(),
            ticket_id: message.ticket_id.as_ref().map(|id| id.to_string()),
            created_at: message.created_at,
        }
    }
}

/// Full conversation state.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub session_id: Option<String>,
    pub stage: Stage,
    pub takeover: bool,
    pub last_ticket: Option<String>,
    pub messages: Vec<MessageView>,
}

impl ConversationResponse {
    pub fn new(id: impl Into<String>, conversation: &Conversation) -> Self {
        Self {
            id: id.into(),
            session_id: conversation.session_id().map(|s| s.to_string()),
            stage: conversation.stage(),
            takeover: conversation.is_taken_over(),
            last_ticket: conversation.last_ticket().map(|t| t.to_string()),
            messages: conversation.history().iter().map(MessageView::from).collect(),
        }
    }
}

/// Result of a conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub conversation_id: String,
    pub stage: Stage,
    /// Replies available immediately.
    pub replies: Vec<BotReply>,
    /// Replies that will appear after the typing delay.
    pub pending_replies: usize,
    /// Whether a ticket is being created in the background.
    pub creating: bool,
}

/// Ticket summary for list responses.
#[derive(Debug, Clone, Serialize)]
pub struct TicketSummary {
    pub id: String,
    pub case_number: String,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub customer_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            case_number: ticket.case_number.clone(),
            title: ticket.title.clone(),
            priority: ticket.priority.as_str().to_string(),
            status: ticket.status.as_str().to_string(),
            customer_id: ticket.customer_id.to_string(),
            created_at: ticket.created_at,
        }
    }
}

/// Ticket list response.
#[derive(Debug, Clone, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketSummary>,
    /// Number of matching tickets before `limit` is applied.
    pub total: usize,
}

/// SLA status as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SlaView {
    pub is_breached: bool,
    pub hours: i64,
    pub minutes: i64,
    /// `"{h}h {m}m"`.
    pub display: String,
    pub rule_name: String,
    pub target: DateTime<Utc>,
}

impl From<&SlaStatus> for SlaView {
    fn from(status: &SlaStatus) -> Self {
        Self {
            is_breached: status.is_breached,
            hours: status.hours,
            minutes: status.minutes,
            display: status.time_string(),
            rule_name: status.rule_name.clone(),
            target: status.target,
        }
    }
}

/// Ticket status lookup response.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetailResponse {
    pub ticket: Ticket,
    pub session_id: Option<String>,
    pub messages: Vec<MessageView>,
    pub sla: Option<SlaView>,
}

/// SLA-only response, suitable for polling.
#[derive(Debug, Clone, Serialize)]
pub struct TicketSlaResponse {
    pub ticket_id: String,
    pub sla: Option<SlaView>,
}

/// Result of a status transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResponse {
    pub ticket: Ticket,
    /// Whether a resolution notice went out; absent when none was due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified: Option<bool>,
}

/// A ticket's notes, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct NoteListResponse {
    pub ticket_id: String,
    pub notes: Vec<TicketNote>,
}

/// SLA rule list response.
#[derive(Debug, Clone, Serialize)]
pub struct RuleListResponse {
    pub rules: Vec<SlaRule>,
    pub total: usize,
}
