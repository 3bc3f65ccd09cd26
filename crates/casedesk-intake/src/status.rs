//! Ticket status lookup, conversation resumption, status transitions and
//! agent notes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use casedesk_core::{deliver, render_resolution_notice, sla, Notifier, ResolutionDetails, SlaStatus};
use casedesk_models::{ChatMessage, SessionId, Ticket, TicketId, TicketNote, TicketStatus};

use crate::conversation::{Conversation, Draft, Stage};
use crate::error::{IntakeError, Result};
use crate::service::IntakeService;

/// A ticket with its originating conversation and current SLA.
#[derive(Debug, Clone, Serialize)]
pub struct TicketLookup {
    pub ticket: Ticket,
    pub session_id: Option<SessionId>,
    /// The originating session's messages, oldest first.
    pub history: Vec<ChatMessage>,
    pub sla: Option<SlaStatus>,
}

/// Result of an external status change.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub ticket: Ticket,
    /// Whether a resolution notice went out. None when no notice was due.
    pub notified: Option<bool>,
}

impl IntakeService {
    /// Looks up a ticket by id, with its originating session's history and
    /// SLA status at `now`.
    pub fn lookup_ticket(&self, ticket_id: &str, now: DateTime<Utc>) -> Result<TicketLookup> {
        let store = self.require_store()?;
        let ticket_id = ticket_id.trim();
        if ticket_id.is_empty() {
            return Err(IntakeError::Validation("ticket id is empty".to_string()));
        }

        let id = TicketId::from_string(ticket_id);
        let ticket = store
            .find_ticket(&id)?
            .ok_or_else(|| IntakeError::LookupNotFound(ticket_id.to_string()))?;

        let session_id = store.find_session_by_ticket(&id)?;
        let history = match &session_id {
            Some(session_id) => store.list_messages(session_id)?,
            None => Vec::new(),
        };

        let rules = store.list_sla_rules()?;
        let sla = sla::evaluate(&ticket, &rules, now);

        Ok(TicketLookup {
            ticket,
            session_id,
            history,
            sla,
        })
    }

    /// Current SLA status of a ticket. None when the ticket is finished or no
    /// rules exist.
    pub fn sla_status(&self, ticket_id: &TicketId, now: DateTime<Utc>) -> Result<Option<SlaStatus>> {
        let store = self.require_store()?;
        let ticket = store
            .find_ticket(ticket_id)?
            .ok_or_else(|| IntakeError::LookupNotFound(ticket_id.to_string()))?;
        let rules = store.list_sla_rules()?;
        Ok(sla::evaluate(&ticket, &rules, now))
    }

    /// Rebinds to a persisted session in the PostCreation stage so the user
    /// can keep adding notes.
    pub fn resume(&self, session_id: &SessionId) -> Result<Conversation> {
        let store = self.require_store()?;
        let session = store
            .find_session(session_id)?
            .ok_or_else(|| IntakeError::LookupNotFound(session_id.to_string()))?;
        let messages = store.list_messages(session_id)?;

        let mut conversation =
            Conversation::resume(session.id, &messages, Stage::PostCreation, Draft::default());
        conversation.set_takeover(session.takeover);

        info!(session_id = %session_id, messages = messages.len(), "Conversation resumed");
        Ok(conversation)
    }

    /// Moves a ticket to `status`.
    ///
    /// Entering Resolved or Closed from an active status sends a resolution
    /// notice to the customer. Delivery problems are logged and reported in
    /// the result; they never fail the transition.
    pub fn update_ticket_status(
        &self,
        ticket_id: &TicketId,
        status: TicketStatus,
        resolution_notes: Option<String>,
        notifier: &dyn Notifier,
    ) -> Result<StatusChange> {
        let store = self.require_store()?;
        let mut ticket = store
            .find_ticket(ticket_id)?
            .ok_or_else(|| IntakeError::LookupNotFound(ticket_id.to_string()))?;

        let was_active = ticket.status.is_active();
        ticket.set_status(status);
        if let Some(notes) = resolution_notes.filter(|n| !n.trim().is_empty()) {
            ticket.resolution_notes = Some(notes);
        }
        store.save_ticket(&ticket)?;
        info!(ticket_id = %ticket.id, status = ticket.status.as_str(), "Ticket status updated");

        let notified = if was_active && status.is_finished() {
            Some(self.notify_resolution(&ticket, notifier))
        } else {
            None
        };

        Ok(StatusChange { ticket, notified })
    }

    /// Adds an agent note to a ticket. The text is trimmed and must not be
    /// blank.
    pub fn add_ticket_note(
        &self,
        ticket_id: &TicketId,
        text: &str,
        internal: bool,
    ) -> Result<TicketNote> {
        let store = self.require_store()?;
        if text.trim().is_empty() {
            return Err(IntakeError::Validation("Note cannot be empty".to_string()));
        }
        let mut ticket = store
            .find_ticket(ticket_id)?
            .ok_or_else(|| IntakeError::LookupNotFound(ticket_id.to_string()))?;

        let note = ticket.add_note(TicketNote::new(text, internal)).clone();
        store.save_ticket(&ticket)?;
        info!(ticket_id = %ticket.id, note_id = %note.id, internal, "Ticket note added");
        Ok(note)
    }

    /// A ticket's notes, newest first.
    pub fn ticket_notes(&self, ticket_id: &TicketId) -> Result<Vec<TicketNote>> {
        let store = self.require_store()?;
        let ticket = store
            .find_ticket(ticket_id)?
            .ok_or_else(|| IntakeError::LookupNotFound(ticket_id.to_string()))?;
        Ok(ticket.notes_newest_first().into_iter().cloned().collect())
    }

    fn notify_resolution(&self, ticket: &Ticket, notifier: &dyn Notifier) -> bool {
        let Some(store) = &self.store else {
            return false;
        };

        let user = store
            .find_customer(&ticket.customer_id)
            .ok()
            .flatten()
            .and_then(|profile| store.find_user(&profile.user_id).ok().flatten());

        let Some(user) = user else {
            warn!(ticket_id = %ticket.id, "No contact address for resolution notice");
            return false;
        };

        let name = Some(user.display_name());
        let notice = render_resolution_notice(&user.email, &ResolutionDetails::from_ticket(ticket, name));
        deliver(notifier, &notice)
    }
}
