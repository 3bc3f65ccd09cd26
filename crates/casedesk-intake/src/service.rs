//! Drives conversations against a support store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use casedesk_core::{ClassificationInput, PriorityClassifier};
use casedesk_models::Ticket;
use casedesk_persistence::{PersistenceError, SupportStore};

use crate::config::IntakeConfig;
use crate::conversation::{BotReply, Conversation, CreationRequest, DeferredReply, Turn};
use crate::error::{IntakeError, Result};
use crate::replies::{RandomPicker, ReplyPicker};

/// Intake engine shared by every conversation.
///
/// The service holds no per-conversation state; callers own each
/// [`Conversation`] and pass it in, so independent sessions never share
/// drafts or stages.
#[derive(Clone)]
pub struct IntakeService {
    pub(crate) store: Option<Arc<dyn SupportStore>>,
    classifier: PriorityClassifier,
    picker: Arc<dyn ReplyPicker>,
    config: IntakeConfig,
}

impl IntakeService {
    /// Creates a service backed by `store`.
    pub fn new(store: Arc<dyn SupportStore>) -> Self {
        Self {
            store: Some(store),
            classifier: PriorityClassifier::default(),
            picker: Arc::new(RandomPicker),
            config: IntakeConfig::default(),
        }
    }

    /// Creates a service with no store. Conversations still run, but nothing
    /// is logged and ticket creation fails with a dependency error.
    pub fn without_store() -> Self {
        Self {
            store: None,
            classifier: PriorityClassifier::default(),
            picker: Arc::new(RandomPicker),
            config: IntakeConfig::default(),
        }
    }

    /// Replaces the acknowledgement picker.
    pub fn with_picker(mut self, picker: impl ReplyPicker + 'static) -> Self {
        self.picker = Arc::new(picker);
        self
    }

    /// Replaces the intake settings.
    pub fn with_config(mut self, config: IntakeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the priority classifier.
    pub fn with_classifier(mut self, classifier: PriorityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn SupportStore>> {
        self.store.as_ref()
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Starts a new, unbound conversation.
    pub fn start(&self) -> Conversation {
        Conversation::with_welcome(&self.config.welcome)
    }

    /// Handles user input: binds a session on first use, advances the state
    /// machine and logs every new message. Closed conversations ignore input.
    pub fn handle_message(&self, conversation: &mut Conversation, text: &str) -> Turn {
        if text.trim().is_empty() || conversation.is_closed() {
            return Turn::default();
        }

        self.ensure_session(conversation);
        let turn = conversation.handle_user_text(text, self.picker.as_ref());
        self.flush(conversation);
        turn
    }

    /// Applies a creation outcome and logs the resulting messages.
    pub fn complete(
        &self,
        conversation: &mut Conversation,
        request: &CreationRequest,
        outcome: Result<Ticket>,
    ) -> Turn {
        let turn = conversation.complete_creation(request, outcome);
        self.flush(conversation);
        turn
    }

    /// Releases a deferred reply and logs it if it was still current.
    pub fn deliver(&self, conversation: &mut Conversation, deferred: DeferredReply) -> Option<BotReply> {
        let reply = conversation.deliver(deferred);
        if reply.is_some() {
            self.flush(conversation);
        }
        reply
    }

    /// Starts another ticket. The next message binds a fresh session.
    pub fn start_new_ticket(&self, conversation: &mut Conversation) -> Result<Turn> {
        let previous = conversation.session_id().cloned();
        let turn = conversation.start_new_ticket()?;
        debug!(previous_session = ?previous.as_ref().map(|s| s.as_str()), "Conversation reset");
        Ok(turn)
    }

    /// Sets or clears human takeover and records it on the bound session.
    pub fn set_takeover(&self, conversation: &mut Conversation, takeover: bool) {
        conversation.set_takeover(takeover);

        if let (Some(store), Some(session_id)) = (&self.store, conversation.session_id()) {
            if let Err(e) = store.set_session_takeover(session_id, takeover) {
                warn!(session_id = %session_id, error = %e, "Failed to persist takeover flag");
            }
        }
        info!(takeover, "Takeover updated");
    }

    /// Runs a full turn synchronously: creates the ticket inline and releases
    /// deferred replies without waiting. Returns every reply in display order.
    pub fn respond(&self, conversation: &mut Conversation, text: &str) -> Vec<BotReply> {
        let turn = self.handle_message(conversation, text);
        let mut replies = turn.replies;
        let mut deferred = turn.deferred;

        if let Some(request) = turn.creation {
            let outcome = self.create_ticket(&request);
            let completed = self.complete(conversation, &request, outcome);
            replies.extend(completed.replies);
            deferred.extend(completed.deferred);
        }

        for pending in deferred {
            if let Some(reply) = self.deliver(conversation, pending) {
                replies.push(reply);
            }
        }
        replies
    }

    /// Creates the ticket for a creation request.
    ///
    /// Resolves the customer by email (creating the user and profile when
    /// missing), classifies the description with the profile's signal, stores
    /// the ticket and links it to the requesting session.
    pub fn create_ticket(&self, request: &CreationRequest) -> Result<Ticket> {
        let store = self.require_store()?;

        let user = store
            .find_or_create_user(&request.email)
            .map_err(|e| creation_failure("Failed to create user account", e))?;
        let profile = store
            .find_or_create_profile(&user.id)
            .map_err(|e| creation_failure("Failed to create customer profile", e))?;

        let input = ClassificationInput::new(&request.description).with_signal(profile.signal());
        let priority = self.classifier.classify(&input);

        let ticket = store
            .create_ticket(&request.description, priority, &profile.id)
            .map_err(|e| creation_failure("Failed to create ticket", e))?;

        if let Some(session_id) = &request.session_id {
            if let Err(e) = store.update_session_ticket_link(session_id, &ticket.id, &profile.id) {
                warn!(session_id = %session_id, ticket_id = %ticket.id, error = %e, "Failed to link session to ticket");
            }
        }

        info!(
            ticket_id = %ticket.id,
            case_number = %ticket.case_number,
            priority = %ticket.priority,
            customer_id = %profile.id,
            "Ticket created"
        );
        Ok(ticket)
    }

    pub(crate) fn require_store(&self) -> Result<&Arc<dyn SupportStore>> {
        self.store.as_ref().ok_or_else(|| {
            IntakeError::DependencyUnavailable("no persistence store is configured".to_string())
        })
    }

    /// Lazily creates the persisted session. Failure leaves the conversation
    /// unbound; the next message tries again.
    fn ensure_session(&self, conversation: &mut Conversation) {
        if conversation.session_id().is_some() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };

        match store.create_session() {
            Ok(session) => {
                info!(session_id = %session.id, "Chat session started");
                conversation.bind_session(session.id);
            }
            Err(e) => warn!(error = %e, "Failed to create chat session"),
        }
    }

    /// Appends unlogged history entries in order, stopping at the first
    /// failure so the rest are retried later.
    fn flush(&self, conversation: &mut Conversation) {
        let (Some(store), Some(session_id)) = (&self.store, conversation.session_id().cloned()) else {
            return;
        };

        let mut written = 0;
        for entry in conversation.unpersisted() {
            if let Err(e) = store.append_chat_message(&entry.to_message(&session_id)) {
                warn!(session_id = %session_id, error = %e, "Failed to append chat message");
                break;
            }
            written += 1;
        }
        conversation.mark_persisted(written);
    }
}

fn creation_failure(context: &str, err: PersistenceError) -> IntakeError {
    warn!(error = %err, "{}", context);
    IntakeError::CreationFailure(format!("{}.", context))
}

#[cfg(test)]
mod tests;
