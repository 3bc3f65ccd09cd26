//! The per-session intake state machine.
//!
//! A [`Conversation`] walks through four stages:
//!
//! ```text
//! AwaitingDescription --text--> AwaitingEmail --valid email--> Creating
//!         ^                        ^    |                         |
//!         |                        |    +--invalid: re-prompt     |
//!         |                        +--------creation failed-------+
//!         |                                                       |
//!         +--------start new ticket------- PostCreation <--created-+
//! ```
//!
//! It never touches storage or timers. Each input returns a [`Turn`] that
//! lists the replies to show now, replies to show after a typing delay, and
//! at most one [`CreationRequest`]. Delayed replies and creation requests
//! carry the conversation's epoch; starting a new ticket bumps the epoch so
//! anything still in flight from the old ticket is discarded on arrival.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casedesk_models::{ChatMessage, Sender, SessionId, Ticket, TicketId};

use crate::email::is_valid_email;
use crate::error::{IntakeError, Result};
use crate::replies::{self, ReplyPicker};


/// Where a conversation is in the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    AwaitingDescription,
    AwaitingEmail,
    Creating,
    PostCreation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AwaitingDescription => "awaiting_description",
            Stage::AwaitingEmail => "awaiting_email",
            Stage::Creating => "creating",
            Stage::PostCreation => "post_creation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values collected for the ticket being drafted.
///
/// `email` is only ever set while `description` is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub description: Option<String>,
    pub email: Option<String>,
}

impl Draft {
    pub fn clear(&mut self) {
        self.description = None;
        self.email = None;
    }
}

/// What a bot reply is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Welcome,
    EmailPrompt,
    EmailReprompt,
    TicketCreated,
    CreationFailed,
    FollowUp,
    Acknowledgement,
}

/// A bot message produced by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub kind: ReplyKind,
    pub text: String,
    /// Structured reference to a created ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
}

impl BotReply {
    fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            ticket_id: None,
        }
    }
}

/// A reply to be shown after the typing delay, unless the conversation has
/// moved on by then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredReply {
    pub epoch: u64,
    pub reply: BotReply,
}

/// Everything needed to create a ticket for the current draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRequest {
    pub epoch: u64,
    pub description: String,
    pub email: String,
    pub session_id: Option<SessionId>,
}

/// Output of one state-machine step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    /// Replies to show immediately, already recorded in the history.
    pub replies: Vec<BotReply>,
    /// Replies to hand back through [`Conversation::deliver`] after a delay.
    pub deferred: Vec<DeferredReply>,
    /// Ticket creation to perform, reported back through
    /// [`Conversation::complete_creation`].
    pub creation: Option<CreationRequest>,
}

impl Turn {
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty() && self.deferred.is_empty() && self.creation.is_none()
    }
}

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    pub at: DateTime<Utc>,
}

impl ChatEntry {
    fn new(sender: Sender, text: impl Into<String>, ticket_id: Option<TicketId>) -> Self {
        Self {
            sender,
            text: text.into(),
            ticket_id,
            at: Utc::now(),
        }
    }

    /// Builds the log record for this entry in `session_id`.
    pub fn to_message(&self, session_id: &SessionId) -> ChatMessage {
        let mut message = ChatMessage::new(session_id.clone(), self.sender, self.text.clone());
        message.ticket_id = self.ticket_id.clone();
        message.created_at = self.at;
        message
    }
}

impl From<&ChatMessage> for ChatEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender: message.sender,
            text: message.text.clone(),
            ticket_id: message.ticket_id.clone(),
            at: message.created_at,
        }
    }
}

/// Intake state for one chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    session_id: Option<SessionId>,
    stage: Stage,
    draft: Draft,
    takeover: bool,
    epoch: u64,
    history: Vec<ChatEntry>,
    /// Number of leading history entries already written to the session log.
    persisted: usize,
    last_ticket: Option<TicketId>,
    #[serde(default)]
    closed: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Starts a fresh, unbound conversation with the default welcome message.
    pub fn new() -> Self {
        Self::with_welcome(replies::WELCOME)
    }

    /// Starts a fresh, unbound conversation opening with `welcome`.
    pub fn with_welcome(welcome: &str) -> Self {
        Self {
            session_id: None,
            stage: Stage::AwaitingDescription,
            draft: Draft::default(),
            takeover: false,
            epoch: 0,
            history: vec![ChatEntry::new(Sender::Bot, welcome, None)],
            persisted: 0,
            last_ticket: None,
            closed: false,
        }
    }

    /// Rebuilds a conversation from a persisted session log.
    ///
    /// The log is treated as already written. A stage that needs a draft
    /// falls back to AwaitingDescription when the draft has no description,
    /// and an interrupted Creating stage resumes at AwaitingEmail.
    pub fn resume(session_id: SessionId, messages: &[ChatMessage], stage: Stage, draft: Draft) -> Self {
        let mut draft = draft;
        let stage = match stage {
            Stage::AwaitingEmail | Stage::Creating if draft.description.is_none() => {
                draft.clear();
                Stage::AwaitingDescription
            }
            Stage::Creating => {
                draft.email = None;
                Stage::AwaitingEmail
            }
            Stage::AwaitingDescription | Stage::PostCreation => {
                draft.clear();
                stage
            }
            Stage::AwaitingEmail => {
                draft.email = None;
                stage
            }
        };

        let history: Vec<ChatEntry> = messages.iter().map(ChatEntry::from).collect();
        let last_ticket = messages.iter().rev().find_map(|m| m.ticket_id.clone());

        Self {
            session_id: Some(session_id),
            stage,
            draft,
            takeover: false,
            epoch: 0,
            persisted: history.len(),
            history,
            last_ticket,
            closed: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_taken_over(&self) -> bool {
        self.takeover
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    /// Ticket most recently created (or resumed) in this conversation.
    pub fn last_ticket(&self) -> Option<&TicketId> {
        self.last_ticket.as_ref()
    }

    /// Binds the conversation to a persisted session. Ignored if already bound.
    pub fn bind_session(&mut self, session_id: SessionId) {
        if self.session_id.is_none() {
            self.session_id = Some(session_id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// History entries not yet written to the session log.
    pub fn unpersisted(&self) -> &[ChatEntry] {
        let start = self.persisted.min(self.history.len());
        &self.history[start..]
    }

    /// Records that `count` more entries were written to the session log.
    pub fn mark_persisted(&mut self, count: usize) {
        self.persisted = (self.persisted + count).min(self.history.len());
    }

    /// Sets or clears human takeover. While set, prompts, re-prompts,
    /// acknowledgements and follow-ups are suppressed.
    pub fn set_takeover(&mut self, takeover: bool) {
        self.takeover = takeover;
    }

    /// Ends the conversation. Pending replies and creation outcomes are
    /// dropped and later input is ignored.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.epoch += 1;
        }
    }

    /// Handles one line of user input.
    ///
    /// Blank input is ignored and leaves no trace in the history.
    pub fn handle_user_text(&mut self, text: &str, picker: &dyn ReplyPicker) -> Turn {
        let text = text.trim();
        if text.is_empty() || self.closed {
            return Turn::default();
        }

        self.push(Sender::User, text, None);
        let mut turn = Turn::default();

        match self.stage {
            Stage::AwaitingDescription => {
                self.draft.description = Some(text.to_string());
                self.stage = Stage::AwaitingEmail;
                self.defer(&mut turn, BotReply::new(ReplyKind::EmailPrompt, replies::EMAIL_PROMPT));
            }
            Stage::AwaitingEmail => {
                if is_valid_email(text) {
                    self.draft.email = Some(text.to_string());
                    self.stage = Stage::Creating;
                    turn.creation = Some(CreationRequest {
                        epoch: self.epoch,
                        description: self.draft.description.clone().unwrap_or_default(),
                        email: text.to_string(),
                        session_id: self.session_id.clone(),
                    });
                } else if !self.takeover {
                    turn.replies.push(self.say(BotReply::new(
                        ReplyKind::EmailReprompt,
                        replies::EMAIL_REPROMPT,
                    )));
                }
            }
            // Input while a ticket is being created is only logged.
            Stage::Creating => {}
            Stage::PostCreation => {
                let ack = replies::acknowledgement(picker);
                self.defer(&mut turn, BotReply::new(ReplyKind::Acknowledgement, ack));
            }
        }

        turn
    }

    /// Applies the outcome of a [`CreationRequest`].
    ///
    /// Outcomes for an older epoch, or arriving outside the Creating stage,
    /// are discarded. The success and failure messages are sent even under
    /// takeover; the follow-up question is not.
    pub fn complete_creation(
        &mut self,
        request: &CreationRequest,
        outcome: std::result::Result<Ticket, IntakeError>,
    ) -> Turn {
        let mut turn = Turn::default();
        if request.epoch != self.epoch || self.stage != Stage::Creating || self.closed {
            return turn;
        }

        match outcome {
            Ok(ticket) => {
                let mut reply = BotReply::new(
                    ReplyKind::TicketCreated,
                    replies::ticket_created(ticket.priority.label()),
                );
                reply.ticket_id = Some(ticket.id.clone());
                turn.replies.push(self.say(reply));

                self.stage = Stage::PostCreation;
                self.draft.clear();
                self.last_ticket = Some(ticket.id);
                self.defer(&mut turn, BotReply::new(ReplyKind::FollowUp, replies::FOLLOW_UP));
            }
            Err(err) => {
                turn.replies.push(self.say(BotReply::new(
                    ReplyKind::CreationFailed,
                    replies::creation_failed(&err.to_string()),
                )));
                self.stage = Stage::AwaitingEmail;
                self.draft.email = None;
            }
        }

        turn
    }

    /// Releases a deferred reply.
    ///
    /// Returns None if the conversation has started a new ticket or closed
    /// since the reply was scheduled, or a human has taken over.
    pub fn deliver(&mut self, deferred: DeferredReply) -> Option<BotReply> {
        if deferred.epoch != self.epoch || self.takeover || self.closed {
            return None;
        }
        Some(self.say(deferred.reply))
    }

    /// Starts another ticket: detaches from the current session, clears the
    /// draft and history, and cancels everything still pending.
    ///
    /// Not allowed while a ticket is being created.
    pub fn start_new_ticket(&mut self) -> Result<Turn> {
        if self.closed {
            return Err(IntakeError::Closed);
        }
        if self.stage == Stage::Creating {
            return Err(IntakeError::InvalidStage {
                action: "start a new ticket",
                stage: self.stage,
            });
        }

        self.epoch += 1;
        self.session_id = None;
        self.stage = Stage::AwaitingDescription;
        self.draft.clear();
        self.takeover = false;
        self.history.clear();
        self.persisted = 0;
        self.last_ticket = None;

        let mut turn = Turn::default();
        turn.replies
            .push(self.say(BotReply::new(ReplyKind::Welcome, replies::WELCOME_BACK)));
        Ok(turn)
    }

    fn push(&mut self, sender: Sender, text: &str, ticket_id: Option<TicketId>) {
        self.history.push(ChatEntry::new(sender, text, ticket_id));
    }

    fn say(&mut self, reply: BotReply) -> BotReply {
        self.push(Sender::Bot, &reply.text, reply.ticket_id.clone());
        reply
    }

    fn defer(&self, turn: &mut Turn, reply: BotReply) {
        if !self.takeover {
            turn.deferred.push(DeferredReply {
                epoch: self.epoch,
                reply,
            });
        }
    }
}
