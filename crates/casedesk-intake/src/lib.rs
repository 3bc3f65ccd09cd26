//! Conversational ticket intake for casedesk.
//!
//! - [`Conversation`] is the per-session state machine. It performs no I/O:
//!   each turn returns the bot replies to show now, replies to show after a
//!   typing delay, and at most one ticket-creation request.
//! - [`IntakeService`] drives conversations against a
//!   [`SupportStore`](casedesk_persistence::SupportStore): lazy session
//!   binding, message logging, customer lookup, classification and ticket
//!   creation, status lookup and resumption.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use casedesk_intake::IntakeService;
//! use casedesk_persistence::FileStore;
//!
//! let service = IntakeService::new(Arc::new(FileStore::new("/tmp/casedesk")));
//! let mut conversation = service.start();
//!
//! service.respond(&mut conversation, "My card was charged twice");
//! let replies = service.respond(&mut conversation, "jo@example.com");
//! let ticket_id = replies.iter().find_map(|r| r.ticket_id.clone());
//! assert!(ticket_id.is_some());
//! ```

pub mod config;
pub mod conversation;
pub mod email;
pub mod error;
pub mod replies;
pub mod service;
pub mod status;

pub use config::IntakeConfig;
pub use conversation::{
    BotReply, ChatEntry, Conversation, CreationRequest, DeferredReply, Draft,
    ReplyKind, Stage, Turn,
};
pub use email::is_valid_email;
pub use error::{IntakeError, Result};
pub use replies::{FixedPicker, RandomPicker, ReplyPicker};
pub use service::IntakeService;
pub use status::{StatusChange, TicketLookup};
