//! Core data models for casedesk.
//!
//! This crate provides the plain data types shared by every casedesk crate:
//! tickets with their priorities and notes, SLA rules, customers, and chat sessions.

pub mod chat;
pub mod customer;
pub mod ids;
pub mod note;
pub mod sla;
pub mod ticket;

// Re-export main types
pub use chat::{ChatMessage, ChatSession, Sender, SessionStatus};
pub use customer::{CustomerProfile, CustomerSignal, User};
pub use ids::{CustomerId, MessageId, NoteId, SessionId, TicketId, UserId};
pub use note::TicketNote;
pub use sla::SlaRule;
pub use ticket::{PriorityLevel, Ticket, TicketStatus};
