//! REST API for casedesk.
//!
//! This crate exposes the intake engine over HTTP:
//! - Conversations (start, send messages, start a new ticket, human takeover,
//!   resume from a ticket)
//! - Tickets (list, status lookup with SLA, status transitions with
//!   resolution notices)
//! - SLA rules (list)
//!
//! Deferred bot replies and ticket creation run as background tasks after
//! the configured delays; clients poll the conversation for new messages.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use casedesk_api::{serve, ApiConfig, AppState};
//! use casedesk_intake::IntakeService;
//! use casedesk_persistence::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let intake = IntakeService::new(Arc::new(FileStore::new("/tmp/casedesk")));
//!     let config = ApiConfig::default();
//!     serve(config.clone(), AppState::new(config, intake)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
