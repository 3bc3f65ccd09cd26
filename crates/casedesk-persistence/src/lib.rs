//! Persistence layer for casedesk.
//!
//! The intake engine talks to storage only through the [`SupportStore`]
//! trait. [`FileStore`] implements it with one directory per collection and
//! crash-safe writes (write to temp file, then rename); chat logs are
//! append-only JSON-lines files.
//!
//! # Example
//!
//! ```no_run
//! use casedesk_persistence::{FileStore, SupportStore};
//! use casedesk_models::PriorityLevel;
//!
//! let store = FileStore::new("/var/lib/casedesk");
//!
//! let user = store.create_user("jo@example.com").unwrap();
//! let profile = store.create_customer_profile(&user.id).unwrap();
//! let ticket = store
//!     .create_ticket("Card was charged twice", PriorityLevel::High, &profile.id)
//!     .unwrap();
//!
//! assert!(store.find_ticket(&ticket.id).unwrap().is_some());
//! ```

pub mod atomic;
pub mod error;
pub mod file_store;
pub mod store;

pub use error::{PersistenceError, Result};
pub use file_store::FileStore;
pub use store::{SupportStore, COLLECTIONS};
