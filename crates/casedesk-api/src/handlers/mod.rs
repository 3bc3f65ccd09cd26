//! API request handlers.

pub mod conversations;
pub mod health;
pub mod rules;
pub mod tickets;

pub use conversations::*;
pub use health::*;
pub use rules::*;
pub use tickets::*;
