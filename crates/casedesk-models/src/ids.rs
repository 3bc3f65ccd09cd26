//! Type-safe ID wrappers for casedesk.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID newtypes with common functionality.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            /// Creates an ID from an existing string (for lookups and testing).
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(TicketId, "tkt");
define_id!(SessionId, "sess");
define_id!(MessageId, "msg");
define_id!(UserId, "user");
define_id!(CustomerId, "cust");
define_id!(NoteId, "note");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_id_prefix() {
        let id = TicketId::new();
        assert!(id.as_str().starts_with("tkt-"));
    }

    #[test]
    fn test_ticket_ids_are_unique() {
        assert_ne!(TicketId::new(), TicketId::new());
    }

    #[test]
    fn test_id_from_string() {
        let id = SessionId::from_string("sess-custom-123");
        assert_eq!(id.as_str(), "sess-custom-123");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = CustomerId::from_string("cust-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cust-test\"");

        let parsed: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display() {
        let id = MessageId::from_string("msg-123");
        assert_eq!(format!("{}", id), "msg-123");
    }
}
