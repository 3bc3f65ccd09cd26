//! The persistence collaborator consumed by the intake engine.

use casedesk_models::{
    ChatMessage, ChatSession, CustomerId, CustomerProfile, PriorityLevel, SessionId, SlaRule,
    Ticket, TicketId, User, UserId,
};

use crate::error::Result;

/// Collection names used by every store implementation.
pub const COLLECTIONS: [&str; 6] = [
    "users",
    "customer_profiles",
    "tickets",
    "chat_sessions",
    "chat_messages",
    "rules",
];

/// Logical storage operations needed by intake, status lookup and SLA display.
///
/// Implementations must tolerate concurrent calls from independent sessions.
pub trait SupportStore: Send + Sync {
    /// Finds a user by email (exact match, case-insensitive).
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Creates a guest user for an email.
    fn create_user(&self, email: &str) -> Result<User>;

    /// Returns the user for an email, creating a guest user when none exists.
    ///
    /// Concurrent calls for the same email must resolve to one user.
    fn find_or_create_user(&self, email: &str) -> Result<User>;

    /// Looks up a user by id.
    fn find_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Finds the customer profile owned by a user.
    fn find_customer_profile(&self, user_id: &UserId) -> Result<Option<CustomerProfile>>;

    /// Looks up a customer profile by its own id.
    fn find_customer(&self, id: &CustomerId) -> Result<Option<CustomerProfile>>;

    /// Creates an empty profile for a user.
    fn create_customer_profile(&self, user_id: &UserId) -> Result<CustomerProfile>;

    /// Returns the user's profile, creating an empty one when none exists.
    ///
    /// Concurrent calls for the same user must resolve to one profile.
    fn find_or_create_profile(&self, user_id: &UserId) -> Result<CustomerProfile>;

    /// Creates and stores a ticket with a fresh unique id and creation timestamp.
    fn create_ticket(
        &self,
        description: &str,
        priority: PriorityLevel,
        customer_id: &CustomerId,
    ) -> Result<Ticket>;

    /// Overwrites a ticket (external status transitions).
    fn save_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Looks up a ticket by id.
    fn find_ticket(&self, id: &TicketId) -> Result<Option<Ticket>>;

    /// Lists all tickets, newest first.
    fn list_tickets(&self) -> Result<Vec<Ticket>>;

    /// Returns the SLA rule set in its configured order.
    fn list_sla_rules(&self) -> Result<Vec<SlaRule>>;

    /// Replaces the SLA rule set.
    fn save_sla_rules(&self, rules: &[SlaRule]) -> Result<()>;

    /// Creates a new active chat session record.
    fn create_session(&self) -> Result<ChatSession>;

    /// Looks up a session by id.
    fn find_session(&self, id: &SessionId) -> Result<Option<ChatSession>>;

    /// Links a session to the ticket (and customer) it produced.
    fn update_session_ticket_link(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
        customer_id: &CustomerId,
    ) -> Result<()>;

    /// Sets or clears the human-takeover flag on a session.
    fn set_session_takeover(&self, session_id: &SessionId, takeover: bool) -> Result<()>;

    /// Appends a message to its session's log.
    fn append_chat_message(&self, message: &ChatMessage) -> Result<()>;

    /// Finds the session that produced a ticket.
    fn find_session_by_ticket(&self, ticket_id: &TicketId) -> Result<Option<SessionId>>;

    /// Lists a session's messages, oldest first.
    fn list_messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>>;
}
