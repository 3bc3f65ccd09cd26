//! JSON file implementation of [`SupportStore`].

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use casedesk_models::{
    ChatMessage, ChatSession, CustomerId, CustomerProfile, PriorityLevel, SessionId, SlaRule,
    Ticket, TicketId, User, UserId,
};
use tracing::debug;

use crate::atomic::{
    append_json_line, atomic_write_json, read_json_dir, read_json_lines, read_json_optional,
};
use crate::error::{PersistenceError, Result};
use crate::store::SupportStore;

/// File name holding the ordered SLA rule set.
const RULES_FILE: &str = "rules.json";

/// Stores every collection as files under a base directory:
///
/// ```text
/// base_path/
/// ├── users/{user_id}.json
/// ├── customer_profiles/{customer_id}.json
/// ├── tickets/{ticket_id}.json
/// ├── chat_sessions/{session_id}.json
/// ├── chat_messages/{session_id}.jsonl
/// └── rules/rules.json
/// ```
///
/// Record writes are atomic. Read-modify-write updates of a session record are
/// serialized through an internal lock; different sessions never share a file.
/// Find-or-create of users and profiles holds a second lock so one email maps
/// to one user. Ids are checked before they become file names.
pub struct FileStore {
    base_path: PathBuf,
    session_lock: Mutex<()>,
    customer_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a new FileStore rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            session_lock: Mutex::new(()),
            customer_lock: Mutex::new(()),
        }
    }

    /// Returns the base directory.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn collection(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf> {
        Ok(self
            .collection(collection)
            .join(format!("{}.json", checked_id(id)?)))
    }

    fn log_path(&self, session_id: &SessionId) -> Result<PathBuf> {
        Ok(self
            .collection("chat_messages")
            .join(format!("{}.jsonl", checked_id(session_id.as_str())?)))
    }

    fn lock_customers(&self) -> Result<MutexGuard<'_, ()>> {
        self.customer_lock
            .lock()
            .map_err(|e| PersistenceError::LockPoisoned(e.to_string()))
    }

    fn update_session(
        &self,
        session_id: &SessionId,
        update: impl FnOnce(&mut ChatSession),
    ) -> Result<()> {
        let _guard = self
            .session_lock
            .lock()
            .map_err(|e| PersistenceError::LockPoisoned(e.to_string()))?;

        let path = self.record_path("chat_sessions", session_id.as_str())?;
        let mut session: ChatSession = read_json_optional(&path)?
            .ok_or_else(|| PersistenceError::not_found("session", session_id))?;
        update(&mut session);
        atomic_write_json(&path, &session)
    }
}

/// Accepts ids made of ASCII letters, digits, `-` and `_`.
fn checked_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(PersistenceError::InvalidId(id.to_string()))
    }
}

impl SupportStore for FileStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let wanted = email.trim().to_lowercase();
        let users: Vec<User> = read_json_dir(&self.collection("users"))?;
        Ok(users
            .into_iter()
            .find(|u| u.email.to_lowercase() == wanted))
    }

    fn create_user(&self, email: &str) -> Result<User> {
        let user = User::guest(email.trim());
        atomic_write_json(&self.record_path("users", user.id.as_str())?, &user)?;
        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    fn find_or_create_user(&self, email: &str) -> Result<User> {
        let _guard = self.lock_customers()?;
        match self.find_user_by_email(email)? {
            Some(user) => Ok(user),
            None => self.create_user(email),
        }
    }

    fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        read_json_optional(&self.record_path("users", id.as_str())?)
    }

    fn find_customer_profile(&self, user_id: &UserId) -> Result<Option<CustomerProfile>> {
        let profiles: Vec<CustomerProfile> =
            read_json_dir(&self.collection("customer_profiles"))?;
        Ok(profiles.into_iter().find(|p| &p.user_id == user_id))
    }

    fn find_customer(&self, id: &CustomerId) -> Result<Option<CustomerProfile>> {
        read_json_optional(&self.record_path("customer_profiles", id.as_str())?)
    }

    fn create_customer_profile(&self, user_id: &UserId) -> Result<CustomerProfile> {
        let profile = CustomerProfile::new(user_id.clone());
        atomic_write_json(
            &self.record_path("customer_profiles", profile.id.as_str())?,
            &profile,
        )?;
        debug!(customer_id = %profile.id, user_id = %user_id, "Created customer profile");
        Ok(profile)
    }

    fn find_or_create_profile(&self, user_id: &UserId) -> Result<CustomerProfile> {
        let _guard = self.lock_customers()?;
        match self.find_customer_profile(user_id)? {
            Some(profile) => Ok(profile),
            None => self.create_customer_profile(user_id),
        }
    }

    fn create_ticket(
        &self,
        description: &str,
        priority: PriorityLevel,
        customer_id: &CustomerId,
    ) -> Result<Ticket> {
        let ticket = Ticket::new(description, priority, customer_id.clone());
        self.save_ticket(&ticket)?;
        debug!(ticket_id = %ticket.id, priority = %priority, "Created ticket");
        Ok(ticket)
    }

    fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        atomic_write_json(&self.record_path("tickets", ticket.id.as_str())?, ticket)
    }

    fn find_ticket(&self, id: &TicketId) -> Result<Option<Ticket>> {
        read_json_optional(&self.record_path("tickets", id.as_str())?)
    }

    fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = read_json_dir(&self.collection("tickets"))?;
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    fn list_sla_rules(&self) -> Result<Vec<SlaRule>> {
        let path = self.collection("rules").join(RULES_FILE);
        Ok(read_json_optional(&path)?.unwrap_or_default())
    }

    fn save_sla_rules(&self, rules: &[SlaRule]) -> Result<()> {
        let path = self.collection("rules").join(RULES_FILE);
        atomic_write_json(&path, &rules)
    }

    fn create_session(&self) -> Result<ChatSession> {
        let session = ChatSession::new();
        atomic_write_json(
            &self.record_path("chat_sessions", session.id.as_str())?,
            &session,
        )?;
        debug!(session_id = %session.id, "Created chat session");
        Ok(session)
    }

    fn find_session(&self, id: &SessionId) -> Result<Option<ChatSession>> {
        read_json_optional(&self.record_path("chat_sessions", id.as_str())?)
    }

    fn update_session_ticket_link(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
        customer_id: &CustomerId,
    ) -> Result<()> {
        self.update_session(session_id, |session| {
            session.ticket_id = Some(ticket_id.clone());
            session.customer_id = Some(customer_id.clone());
        })
    }

    fn set_session_takeover(&self, session_id: &SessionId, takeover: bool) -> Result<()> {
        self.update_session(session_id, |session| session.takeover = takeover)
    }

    fn append_chat_message(&self, message: &ChatMessage) -> Result<()> {
        append_json_line(&self.log_path(&message.session_id)?, message)
    }

    fn find_session_by_ticket(&self, ticket_id: &TicketId) -> Result<Option<SessionId>> {
        let sessions: Vec<ChatSession> = read_json_dir(&self.collection("chat_sessions"))?;
        Ok(sessions
            .into_iter()
            .find(|s| s.ticket_id.as_ref() == Some(ticket_id))
            .map(|s| s.id))
    }

    fn list_messages(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = read_json_lines(&self.log_path(session_id)?)?;
        // Stable: equal timestamps keep append order.
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk_models::{Sender, TicketStatus};
    use tempfile::tempdir;

    #[test]
    fn test_user_lookup_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let user = store.create_user("Jo@Example.com").unwrap();
        let found = store.find_user_by_email("jo@example.com").unwrap().unwrap();

        assert_eq!(found.id, user.id);
        assert!(store.find_user_by_email("other@example.com").unwrap().is_none());
    }

    #[test]
    fn test_customer_profile_by_user() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let user = store.create_user("jo@example.com").unwrap();
        assert!(store.find_customer_profile(&user.id).unwrap().is_none());

        let profile = store.create_customer_profile(&user.id).unwrap();
        let found = store.find_customer_profile(&user.id).unwrap().unwrap();
        assert_eq!(found.id, profile.id);
        assert_eq!(store.find_customer(&profile.id).unwrap().unwrap().user_id, user.id);
    }

    #[test]
    fn test_create_and_find_ticket() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let customer = CustomerId::new();
        let ticket = store
            .create_ticket("App crashes on login", PriorityLevel::High, &customer)
            .unwrap();

        let loaded = store.find_ticket(&ticket.id).unwrap().unwrap();
        assert_eq!(loaded.priority, PriorityLevel::High);
        assert_eq!(loaded.status, TicketStatus::Open);
        assert_eq!(loaded.customer_id, customer);
        assert!(store.find_ticket(&TicketId::new()).unwrap().is_none());
    }

    #[test]
    fn test_list_tickets_newest_first() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let customer = CustomerId::new();

        let older = Ticket::created_at(
            "old",
            PriorityLevel::Low,
            customer.clone(),
            chrono::Utc::now() - chrono::Duration::hours(2),
        );
        store.save_ticket(&older).unwrap();
        let newer = store.create_ticket("new", PriorityLevel::Low, &customer).unwrap();

        let tickets = store.list_tickets().unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, newer.id);
        assert_eq!(tickets[1].id, older.id);
    }

    #[test]
    fn test_rules_keep_their_order() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.list_sla_rules().unwrap().is_empty());

        let rules = vec![
            SlaRule::for_priority("Urgent", PriorityLevel::Urgent, 60),
            SlaRule::new("Fallback", 1440),
            SlaRule::for_priority("Low", PriorityLevel::Low, 4320),
        ];
        store.save_sla_rules(&rules).unwrap();

        assert_eq!(store.list_sla_rules().unwrap(), rules);
    }

    #[test]
    fn test_session_ticket_link_and_reverse_lookup() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let session = store.create_session().unwrap();
        let ticket_id = TicketId::new();
        let customer_id = CustomerId::new();

        assert!(store.find_session_by_ticket(&ticket_id).unwrap().is_none());
        store
            .update_session_ticket_link(&session.id, &ticket_id, &customer_id)
            .unwrap();

        assert_eq!(store.find_session_by_ticket(&ticket_id).unwrap(), Some(session.id.clone()));
        let loaded = store.find_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.customer_id, Some(customer_id));
    }

    #[test]
    fn test_update_missing_session_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let result = store.set_session_takeover(&SessionId::new(), true);
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }

    #[test]
    fn test_takeover_flag_persists() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let session = store.create_session().unwrap();
        store.set_session_takeover(&session.id, true).unwrap();

        assert!(store.find_session(&session.id).unwrap().unwrap().takeover);
    }

    #[test]
    fn test_messages_are_per_session_and_ordered() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let a = store.create_session().unwrap();
        let b = store.create_session().unwrap();

        store
            .append_chat_message(&ChatMessage::new(a.id.clone(), Sender::Bot, "Welcome"))
            .unwrap();
        store
            .append_chat_message(&ChatMessage::new(b.id.clone(), Sender::User, "Other session"))
            .unwrap();
        store
            .append_chat_message(&ChatMessage::new(a.id.clone(), Sender::User, "My order is late"))
            .unwrap();

        let log = store.list_messages(&a.id).unwrap();
        let texts: Vec<&str> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Welcome", "My order is late"]);
        assert_eq!(store.list_messages(&b.id).unwrap().len(), 1);
        assert!(store.list_messages(&SessionId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_find_or_create_user_is_single_under_contention() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let email = if i % 2 == 0 { "same@example.com" } else { "Same@Example.com" };
                    barrier.wait();
                    let user = store.find_or_create_user(email).unwrap();
                    let profile = store.find_or_create_profile(&user.id).unwrap();
                    (user.id, profile.id)
                })
            })
            .collect();

        let results: Vec<(UserId, CustomerId)> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| r == &results[0]));

        let users: Vec<User> = read_json_dir(&dir.path().join("users")).unwrap();
        let profiles: Vec<CustomerProfile> =
            read_json_dir(&dir.path().join("customer_profiles")).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(profiles.len(), 1);
    }

    #[test]
    fn test_find_or_create_returns_existing() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let user = store.create_user("jo@example.com").unwrap();
        let profile = store.create_customer_profile(&user.id).unwrap();

        assert_eq!(store.find_or_create_user(" JO@example.com").unwrap().id, user.id);
        assert_eq!(store.find_or_create_profile(&user.id).unwrap().id, profile.id);
    }

    #[test]
    fn test_ids_with_path_characters_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user = store.create_user("jo@example.com").unwrap();

        // A ticket lookup must never read another collection's record.
        let escape = TicketId::from_string(format!("../users/{}", user.id));
        assert!(matches!(
            store.find_ticket(&escape),
            Err(PersistenceError::InvalidId(_))
        ));

        for id in ["", "..", "a/b", "a\\b", "tkt-1.json"] {
            assert!(matches!(
                store.find_session(&SessionId::from_string(id)),
                Err(PersistenceError::InvalidId(_))
            ));
        }

        let message = ChatMessage::new(SessionId::from_string("../tickets/x"), Sender::User, "hi");
        assert!(matches!(
            store.append_chat_message(&message),
            Err(PersistenceError::InvalidId(_))
        ));
        assert!(!dir.path().join("tickets").exists());
    }
}
