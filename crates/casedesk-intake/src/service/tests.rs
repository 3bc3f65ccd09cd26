use std::sync::atomic::{AtomicBool, Ordering};

use super::*;
use crate::conversation::{CreationRequest, Draft, ReplyKind, Stage};
use crate::replies::{self, FixedPicker};
use casedesk_models::{
    ChatMessage, ChatSession, CustomerId, CustomerProfile, PriorityLevel, SessionId, Sender,
    SlaRule, TicketId, User, UserId,
};
use casedesk_persistence::{FileStore, Result as StoreResult};
use tempfile::TempDir;

/// FileStore wrapper that can fail selected operations and override the
/// customer's loyalty tier.
struct FlakyStore {
    inner: FileStore,
    fail_sessions: AtomicBool,
    fail_user_creation: AtomicBool,
    loyalty: Option<String>,
}

impl FlakyStore {
    fn new(dir: &TempDir) -> Self {
        Self {
            inner: FileStore::new(dir.path()),
            fail_sessions: AtomicBool::new(false),
            fail_user_creation: AtomicBool::new(false),
            loyalty: None,
        }
    }

    fn unavailable() -> PersistenceError {
        PersistenceError::Unavailable("injected failure".to_string())
    }
}

impl SupportStore for FlakyStore {
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email)
    }

    fn create_user(&self, email: &str) -> StoreResult<User> {
        if self.fail_user_creation.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.create_user(email)
    }

    fn find_or_create_user(&self, email: &str) -> StoreResult<User> {
        if let Some(user) = self.inner.find_user_by_email(email)? {
            return Ok(user);
        }
        if self.fail_user_creation.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.find_or_create_user(email)
    }

    fn find_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.inner.find_user(id)
    }

    fn find_customer_profile(&self, user_id: &UserId) -> StoreResult<Option<CustomerProfile>> {
        Ok(self.inner.find_customer_profile(user_id)?.map(|mut profile| {
            if self.loyalty.is_some() {
                profile.loyalty_level = self.loyalty.clone();
            }
            profile
        }))
    }

    fn find_customer(&self, id: &CustomerId) -> StoreResult<Option<CustomerProfile>> {
        self.inner.find_customer(id)
    }

    fn create_customer_profile(&self, user_id: &UserId) -> StoreResult<CustomerProfile> {
        let mut profile = self.inner.create_customer_profile(user_id)?;
        profile.loyalty_level = self.loyalty.clone();
        Ok(profile)
    }

    fn find_or_create_profile(&self, user_id: &UserId) -> StoreResult<CustomerProfile> {
        let mut profile = self.inner.find_or_create_profile(user_id)?;
        if self.loyalty.is_some() {
            profile.loyalty_level = self.loyalty.clone();
        }
        Ok(profile)
    }

    fn create_ticket(
        &self,
        description: &str,
        priority: PriorityLevel,
        customer_id: &CustomerId,
    ) -> StoreResult<Ticket> {
        self.inner.create_ticket(description, priority, customer_id)
    }

    fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        self.inner.save_ticket(ticket)
    }

    fn find_ticket(&self, id: &TicketId) -> StoreResult<Option<Ticket>> {
        self.inner.find_ticket(id)
    }

    fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        self.inner.list_tickets()
    }

    fn list_sla_rules(&self) -> StoreResult<Vec<SlaRule>> {
        self.inner.list_sla_rules()
    }

    fn save_sla_rules(&self, rules: &[SlaRule]) -> StoreResult<()> {
        self.inner.save_sla_rules(rules)
    }

    fn create_session(&self) -> StoreResult<ChatSession> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.create_session()
    }

    fn find_session(&self, id: &SessionId) -> StoreResult<Option<ChatSession>> {
        self.inner.find_session(id)
    }

    fn update_session_ticket_link(
        &self,
        session_id: &SessionId,
        ticket_id: &TicketId,
        customer_id: &CustomerId,
    ) -> StoreResult<()> {
        self.inner
            .update_session_ticket_link(session_id, ticket_id, customer_id)
    }

    fn set_session_takeover(&self, session_id: &SessionId, takeover: bool) -> StoreResult<()> {
        self.inner.set_session_takeover(session_id, takeover)
    }

    fn append_chat_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.inner.append_chat_message(message)
    }

    fn find_session_by_ticket(&self, ticket_id: &TicketId) -> StoreResult<Option<SessionId>> {
        self.inner.find_session_by_ticket(ticket_id)
    }

    fn list_messages(&self, session_id: &SessionId) -> StoreResult<Vec<ChatMessage>> {
        self.inner.list_messages(session_id)
    }
}

fn file_service() -> (TempDir, Arc<FileStore>, IntakeService) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let service = IntakeService::new(store.clone()).with_picker(FixedPicker(0));
    (dir, store, service)
}

fn flaky_service(configure: impl FnOnce(&mut FlakyStore)) -> (TempDir, Arc<FlakyStore>, IntakeService) {
    let dir = TempDir::new().unwrap();
    let mut store = FlakyStore::new(&dir);
    configure(&mut store);
    let store = Arc::new(store);
    let service = IntakeService::new(store.clone()).with_picker(FixedPicker(0));
    (dir, store, service)
}

fn created_ticket_id(replies: &[BotReply]) -> Option<TicketId> {
    replies.iter().find_map(|r| r.ticket_id.clone())
}

#[test]
fn test_full_intake_flow() {
    let (_dir, store, service) = file_service();
    let mut conv = service.start();

    let replies = service.respond(&mut conv, "The app is broken");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, replies::EMAIL_PROMPT);
    let session_id = conv.session_id().cloned().expect("session bound on first message");

    let replies = service.respond(&mut conv, "jo@example.com");
    let kinds: Vec<ReplyKind> = replies.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ReplyKind::TicketCreated, ReplyKind::FollowUp]);
    assert_eq!(conv.stage(), Stage::PostCreation);

    let ticket_id = created_ticket_id(&replies).unwrap();
    let ticket = store.find_ticket(&ticket_id).unwrap().unwrap();
    assert_eq!(ticket.priority, PriorityLevel::High);
    assert_eq!(ticket.description, "The app is broken");
    assert_eq!(ticket.title, ticket.description);

    let session = store.find_session(&session_id).unwrap().unwrap();
    assert_eq!(session.ticket_id, Some(ticket_id.clone()));
    assert_eq!(session.customer_id, Some(ticket.customer_id.clone()));

    let log = store.list_messages(&session_id).unwrap();
    let senders: Vec<Sender> = log.iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::Bot, Sender::User, Sender::Bot, Sender::User, Sender::Bot, Sender::Bot]
    );
    assert_eq!(log[0].text, replies::WELCOME);
    assert_eq!(log[4].ticket_id, Some(ticket_id));
}

#[test]
fn test_returning_customer_is_reused() {
    let (_dir, store, service) = file_service();

    let mut first = service.start();
    service.respond(&mut first, "Question about the menu");
    let a = created_ticket_id(&service.respond(&mut first, "Jo@Example.com")).unwrap();

    let mut second = service.start();
    service.respond(&mut second, "Another question");
    let b = created_ticket_id(&service.respond(&mut second, "jo@example.com")).unwrap();

    let a = store.find_ticket(&a).unwrap().unwrap();
    let b = store.find_ticket(&b).unwrap().unwrap();
    assert_eq!(a.customer_id, b.customer_id);
    assert_eq!(a.priority, PriorityLevel::Low);
}

#[test]
fn test_loyalty_tier_escalates_priority() {
    let (_dir, store, service) = flaky_service(|s| s.loyalty = Some("Gold Member".to_string()));
    let mut conv = service.start();

    service.respond(&mut conv, "The app is broken");
    let id = created_ticket_id(&service.respond(&mut conv, "vip@example.com")).unwrap();

    assert_eq!(store.find_ticket(&id).unwrap().unwrap().priority, PriorityLevel::Urgent);
}

#[test]
fn test_invalid_email_does_not_touch_customers() {
    let (_dir, store, service) = file_service();
    let mut conv = service.start();

    service.respond(&mut conv, "The app is broken");
    let replies = service.respond(&mut conv, "jo at example");

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].kind, ReplyKind::EmailReprompt);
    assert_eq!(conv.stage(), Stage::AwaitingEmail);
    assert!(store.find_user_by_email("jo at example").unwrap().is_none());
    assert!(store.list_tickets().unwrap().is_empty());
}

#[test]
fn test_user_creation_failure_allows_retry() {
    let (_dir, store, service) = flaky_service(|s| s.fail_user_creation = AtomicBool::new(true));
    let mut conv = service.start();

    service.respond(&mut conv, "The app is broken");
    let replies = service.respond(&mut conv, "jo@example.com");

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].kind, ReplyKind::CreationFailed);
    assert_eq!(replies[0].text, "Sorry, something went wrong: Failed to create user account.");
    assert_eq!(conv.stage(), Stage::AwaitingEmail);
    assert!(store.list_tickets().unwrap().is_empty());

    store.fail_user_creation.store(false, Ordering::SeqCst);
    let replies = service.respond(&mut conv, "jo@example.com");
    assert!(created_ticket_id(&replies).is_some());
    assert_eq!(conv.stage(), Stage::PostCreation);
}

#[test]
fn test_missing_store_fails_creation_gracefully() {
    let service = IntakeService::without_store().with_picker(FixedPicker(0));
    let mut conv = service.start();

    service.respond(&mut conv, "The app is broken");
    assert!(conv.session_id().is_none());

    let replies = service.respond(&mut conv, "jo@example.com");
    assert_eq!(replies[0].kind, ReplyKind::CreationFailed);
    assert!(replies[0].text.contains("no persistence store is configured"));
    assert_eq!(conv.stage(), Stage::AwaitingEmail);
}

#[test]
fn test_session_binding_retries_and_flushes_backlog() {
    let (_dir, store, service) = flaky_service(|s| s.fail_sessions = AtomicBool::new(true));
    let mut conv = service.start();

    service.respond(&mut conv, "The app is broken");
    assert!(conv.session_id().is_none());
    assert_eq!(conv.stage(), Stage::AwaitingEmail);

    store.fail_sessions.store(false, Ordering::SeqCst);
    service.respond(&mut conv, "not-an-email");
    let session_id = conv.session_id().cloned().unwrap();

    // welcome, description, prompt, bad email, re-prompt
    let log = store.list_messages(&session_id).unwrap();
    assert_eq!(log.len(), 5);
    assert_eq!(log[1].text, "The app is broken");
    assert!(conv.unpersisted().is_empty());
}

#[test]
fn test_sessions_are_isolated() {
    let (_dir, _store, service) = file_service();
    let mut a = service.start();
    let mut b = service.start();

    service.respond(&mut a, "The app is broken");
    service.respond(&mut b, "Question about hours");
    service.respond(&mut a, "a@example.com");

    assert_eq!(a.stage(), Stage::PostCreation);
    assert_eq!(b.stage(), Stage::AwaitingEmail);
    assert_eq!(b.draft().description.as_deref(), Some("Question about hours"));
    assert_ne!(a.session_id(), b.session_id());
}

#[test]
fn test_new_ticket_uses_new_session() {
    let (_dir, store, service) = file_service();
    let mut conv = service.start();
    service.respond(&mut conv, "The app is broken");
    service.respond(&mut conv, "jo@example.com");
    let first_session = conv.session_id().cloned().unwrap();
    let first_log_len = store.list_messages(&first_session).unwrap().len();

    let turn = service.start_new_ticket(&mut conv).unwrap();
    assert_eq!(turn.replies[0].text, replies::WELCOME_BACK);
    assert!(conv.session_id().is_none());
    assert_eq!(conv.draft(), &Draft::default());

    service.respond(&mut conv, "Login fails");
    assert_eq!(conv.draft().description.as_deref(), Some("Login fails"));
    assert!(conv.draft().email.is_none());
    assert_eq!(conv.stage(), Stage::AwaitingEmail);
    let second_session = conv.session_id().cloned().unwrap();
    assert_ne!(first_session, second_session);

    let log = store.list_messages(&second_session).unwrap();
    assert_eq!(log[0].text, replies::WELCOME_BACK);
    assert_eq!(store.list_messages(&first_session).unwrap().len(), first_log_len);
}

#[test]
fn test_takeover_is_persisted_and_silences_bot() {
    let (_dir, store, service) = file_service();
    let mut conv = service.start();
    service.respond(&mut conv, "The app is broken");
    let session_id = conv.session_id().cloned().unwrap();

    service.set_takeover(&mut conv, true);
    assert!(store.find_session(&session_id).unwrap().unwrap().takeover);

    let replies = service.respond(&mut conv, "bad-email");
    assert!(replies.is_empty());
    // The user's message is still logged for the agent.
    let log = store.list_messages(&session_id).unwrap();
    assert_eq!(log.last().unwrap().text, "bad-email");

    service.set_takeover(&mut conv, false);
    assert!(!store.find_session(&session_id).unwrap().unwrap().takeover);
}

#[test]
fn test_blank_message_creates_nothing() {
    let (_dir, _store, service) = file_service();
    let mut conv = service.start();
    assert!(service.respond(&mut conv, "  ").is_empty());
    assert!(conv.session_id().is_none());
}

#[test]
fn test_reprompt_then_notes_create_exactly_one_ticket() {
    let (_dir, store, service) = file_service();
    let mut conv = service.start();

    service.respond(&mut conv, "Refund never arrived");
    let replies = service.respond(&mut conv, "jo@");
    assert_eq!(replies[0].kind, ReplyKind::EmailReprompt);
    assert!(store.list_tickets().unwrap().is_empty());

    let id = created_ticket_id(&service.respond(&mut conv, "jo@example.com")).unwrap();
    for note in ["It was order 1182", "Paid by card"] {
        let replies = service.respond(&mut conv, note);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].kind, ReplyKind::Acknowledgement);
    }

    let tickets = store.list_tickets().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, id);
    assert_eq!(tickets[0].description, "Refund never arrived");
    assert_eq!(conv.stage(), Stage::PostCreation);
}

#[test]
fn test_parallel_creations_for_one_email_share_a_customer() {
    let (dir, store, service) = file_service();
    let barrier = Arc::new(std::sync::Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let request = CreationRequest {
                    epoch: 0,
                    description: format!("Issue number {}", i),
                    email: "same@example.com".to_string(),
                    session_id: None,
                };
                barrier.wait();
                service.create_ticket(&request).unwrap()
            })
        })
        .collect();

    let tickets: Vec<Ticket> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(tickets.iter().all(|t| t.customer_id == tickets[0].customer_id));
    assert_eq!(store.list_tickets().unwrap().len(), 8);

    let user_files = std::fs::read_dir(dir.path().join("users")).unwrap().count();
    let profile_files = std::fs::read_dir(dir.path().join("customer_profiles")).unwrap().count();
    assert_eq!(user_files, 1);
    assert_eq!(profile_files, 1);
}

#[test]
fn test_closed_conversation_binds_no_session() {
    let (_dir, _store, service) = file_service();
    let mut conv = service.start();
    conv.close();

    assert!(service.handle_message(&mut conv, "The app is broken").is_empty());
    assert!(conv.session_id().is_none());
    assert_eq!(conv.history().len(), 1);
}
