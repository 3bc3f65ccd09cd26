//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use casedesk_core::{LogNotifier, Notifier};
use casedesk_intake::{Conversation, CreationRequest, IntakeError, IntakeService, Turn};
use casedesk_models::Ticket;

use crate::config::ApiConfig;

/// A conversation shared between its request handlers and background tasks.
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Intake engine.
    pub intake: Arc<IntakeService>,
    /// Delivery channel for resolution notices.
    pub notifier: Arc<dyn Notifier>,
    /// Live conversations keyed by conversation id.
    conversations: Arc<RwLock<HashMap<String, SharedConversation>>>,
}

impl AppState {
    /// Creates state with a logging notifier.
    pub fn new(config: ApiConfig, intake: IntakeService) -> Self {
        Self {
            config: Arc::new(config),
            intake: Arc::new(intake),
            notifier: Arc::new(LogNotifier),
            conversations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces the notifier.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Registers a conversation and returns its id.
    pub async fn open_conversation(&self, conversation: Conversation) -> (String, SharedConversation) {
        let id = format!("conv-{}", Uuid::new_v4());
        let shared = Arc::new(Mutex::new(conversation));
        self.conversations
            .write()
            .await
            .insert(id.clone(), shared.clone());
        (id, shared)
    }

    /// Gets a conversation by id.
    pub async fn conversation(&self, id: &str) -> Option<SharedConversation> {
        self.conversations.read().await.get(id).cloned()
    }

    /// Closes a conversation and removes it from the live set. Background
    /// tasks still holding it find it closed and drop their work.
    pub async fn close_conversation(&self, id: &str) -> Option<SharedConversation> {
        let removed = self.conversations.write().await.remove(id)?;
        removed.lock().await.close();
        Some(removed)
    }

    /// Number of live conversations.
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Runs the asynchronous part of a turn in the background.
    ///
    /// Deferred replies are released after the typing delay. A creation
    /// request runs after the creation delay on the blocking pool and its
    /// own follow-up turn is scheduled the same way. Anything made stale by
    /// a reset in the meantime is dropped by the conversation.
    pub fn schedule(&self, conversation: SharedConversation, turn: Turn) {
        let typing_delay = self.intake.config().typing_delay;

        for deferred in turn.deferred {
            let intake = self.intake.clone();
            let conversation = conversation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(typing_delay).await;
                let mut conv = conversation.lock().await;
                if intake.deliver(&mut conv, deferred).is_none() {
                    debug!("Dropped stale deferred reply");
                }
            });
        }

        if let Some(request) = turn.creation {
            let state = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(state.intake.config().creation_delay).await;
                let outcome = state.create_ticket(request.clone()).await;
                let next = {
                    let mut conv = conversation.lock().await;
                    state.intake.complete(&mut conv, &request, outcome)
                };
                state.schedule(conversation, next);
            });
        }
    }

    async fn create_ticket(&self, request: CreationRequest) -> casedesk_intake::Result<Ticket> {
        let intake = self.intake.clone();
        tokio::task::spawn_blocking(move || intake.create_ticket(&request))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Ticket creation task failed");
                Err(IntakeError::CreationFailure("Ticket creation was interrupted.".to_string()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use casedesk_intake::{FixedPicker, IntakeConfig, Stage};
    use casedesk_persistence::FileStore;
    use tempfile::tempdir;

    fn make_test_state() -> AppState {
        let dir = tempdir().unwrap();
        let path = dir.path().to_path_buf();
        std::mem::forget(dir);

        let intake = IntakeService::new(Arc::new(FileStore::new(path)))
            .with_picker(FixedPicker(0))
            .with_config(IntakeConfig::immediate());
        AppState::new(ApiConfig::default(), intake)
    }

    async fn wait_for_stage(conversation: &SharedConversation, stage: Stage) {
        for _ in 0..200 {
            if conversation.lock().await.stage() == stage {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("conversation never reached {}", stage);
    }

    #[tokio::test]
    async fn test_open_and_get_conversation() {
        let state = make_test_state();
        assert_eq!(state.conversation_count().await, 0);

        let (id, _) = state.open_conversation(state.intake.start()).await;
        assert!(id.starts_with("conv-"));
        assert!(state.conversation(&id).await.is_some());
        assert!(state.conversation("conv-missing").await.is_none());
        assert_eq!(state.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn test_scheduled_creation_completes() {
        let state = make_test_state();
        let (_, conversation) = state.open_conversation(state.intake.start()).await;

        let turn = {
            let mut conv = conversation.lock().await;
            state.intake.handle_message(&mut conv, "The app is broken");
            state.intake.handle_message(&mut conv, "jo@example.com")
        };
        assert!(turn.creation.is_some());
        state.schedule(conversation.clone(), turn);

        wait_for_stage(&conversation, Stage::PostCreation).await;
        assert!(conversation.lock().await.last_ticket().is_some());
    }

    #[tokio::test]
    async fn test_reset_discards_pending_reply() {
        let intake = IntakeService::without_store()
            .with_config(IntakeConfig::immediate().with_typing_delay(Duration::from_millis(50)));
        let state = AppState::new(ApiConfig::default(), intake);
        let (_, conversation) = state.open_conversation(state.intake.start()).await;

        let turn = {
            let mut conv = conversation.lock().await;
            state.intake.handle_message(&mut conv, "The app is broken")
        };
        assert_eq!(turn.deferred.len(), 1);
        state.schedule(conversation.clone(), turn);

        {
            let mut conv = conversation.lock().await;
            state.intake.start_new_ticket(&mut conv).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        let conv = conversation.lock().await;
        assert_eq!(conv.history().len(), 1, "only the welcome-back greeting remains");
    }

    #[tokio::test]
    async fn test_close_drops_pending_reply_and_entry() {
        let intake = IntakeService::without_store()
            .with_config(IntakeConfig::immediate().with_typing_delay(Duration::from_millis(50)));
        let state = AppState::new(ApiConfig::default(), intake);
        let (id, conversation) = state.open_conversation(state.intake.start()).await;

        let turn = {
            let mut conv = conversation.lock().await;
            state.intake.handle_message(&mut conv, "The app is broken")
        };
        state.schedule(conversation.clone(), turn);

        assert!(state.close_conversation(&id).await.is_some());
        assert_eq!(state.conversation_count().await, 0);
        assert!(state.close_conversation(&id).await.is_none());
        tokio::time::sleep(Duration::from_millis(150)).await;

        let conv = conversation.lock().await;
        assert!(conv.is_closed());
        assert_eq!(conv.history().len(), 2, "welcome and the user's message only");
    }
}
