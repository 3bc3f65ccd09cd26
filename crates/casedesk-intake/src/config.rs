//! Intake timing and greeting settings.

use std::time::Duration;

use crate::replies;

/// Default pause before deferred bot replies.
pub const DEFAULT_TYPING_DELAY_MS: u64 = 3000;

/// Default pause before a ticket-creation request is executed.
pub const DEFAULT_CREATION_DELAY_MS: u64 = 800;

/// Settings shared by every conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Simulated typing delay for deferred replies.
    pub typing_delay: Duration,
    /// Delay before ticket creation starts.
    pub creation_delay: Duration,
    /// First bot message of a new conversation.
    pub welcome: String,
}

impl IntakeConfig {
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    pub fn with_creation_delay(mut self, delay: Duration) -> Self {
        self.creation_delay = delay;
        self
    }

    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = welcome.into();
        self
    }

    /// No delays at all. Used by tests and scripted runs.
    pub fn immediate() -> Self {
        Self::default()
            .with_typing_delay(Duration::ZERO)
            .with_creation_delay(Duration::ZERO)
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(DEFAULT_TYPING_DELAY_MS),
            creation_delay: Duration::from_millis(DEFAULT_CREATION_DELAY_MS),
            welcome: replies::WELCOME.to_string(),
        }
    }
}
