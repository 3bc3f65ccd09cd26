//! Bot reply texts and acknowledgement selection.

use rand::Rng;

/// Greeting shown when a conversation starts.
pub const WELCOME: &str =
    "Welcome to Support! I can help you create a support ticket. Please briefly describe your issue.";

/// Greeting shown after the user starts another ticket.
pub const WELCOME_BACK: &str = "Welcome back! How can I help you create another ticket?";

/// Asked after the description is captured.
pub const EMAIL_PROMPT: &str = "I understand. What is the best email address to reach you at?";

/// Sent when the email fails validation.
pub const EMAIL_REPROMPT: &str =
    "That doesn't look like a valid email. Please try again (e.g., name@example.com).";

/// Sent a moment after a ticket is created.
pub const FOLLOW_UP: &str = "Is there anything else I can help you with?";

/// Filler replies for messages after a ticket exists.
pub const ACKNOWLEDGEMENTS: [&str; 5] = [
    "I've noted that! Is there anything specific you'd like to add to your ticket?",
    "Got it! Feel free to share more details if needed.",
    "Thanks for letting me know! Anything else on your mind?",
    "Noted! Our team will review this along with your ticket.",
    "I hear you! Is there anything else I can help clarify?",
];

/// Announces a created ticket. The ticket id travels as an attachment.
pub fn ticket_created(priority_label: &str) -> String {
    format!(
        "Success! Your ticket has been created with {} priority. Ticket ID:",
        priority_label
    )
}

/// Reports a failed creation attempt.
pub fn creation_failed(reason: &str) -> String {
    format!("Sorry, something went wrong: {}.", reason.trim_end_matches('.'))
}

/// Chooses which acknowledgement to send.
pub trait ReplyPicker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniformly random choice from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl ReplyPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index (wrapped into range).
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl ReplyPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Picks one of [`ACKNOWLEDGEMENTS`].
pub fn acknowledgement(picker: &dyn ReplyPicker) -> &'static str {
    let index = picker.pick(ACKNOWLEDGEMENTS.len()).min(ACKNOWLEDGEMENTS.len() - 1);
    ACKNOWLEDGEMENTS[index]
}
