//! SLA rule definitions.

use serde::{Deserialize, Serialize};

use crate::ticket::PriorityLevel;

/// Condition field that scopes a rule to a ticket priority.
pub const PRIORITY_FIELD: &str = "priority";

/// A named resolution-time budget, optionally scoped by a condition.
///
/// Rule sets are ordered; the first structural match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaRule {
    /// Rule name, e.g. "High priority resolution".
    pub name: String,

    /// Field the condition applies to (only `priority` is understood).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_field: Option<String>,

    /// Value the field must equal, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_value: Option<String>,

    /// Resolution window in minutes.
    pub resolution_mins: u32,
}

impl SlaRule {
    /// Creates an unconditional rule.
    pub fn new(name: impl Into<String>, resolution_mins: u32) -> Self {
        Self {
            name: name.into(),
            condition_field: None,
            condition_value: None,
            resolution_mins,
        }
    }

    /// Creates a rule scoped to a single priority.
    pub fn for_priority(name: impl Into<String>, priority: PriorityLevel, resolution_mins: u32) -> Self {
        Self::new(name, resolution_mins).with_condition(PRIORITY_FIELD, priority.as_str())
    }

    /// Sets the condition field/value pair.
    pub fn with_condition(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.condition_field = Some(field.into());
        self.condition_value = Some(value.into());
        self
    }

    /// Whether the rule carries a condition field at all.
    pub fn is_conditional(&self) -> bool {
        self.condition_field.is_some()
    }
}
