//! SLA evaluation.
//!
//! Given a ticket, an ordered rule set and the current time, computes how
//! long is left until (or how long ago was) the resolution target. The
//! evaluator is read-only and cheap, so callers may poll it freely.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use casedesk_models::sla::PRIORITY_FIELD;
use casedesk_models::{PriorityLevel, SlaRule, Ticket};

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;

/// Remaining-time-or-breached status of one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaStatus {
    /// Whether the resolution target lies in the past.
    pub is_breached: bool,
    /// Whole hours between target and now.
    pub hours: i64,
    /// Remaining minutes after `hours`.
    pub minutes: i64,
    /// Priority of the evaluated ticket.
    pub priority: PriorityLevel,
    /// Name of the rule that was applied.
    pub rule_name: String,
    /// Resolution target (`created_at + resolution window`).
    pub target: DateTime<Utc>,
}

impl SlaStatus {
    /// Renders the distance as `"{h}h {m}m"`.
    pub fn time_string(&self) -> String {
        format!("{}h {}m", self.hours, self.minutes)
    }
}

/// Picks the rule that applies to a priority.
///
/// Tried in order: a `priority` condition equal to the priority name; a rule
/// whose name contains the priority name; an unconditional rule; the first
/// rule. All comparisons are case-insensitive. Returns None only for an empty
/// rule set.
pub fn select_rule(priority: PriorityLevel, rules: &[SlaRule]) -> Option<&SlaRule> {
    let name = priority.as_str();

    rules
        .iter()
        .find(|rule| {
            rule.condition_field
                .as_deref()
                .is_some_and(|field| field.eq_ignore_ascii_case(PRIORITY_FIELD))
                && rule
                    .condition_value
                    .as_deref()
                    .is_some_and(|value| value.eq_ignore_ascii_case(name))
        })
        .or_else(|| rules.iter().find(|rule| rule.name.to_lowercase().contains(name)))
        .or_else(|| rules.iter().find(|rule| !rule.is_conditional()))
        .or_else(|| rules.first())
}

/// Evaluates a ticket's SLA at `now`.
///
/// Returns None when the ticket is not Open/InProgress or the rule set is empty.
pub fn evaluate(ticket: &Ticket, rules: &[SlaRule], now: DateTime<Utc>) -> Option<SlaStatus> {
    if !ticket.status.is_active() {
        return None;
    }

    let rule = select_rule(ticket.priority, rules)?;
    let target = ticket.created_at + Duration::minutes(i64::from(rule.resolution_mins));
    let distance_ms = (target - now).num_milliseconds().abs();

    Some(SlaStatus {
        is_breached: target < now,
        hours: distance_ms / MS_PER_HOUR,
        minutes: (distance_ms % MS_PER_HOUR) / MS_PER_MINUTE,
        priority: ticket.priority,
        rule_name: rule.name.clone(),
        target,
    })
}

/// Rule set used to seed an empty store.
pub fn default_rules() -> Vec<SlaRule> {
    vec![
        SlaRule::for_priority("Urgent priority resolution", PriorityLevel::Urgent, 60),
        SlaRule::for_priority("High priority resolution", PriorityLevel::High, 240),
        SlaRule::for_priority("Medium priority resolution", PriorityLevel::Medium, 1440),
        SlaRule::for_priority("Low priority resolution", PriorityLevel::Low, 4320),
    ]
}
