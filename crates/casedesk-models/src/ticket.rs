//! Ticket types for casedesk.
//!
//! A ticket (or support case) is created once by the intake conversation and
//! mutated externally afterwards; the intake engine only reads it back for
//! SLA computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CustomerId, TicketId};
use crate::note::TicketNote;

/// Maximum length of a human-readable case number.
const CASE_NUMBER_MAX_LEN: usize = 20;

/// Priority levels for tickets.
///
/// Higher numeric value = higher priority.
/// Urgent (4) > High (3) > Medium (2) > Low (1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// Informational requests.
    Low,
    /// General assistance. The default when nothing else applies.
    #[default]
    Medium,
    /// Malfunctions, payment and order failures.
    High,
    /// Security, fraud and emergencies.
    Urgent,
}

impl PriorityLevel {
    /// All levels, lowest first.
    pub const ALL: [PriorityLevel; 4] = [
        PriorityLevel::Low,
        PriorityLevel::Medium,
        PriorityLevel::High,
        PriorityLevel::Urgent,
    ];

    /// Returns the numeric value of this priority.
    /// Higher value = higher priority.
    pub fn as_value(&self) -> u8 {
        match self {
            PriorityLevel::Low => 1,
            PriorityLevel::Medium => 2,
            PriorityLevel::High => 3,
            PriorityLevel::Urgent => 4,
        }
    }

    /// Returns the storage form of this priority (lower-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "low",
            PriorityLevel::Medium => "medium",
            PriorityLevel::High => "high",
            PriorityLevel::Urgent => "urgent",
        }
    }

    /// Returns the display label of this priority.
    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
            PriorityLevel::Urgent => "Urgent",
        }
    }

    /// Parses a stored priority, case-insensitively.
    ///
    /// Unknown values map to [`PriorityLevel::Medium`].
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "urgent" => PriorityLevel::Urgent,
            "high" => PriorityLevel::High,
            "low" => PriorityLevel::Low,
            _ => PriorityLevel::Medium,
        }
    }

    /// Raises the level by one step, saturating at Urgent.
    pub fn escalate(self) -> Self {
        match self {
            PriorityLevel::Low => PriorityLevel::Medium,
            PriorityLevel::Medium => PriorityLevel::High,
            PriorityLevel::High | PriorityLevel::Urgent => PriorityLevel::Urgent,
        }
    }

    /// Raises the level by one step without going above `cap`.
    ///
    /// Levels already at or above the cap are returned unchanged.
    pub fn escalate_capped(self, cap: PriorityLevel) -> Self {
        if self >= cap {
            return self;
        }
        self.escalate().min(cap)
    }
}

impl PartialOrd for PriorityLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_value().cmp(&other.as_value())
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Whether an SLA clock is still running for this status.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }

    /// Whether the ticket has reached a finished state.
    pub fn is_finished(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }

    /// Parses a status name as used by the API.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "open" => Some(TicketStatus::Open),
            "in_progress" | "inprogress" | "in progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    /// Returns the storage form of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

/// A tracked support case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Globally unique identifier.
    pub id: TicketId,

    /// Human-readable case number (`CASE-<unix millis>`).
    pub case_number: String,

    /// Short title. The intake flow uses the description.
    pub title: String,

    /// Problem description as typed by the customer.
    pub description: String,

    /// Classified priority.
    pub priority: PriorityLevel,

    /// Current status.
    pub status: TicketStatus,

    /// Customer profile this ticket belongs to.
    pub customer_id: CustomerId,

    /// When the ticket was created.
    pub created_at: DateTime<Utc>,

    /// When the ticket was resolved or closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Notes recorded on resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,

    /// Agent notes, in the order they were added.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<TicketNote>,
}

impl Ticket {
    /// Creates a new open ticket stamped with the current time.
    pub fn new(
        description: impl Into<String>,
        priority: PriorityLevel,
        customer_id: impl Into<CustomerId>,
    ) -> Self {
        Self::created_at(description, priority, customer_id, Utc::now())
    }

    /// Creates a new open ticket with an explicit creation time.
    pub fn created_at(
        description: impl Into<String>,
        priority: PriorityLevel,
        customer_id: impl Into<CustomerId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let description = description.into();
        Self {
            id: TicketId::new(),
            case_number: case_number_for(created_at),
            title: description.clone(),
            description,
            priority,
            status: TicketStatus::Open,
            customer_id: customer_id.into(),
            created_at,
            resolved_at: None,
            resolution_notes: None,
            notes: Vec::new(),
        }
    }

    /// Moves the ticket to a new status.
    ///
    /// Entering Resolved or Closed stamps `resolved_at` once; reopening clears it.
    pub fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
        if status.is_finished() {
            if self.resolved_at.is_none() {
                self.resolved_at = Some(Utc::now());
            }
        } else {
            self.resolved_at = None;
        }
    }

    /// Marks the ticket as resolved with optional notes.
    pub fn resolve(&mut self, notes: Option<String>) {
        self.set_status(TicketStatus::Resolved);
        if notes.is_some() {
            self.resolution_notes = notes;
        }
    }

    /// Records a note on the ticket and returns it.
    pub fn add_note(&mut self, note: TicketNote) -> &TicketNote {
        self.notes.push(note);
        &self.notes[self.notes.len() - 1]
    }

    /// Notes with the most recent first.
    pub fn notes_newest_first(&self) -> Vec<&TicketNote> {
        let mut notes: Vec<&TicketNote> = self.notes.iter().rev().collect();
        notes.sort_by(|a, b| b.at.cmp(&a.at));
        notes
    }

    /// Short form of the id used in notifications.
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        id.char_indices()
            .nth(8)
            .map(|(idx, _)| &id[..idx])
            .unwrap_or(id)
    }
}

fn case_number_for(at: DateTime<Utc>) -> String {
    let mut number = format!("CASE-{}", at.timestamp_millis());
    number.truncate(CASE_NUMBER_MAX_LEN);
    number
}
