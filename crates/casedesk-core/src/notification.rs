//! Resolution notices and the delivery side channel.
//!
//! The core only renders the payload and hands it to a [`Notifier`]; the
//! outcome is a plain success flag. Failures are logged by [`deliver`] and
//! never flow back into ticket or conversation state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use casedesk_models::Ticket;

/// Greeting used when the customer's name is unknown.
const FALLBACK_CUSTOMER_NAME: &str = "Valued Customer";

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Everything a resolution notice mentions.
#[derive(Debug, Clone)]
pub struct ResolutionDetails {
    pub customer_name: Option<String>,
    pub ticket_id: String,
    pub short_id: String,
    pub ticket_title: String,
    pub description: String,
    pub resolution_notes: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolutionDetails {
    /// Collects the details from a resolved ticket.
    ///
    /// Falls back to the current time when the ticket carries no resolution
    /// timestamp.
    pub fn from_ticket(ticket: &Ticket, customer_name: Option<String>) -> Self {
        Self {
            customer_name,
            ticket_id: ticket.id.to_string(),
            short_id: ticket.short_id().to_string(),
            ticket_title: ticket.title.clone(),
            description: ticket.description.clone(),
            resolution_notes: ticket.resolution_notes.clone(),
            resolved_at: ticket.resolved_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Renders the notice sent when a ticket is resolved or closed.
pub fn render_resolution_notice(recipient: &str, details: &ResolutionDetails) -> Notification {
    let name = details
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_CUSTOMER_NAME);

    let mut body = format!(
        "Dear {name},\n\n\
         We're pleased to inform you that your support ticket has been successfully resolved.\n\n\
         Ticket: {title}\n\
         Ticket ID: {id}\n\
         Issue: {issue}\n",
        title = details.ticket_title,
        id = details.ticket_id,
        issue = details.description,
    );

    if let Some(notes) = details.resolution_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        body.push_str(&format!("\nResolution summary:\n{}\n", notes));
    }

    body.push_str(&format!(
        "\nYour ticket was resolved on {}.\n\n\
         If you have any further questions or concerns, please don't hesitate to reach out to us.\n\n\
         Best regards,\nCustomer Support Team\n",
        details.resolved_at.format("%A, %B %-d, %Y at %H:%M UTC"),
    ));

    Notification {
        recipient: recipient.to_string(),
        subject: format!("Your Support Ticket #{} Has Been Resolved", details.short_id),
        body,
    }
}

/// Delivery side channel for notifications.
pub trait Notifier: Send + Sync {
    /// Attempts delivery. Returns whether it succeeded.
    fn send(&self, notification: &Notification) -> bool;
}

/// Notifier that only records the notification in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> bool {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification issued"
        );
        true
    }
}

/// Sends through `notifier`, logging a failure instead of returning an error.
pub fn deliver(notifier: &dyn Notifier, notification: &Notification) -> bool {
    let sent = notifier.send(notification);
    if !sent {
        warn!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification delivery failed"
        );
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk_models::{PriorityLevel, TicketId};
    use chrono::TimeZone;

    fn details(notes: Option<&str>, name: Option<&str>) -> ResolutionDetails {
        ResolutionDetails {
            customer_name: name.map(str::to_string),
            ticket_id: "tkt-12345678-abcd".to_string(),
            short_id: "tkt-1234".to_string(),
            ticket_title: "Order missing".to_string(),
            description: "My order never arrived".to_string(),
            resolution_notes: notes.map(str::to_string),
            resolved_at: Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 0).unwrap(),
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, _notification: &Notification) -> bool {
            false
        }
    }

    #[test]
    fn test_subject_uses_short_id() {
        let notice = render_resolution_notice("jo@example.com", &details(None, Some("Jo")));
        assert_eq!(notice.subject, "Your Support Ticket #tkt-1234 Has Been Resolved");
        assert_eq!(notice.recipient, "jo@example.com");
    }

    #[test]
    fn test_body_contents() {
        let notice = render_resolution_notice("jo@example.com", &details(Some("Refund issued"), Some("Jo")));
        assert!(notice.body.starts_with("Dear Jo,"));
        assert!(notice.body.contains("Ticket ID: tkt-12345678-abcd"));
        assert!(notice.body.contains("Issue: My order never arrived"));
        assert!(notice.body.contains("Resolution summary:\nRefund issued"));
        assert!(notice.body.contains("Monday, March 2, 2026 at 14:05 UTC"));
    }

    #[test]
    fn test_missing_name_and_notes() {
        let notice = render_resolution_notice("jo@example.com", &details(None, Some("  ")));
        assert!(notice.body.starts_with("Dear Valued Customer,"));
        assert!(!notice.body.contains("Resolution summary"));
    }

    #[test]
    fn test_details_from_ticket() {
        let mut ticket = casedesk_models::Ticket::new("Card declined", PriorityLevel::High, "cust-1");
        ticket.id = TicketId::from_string("tkt-abcdefgh-1");
        ticket.resolve(Some("Bank issue".to_string()));

        let details = ResolutionDetails::from_ticket(&ticket, None);
        assert_eq!(details.short_id, "tkt-abcd");
        assert_eq!(details.resolution_notes.as_deref(), Some("Bank issue"));
        assert_eq!(Some(details.resolved_at), ticket.resolved_at);
    }

    #[test]
    fn test_deliver_reports_outcome() {
        let notice = render_resolution_notice("jo@example.com", &details(None, None));
        assert!(deliver(&LogNotifier, &notice));
        assert!(!deliver(&FailingNotifier, &notice));
    }
}
