//! Users, customer profiles and the signals used for priority adjustment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CustomerId, UserId};

/// A login identity, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a guest customer account for an email address.
    pub fn guest(email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            role: "customer".to_string(),
            first_name: "Guest".to_string(),
            last_name: "User".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Display name used in customer-facing messages.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Customer profile attached to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loyalty_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<u32>,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl CustomerProfile {
    /// Creates an empty profile for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CustomerId::new(),
            user_id,
            loyalty_level: None,
            total_spent: None,
            total_orders: None,
            city: "Unknown".to_string(),
            country: "Unknown".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Signals derived from this profile for classification.
    pub fn signal(&self) -> CustomerSignal {
        CustomerSignal {
            loyalty_level: self.loyalty_level.clone(),
            total_spent: self.total_spent,
            total_orders: self.total_orders,
        }
    }
}

/// Customer-tier signals supplied per classification call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSignal {
    /// Free-text loyalty tier, compared case-insensitively.
    pub loyalty_level: Option<String>,
    /// Lifetime spend, currency-agnostic.
    pub total_spent: Option<f64>,
    /// Lifetime order count.
    pub total_orders: Option<u32>,
}

impl CustomerSignal {
    /// Signal with only a loyalty tier.
    pub fn with_loyalty(level: impl Into<String>) -> Self {
        Self {
            loyalty_level: Some(level.into()),
            ..Self::default()
        }
    }

    /// Signal with only a lifetime spend.
    pub fn with_spend(total_spent: f64) -> Self {
        Self {
            total_spent: Some(total_spent),
            ..Self::default()
        }
    }

    /// Signal with only a lifetime order count.
    pub fn with_orders(total_orders: u32) -> Self {
        Self {
            total_orders: Some(total_orders),
            ..Self::default()
        }
    }
}
