//! Ticket priority classification.
//!
//! Classification runs in two stages:
//!
//! 1. **Lexical base level.** The lower-cased description is tested against an
//!    ordered table of keyword rules (Urgent, High, Low, Medium). Matching is
//!    plain substring containment, not word-boundary aware. The first rule with
//!    any matching keyword decides; with no match the base level is Medium.
//! 2. **Tier adjustment.** A VIP/Gold loyalty tier raises the level by one
//!    (up to Urgent) and skips the remaining checks. Otherwise a lifetime spend
//!    above the spend threshold or an order count above the order threshold
//!    raises it by one, capped at High. The two thresholds share a single
//!    escalation.
//!
//! Classification is pure and total: every input yields a level.

use std::sync::OnceLock;

use casedesk_models::{CustomerSignal, PriorityLevel};

/// Security, fraud and emergency terms.
const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "emergency",
    "asap",
    "immediately",
    "now",
    "hacked",
    "stolen",
    "fraud",
    "unauthorized",
    "breach",
    "security",
    "payment failed",
    "account compromised",
    "stolen card",
];

/// Malfunction, access, order and payment terms.
const HIGH_KEYWORDS: &[&str] = &[
    "not working",
    "broken",
    "error",
    "bug",
    "crash",
    "down",
    "outage",
    "cannot",
    "can't",
    "unable",
    "failed",
    "issue",
    "problem",
    "app not",
    "website not",
    "login",
    "password",
    "access",
    "order",
    "delivery",
    "missing order",
    "wrong order",
    "refund",
    "return",
    "money back",
    "charge",
    "payment",
    "billing",
    "charged",
    "transaction",
    "dispute",
    "cancel order",
];

/// General assistance and complaint terms.
const MEDIUM_KEYWORDS: &[&str] = &[
    "help",
    "assistance",
    "support",
    "need help",
    "confused",
    "unclear",
    "slow",
    "delay",
    "late",
    "waiting",
    "concern",
    "worry",
    "complaint",
    "dissatisfied",
    "unhappy",
    "not satisfied",
    "change",
    "modify",
    "update",
    "edit",
    "cancel",
    "modification",
];

/// Informational, menu and FAQ terms.
const LOW_KEYWORDS: &[&str] = &[
    "question",
    "info",
    "information",
    "how to",
    "where",
    "what",
    "curious",
    "wondering",
    "just asking",
    "general",
    "feedback",
    "suggestion",
    "menu",
    "nutrition",
    "ingredients",
    "hours",
    "inquiry",
    "ask",
    "curiosity",
];

/// Loyalty tier substrings that earn an escalation.
const ESCALATING_TIERS: &[&str] = &["vip", "gold"];

/// Lifetime spend above which a customer is high-value.
pub const SPEND_THRESHOLD: f64 = 500.0;

/// Lifetime order count above which a customer is high-value.
pub const ORDER_THRESHOLD: u32 = 50;

/// Input to a single classification call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationInput {
    /// Free-text problem description. May be empty.
    pub description: String,
    /// Customer-tier signals, all optional.
    pub signal: CustomerSignal,
}

impl ClassificationInput {
    /// Input with a description and no customer signal.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            signal: CustomerSignal::default(),
        }
    }

    /// Attaches customer signals.
    pub fn with_signal(mut self, signal: CustomerSignal) -> Self {
        self.signal = signal;
        self
    }
}

/// One row of the lexical rule table.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// Level assigned when any keyword matches.
    pub level: PriorityLevel,
    /// Lower-case keywords, matched as substrings.
    pub keywords: Vec<&'static str>,
}

impl KeywordRule {
    fn new(level: PriorityLevel, keywords: &[&'static str]) -> Self {
        Self {
            level,
            keywords: keywords.to_vec(),
        }
    }

    /// Returns the first keyword contained in `text` (already lower-cased).
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|k| text.contains(k))
    }
}

/// Keyword table plus tier thresholds.
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    rules: Vec<KeywordRule>,
    fallback: PriorityLevel,
    escalating_tiers: Vec<&'static str>,
    spend_threshold: f64,
    order_threshold: u32,
}

impl Default for PriorityClassifier {
    fn default() -> Self {
        Self {
            // Evaluation order is the precedence order.
            rules: vec![
                KeywordRule::new(PriorityLevel::Urgent, URGENT_KEYWORDS),
                KeywordRule::new(PriorityLevel::High, HIGH_KEYWORDS),
                KeywordRule::new(PriorityLevel::Low, LOW_KEYWORDS),
                KeywordRule::new(PriorityLevel::Medium, MEDIUM_KEYWORDS),
            ],
            fallback: PriorityLevel::Medium,
            escalating_tiers: ESCALATING_TIERS.to_vec(),
            spend_threshold: SPEND_THRESHOLD,
            order_threshold: ORDER_THRESHOLD,
        }
    }
}

impl PriorityClassifier {
    /// The rule table in evaluation order.
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Classifies a description and customer signal into a priority level.
    pub fn classify(&self, input: &ClassificationInput) -> PriorityLevel {
        let (base, _) = self.base_level(&input.description);
        self.adjust_for_tier(base, &input.signal)
    }

    /// Stage 1: the lexical base level and the keyword that decided it.
    pub fn base_level(&self, description: &str) -> (PriorityLevel, Option<&'static str>) {
        let text = description.to_lowercase();
        self.rules
            .iter()
            .find_map(|rule| rule.first_match(&text).map(|k| (rule.level, Some(k))))
            .unwrap_or((self.fallback, None))
    }

    /// Stage 2: escalation from customer-tier signals.
    pub fn adjust_for_tier(&self, base: PriorityLevel, signal: &CustomerSignal) -> PriorityLevel {
        if let Some(tier) = signal.loyalty_level.as_deref() {
            let tier = tier.to_lowercase();
            if self.escalating_tiers.iter().any(|t| tier.contains(t)) {
                return base.escalate();
            }
        }

        let high_spend = signal
            .total_spent
            .is_some_and(|spent| spent > self.spend_threshold);
        let frequent = signal
            .total_orders
            .is_some_and(|orders| orders > self.order_threshold);

        if high_spend || frequent {
            return base.escalate_capped(PriorityLevel::High);
        }

        base
    }
}

static DEFAULT_CLASSIFIER: OnceLock<PriorityClassifier> = OnceLock::new();

/// Classifies with the default keyword table and thresholds.
pub fn classify(input: &ClassificationInput) -> PriorityLevel {
    DEFAULT_CLASSIFIER
        .get_or_init(PriorityClassifier::default)
        .classify(input)
}
