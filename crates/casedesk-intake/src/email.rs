//! Email address validation.

use std::sync::OnceLock;

use regex::Regex;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Local part, `@`, and a domain with at least one dot. No whitespace and no
/// second `@` anywhere.
fn pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// Returns whether `candidate` (trimmed) looks like an email address.
pub fn is_valid_email(candidate: &str) -> bool {
    pattern().is_match(candidate.trim())
}
