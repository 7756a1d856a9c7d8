//! Phone number domain logic.
//!
//! Detection is deliberately loose: the goal is redaction, not validation,
//! so any phone-shaped digit grouping is reported.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Phone number pattern matcher.
///
/// Supports:
/// - (555) 123-4567
/// - 555-123-4567, 555.123.4567, 5551234567
/// - +1 555 123 4567, +44-555-123-4567
/// - 123-4567 (local number with separator)
#[derive(Debug, Clone)]
pub struct PhoneNumberMatcher;

impl PhoneNumberMatcher {
    /// Creates a new phone number matcher.
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s]?)\d{3}[-.\s]?\d{4}\b|\b\d{3}[-.]\d{4}\b",
            )
            .expect("Valid phone number regex")
        });
        &PATTERN
    }

    /// Strips a match down to its digits.
    pub fn digits(text: &str) -> String {
        text.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

impl Default for PhoneNumberMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher for PhoneNumberMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn category(&self, _matched: &str) -> Category {
        Category::Phone
    }

    fn accepts(&self, candidate: &str) -> bool {
        let n = Self::digits(candidate).len();
        (7..=13).contains(&n)
    }
}
