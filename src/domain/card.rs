//! Payment card number matcher.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches 13 to 16 digit runs with optional single space or hyphen
/// separators, e.g. `4111 1111 1111 1111` or `4111-1111-1111-1111`.
#[derive(Debug, Clone, Default)]
pub struct CreditCardMatcher;

impl CreditCardMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(?:\d[ -]?){12,15}\d\b").expect("Valid credit card regex")
        });
        &PATTERN
    }
}

impl PatternMatcher for CreditCardMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn category(&self, _matched: &str) -> Category {
        Category::CreditCard
    }

    fn accepts(&self, candidate: &str) -> bool {
        let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
        (13..=16).contains(&digits)
    }
}
