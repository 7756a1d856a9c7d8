//! Network identifier matchers.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// IPv4 dotted quad with octets in 0..=255.
#[derive(Debug, Clone, Default)]
pub struct IpAddressMatcher;

impl IpAddressMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
            )
            .expect("Valid IPv4 regex")
        });
        &PATTERN
    }
}

impl PatternMatcher for IpAddressMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn category(&self, _matched: &str) -> Category {
        Category::IpAddress
    }
}
