//! Secret material: key-like tokens and sensitive keywords.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that flag credential or identity material.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "api_key",
    "secret",
    "ssn",
    "token",
    "private_key",
];

/// Long alphanumeric tokens that look like keys or secrets.
///
/// A candidate must be at least 24 characters and mix letters and digits,
/// which keeps ordinary long words and digit runs out.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyMatcher;

impl ApiKeyMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[A-Za-z0-9_\-]{24,}").expect("Valid key regex"));
        &PATTERN
    }
}

impl PatternMatcher for ApiKeyMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn category(&self, _matched: &str) -> Category {
        Category::ApiKeyLike
    }

    fn accepts(&self, candidate: &str) -> bool {
        candidate.chars().any(|c| c.is_ascii_digit())
            && candidate.chars().any(|c| c.is_ascii_alphabetic())
    }
}

/// Case-insensitive whole-word match against [`SENSITIVE_KEYWORDS`].
#[derive(Debug, Clone, Default)]
pub struct SensitiveKeywordMatcher;

impl SensitiveKeywordMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            let alternatives = SENSITIVE_KEYWORDS.join("|");
            Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives)).expect("Valid keyword regex")
        });
        &PATTERN
    }
}

impl PatternMatcher for SensitiveKeywordMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn category(&self, matched: &str) -> Category {
        Category::Keyword(matched.to_ascii_lowercase())
    }
}
