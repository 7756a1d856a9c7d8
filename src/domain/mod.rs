//! Domain models and business logic for sensitive-data detection.
//!
//! This module contains the detection vocabulary shared by every redactor:
//! categories, detected spans, per-document counts and the pattern matchers
//! that complement the external entity recognizer.

pub mod card;
pub mod email;
pub mod network;
pub mod phone;
pub mod secret;

pub use card::CreditCardMatcher;
pub use email::EmailMatcher;
pub use network::IpAddressMatcher;
pub use phone::PhoneNumberMatcher;
pub use secret::{ApiKeyMatcher, SensitiveKeywordMatcher, SENSITIVE_KEYWORDS};

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of sensitive content a span was detected as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Person,
    Organization,
    Location,
    Email,
    Phone,
    CreditCard,
    IpAddress,
    ApiKeyLike,
    /// Sensitive keyword, stored lower-cased (`password`, `ssn`, ...)
    Keyword(String),
}

impl Category {
    /// Maps a recognizer label (spaCy style) to a category.
    ///
    /// Labels outside the person/organization/location family return `None`
    /// and are dropped by the detector.
    pub fn from_entity_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => Some(Self::Person),
            "ORG" | "ORGANIZATION" => Some(Self::Organization),
            "GPE" | "LOC" | "LOCATION" | "FAC" => Some(Self::Location),
            _ => None,
        }
    }

    /// Returns true for categories produced by the entity recognizer.
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Person | Self::Organization | Self::Location)
    }

    /// Key used in [`PiiCounts`] and reports.
    pub fn key(&self) -> String {
        match self {
            Self::Person => "person".to_string(),
            Self::Organization => "organization".to_string(),
            Self::Location => "location".to_string(),
            Self::Email => "email".to_string(),
            Self::Phone => "phone".to_string(),
            Self::CreditCard => "credit_card".to_string(),
            Self::IpAddress => "ip_address".to_string(),
            Self::ApiKeyLike => "api_key_like".to_string(),
            Self::Keyword(name) => format!("{}{}", KEYWORD_PREFIX, name),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Prefix of keyword category keys.
pub const KEYWORD_PREFIX: &str = "keyword:";

/// A detected region of a document-level text blob.
///
/// `start` and `end` are byte offsets on UTF-8 character boundaries,
/// `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub source_text: String,
}

impl Span {
    pub fn new(start: usize, end: usize, category: Category, source_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            category,
            source_text: source_text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Occurrence counts per category for one document.
///
/// Counts only ever grow; a fresh instance is used per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PiiCounts(BTreeMap<String, usize>);

impl PiiCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` occurrences of `category`.
    pub fn add(&mut self, category: &Category, n: usize) {
        if n == 0 {
            return;
        }
        *self.0.entry(category.key()).or_insert(0) += n;
    }

    pub fn increment(&mut self, category: &Category) {
        self.add(category, 1);
    }

    /// Count for a category key such as `"email"` or `"keyword:ssn"`.
    pub fn get(&self, key: &str) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds another document's counts into this one.
    pub fn merge(&mut self, other: &PiiCounts) {
        for (key, n) in &other.0 {
            *self.0.entry(key.clone()).or_insert(0) += n;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keyword hits as `(keyword, count)` pairs.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, usize)> {
        self.iter()
            .filter_map(|(k, v)| k.strip_prefix(KEYWORD_PREFIX).map(|name| (name, v)))
    }
}

/// Trait for pattern matching strategies.
///
/// Matchers are applied twice: once by the detector to report spans, and once
/// by the redaction mapper as a global substitution pass.
pub trait PatternMatcher: Send + Sync {
    fn pattern(&self) -> &Regex;

    /// Category assigned to a match.
    fn category(&self, matched: &str) -> Category;

    /// Post-filter for candidates the regex alone cannot reject.
    fn accepts(&self, _candidate: &str) -> bool {
        true
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.pattern()
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|s| self.accepts(s))
            .collect()
    }

    fn find_spans(&self, text: &str) -> Vec<Span> {
        self.pattern()
            .find_iter(text)
            .filter(|m| self.accepts(m.as_str()))
            .map(|m| Span::new(m.start(), m.end(), self.category(m.as_str()), m.as_str()))
            .collect()
    }
}

/// Ordered collection of pattern matchers.
///
/// Order matters for the substitution pass: emails go first so their digits
/// are not claimed by the phone or card matchers, cards before phones so a
/// 16-digit run is not split into phone-shaped pieces.
pub struct PatternSet {
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl PatternSet {
    pub fn new(matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self { matchers }
    }

    /// Email, credit card, IPv4, phone, API key and keyword matchers.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(EmailMatcher::new()),
            Box::new(CreditCardMatcher::new()),
            Box::new(IpAddressMatcher::new()),
            Box::new(PhoneNumberMatcher::new()),
            Box::new(ApiKeyMatcher::new()),
            Box::new(SensitiveKeywordMatcher::new()),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PatternMatcher> {
        self.matchers.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_labels() {
        assert_eq!(Category::from_entity_label("PERSON"), Some(Category::Person));
        assert_eq!(Category::from_entity_label("org"), Some(Category::Organization));
        assert_eq!(Category::from_entity_label("GPE"), Some(Category::Location));
        assert_eq!(Category::from_entity_label("DATE"), None);
    }

    #[test]
    fn test_counts_keys() {
        let mut counts = PiiCounts::new();
        counts.increment(&Category::Email);
        counts.add(&Category::Keyword("ssn".to_string()), 2);
        counts.add(&Category::Phone, 0);

        assert_eq!(counts.get("email"), 1);
        assert_eq!(counts.get("keyword:ssn"), 2);
        assert_eq!(counts.get("phone"), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.keywords().collect::<Vec<_>>(), vec![("ssn", 2)]);
    }

    #[test]
    fn test_counts_serialize_as_object() {
        let mut counts = PiiCounts::new();
        counts.increment(&Category::Person);
        counts.increment(&Category::Email);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"email":1,"person":1}"#);
    }
}
