//! Severity-tagged findings derived from a redaction outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Category;
use crate::redaction::RedactionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Info => "Info",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityFinding {
    pub description: String,
    pub severity: Severity,
}

impl VulnerabilityFinding {
    pub fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
        }
    }

    pub fn low(description: impl Into<String>) -> Self {
        Self::new(description, Severity::Low)
    }

    pub fn medium(description: impl Into<String>) -> Self {
        Self::new(description, Severity::Medium)
    }

    pub fn high(description: impl Into<String>) -> Self {
        Self::new(description, Severity::High)
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::new(description, Severity::Info)
    }
}

/// Count-driven rules, in reporting order.
const COUNT_RULES: &[(Category, Severity, &str)] = &[
    (Category::Person, Severity::High, "Personal names detected"),
    (Category::Organization, Severity::Medium, "Organization names detected"),
    (Category::Location, Severity::Low, "Locations detected"),
    (Category::Email, Severity::High, "Email addresses detected"),
    (Category::Phone, Severity::Medium, "Phone numbers detected"),
    (Category::CreditCard, Severity::High, "Payment card numbers detected"),
    (Category::IpAddress, Severity::Medium, "IP addresses detected"),
    (Category::ApiKeyLike, Severity::High, "API key-like tokens detected"),
];

/// Maps the evidence of one document to findings.
///
/// Order: entity and pattern counts, keywords (one per distinct keyword),
/// OCR redactions, recognizer failures, other collaborator failures, then
/// format-specific findings. Repeated failure messages are reported once.
pub fn classify(outcome: &RedactionOutcome) -> Vec<VulnerabilityFinding> {
    let mut findings = Vec::new();
    let counts = &outcome.counts;

    for (category, severity, label) in COUNT_RULES {
        let n = counts.get(&category.key());
        if n > 0 {
            findings.push(VulnerabilityFinding::new(format!("{} ({})", label, n), *severity));
        }
    }

    for (keyword, n) in counts.keywords() {
        findings.push(VulnerabilityFinding::high(format!(
            "Sensitive keyword '{}' found ({})",
            keyword, n
        )));
    }

    if outcome.ocr_redactions > 0 {
        findings.push(VulnerabilityFinding::medium(format!(
            "Sensitive content found in image and redacted ({} region(s))",
            outcome.ocr_redactions
        )));
    }

    let mut seen: Vec<&str> = Vec::new();
    for failure in outcome
        .detector_failures
        .iter()
        .chain(outcome.collaborator_failures.iter())
    {
        if !seen.contains(&failure.as_str()) {
            seen.push(failure);
            findings.push(VulnerabilityFinding::high(failure.clone()));
        }
    }

    findings.extend(outcome.findings.iter().cloned());
    findings
}
