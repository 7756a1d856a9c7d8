//! Custom assertions for redaction testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use std::path::Path;

use pii_redactor::domain::{EmailMatcher, PatternMatcher, PhoneNumberMatcher};
use pii_redactor::{FileResult, FileStatus, Severity};

/// Asserts that no email or phone pattern survives in `text`.
pub fn assert_no_contact_details(text: &str) {
    let emails = EmailMatcher::new().extract_all(text);
    let phones = PhoneNumberMatcher::new().extract_all(text);
    assert!(
        emails.is_empty() && phones.is_empty(),
        "Residual contact details in redacted text: emails {:?}, phones {:?}\n{}",
        emails,
        phones,
        text
    );
}

/// Asserts that two files are byte-for-byte identical.
pub fn assert_identical_files(left: &Path, right: &Path) {
    let a = std::fs::read(left).expect("read left file");
    let b = std::fs::read(right).expect("read right file");
    assert!(
        a == b,
        "Files differ: '{}' ({} bytes) vs '{}' ({} bytes)",
        left.display(),
        a.len(),
        right.display(),
        b.len()
    );
}

/// Asserts a result completed with at least `min_high` High findings.
pub fn assert_completed_with_high(result: &FileResult, min_high: usize) {
    assert_eq!(
        result.status,
        FileStatus::Completed,
        "Expected '{}' to complete: {:?}",
        result.original_file_name,
        result.vulnerabilities
    );
    let high = result.count_severity(Severity::High);
    assert!(
        high >= min_high,
        "Expected at least {} High finding(s) for '{}', got {}: {:?}",
        min_high,
        result.original_file_name,
        high,
        result.vulnerabilities
    );
}

/// Asserts that `text` does not contain `needle`.
pub fn assert_redacted(text: &str, needle: &str) {
    assert!(
        !text.contains(needle),
        "'{}' should be redacted but was found in:\n{}",
        needle,
        text
    );
}
