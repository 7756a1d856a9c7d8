//! Engine settings shared by every structural redactor.

use crate::domain::Category;

/// CSV headers whose columns are redacted in full.
pub const DEFAULT_PII_COLUMNS: &[&str] = &[
    "Reg.no",
    "Name",
    "Email ID",
    "Employee Full Name",
    "Employee ID",
    "Verified By (RA Name)",
    "Authorized By (Supervisor)",
    "Supervisor Email",
];

/// Minimum OCR confidence (0-100) for a word to be considered.
pub const DEFAULT_OCR_MIN_CONFIDENCE: f32 = 60.0;

/// Blur strength for face regions.
pub const DEFAULT_FACE_BLUR_SIGMA: f32 = 8.0;

/// Characters of document text sent to the summarizer.
pub const DEFAULT_SUMMARY_PREFIX_CHARS: usize = 15_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RedactionSettings {
    /// Recognizer categories that get redacted.
    pub entity_categories: Vec<Category>,
    pub ocr_min_confidence: f32,
    /// Extra pixels painted around each OCR word box.
    pub paint_padding: u32,
    /// Gaussian sigma used to blur detected faces.
    pub face_blur_sigma: f32,
    pub pii_columns: Vec<String>,
    /// Whether the first CSV row is a header row.
    pub csv_has_headers: bool,
    /// Maximum search hits per needle per PDF page.
    pub pdf_max_hits: u32,
    pub summary_prefix_chars: usize,
}

impl RedactionSettings {
    pub fn with_locations(mut self) -> Self {
        if !self.entity_categories.contains(&Category::Location) {
            self.entity_categories.push(Category::Location);
        }
        self
    }

    /// Treats every CSV row as data.
    pub fn without_csv_headers(mut self) -> Self {
        self.csv_has_headers = false;
        self
    }

    pub fn with_ocr_min_confidence(mut self, confidence: f32) -> Self {
        self.ocr_min_confidence = confidence;
        self
    }

    /// Case-insensitive match against the configured PII column headers.
    pub fn is_pii_column(&self, header: &str) -> bool {
        let header = header.trim();
        self.pii_columns
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(header))
    }
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            entity_categories: vec![Category::Person, Category::Organization],
            ocr_min_confidence: DEFAULT_OCR_MIN_CONFIDENCE,
            paint_padding: 2,
            face_blur_sigma: DEFAULT_FACE_BLUR_SIGMA,
            pii_columns: DEFAULT_PII_COLUMNS.iter().map(|s| s.to_string()).collect(),
            csv_has_headers: true,
            pdf_max_hits: 100,
            summary_prefix_chars: DEFAULT_SUMMARY_PREFIX_CHARS,
        }
    }
}
