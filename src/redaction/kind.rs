//! Closed set of supported file kinds, dispatched by extension.

use std::path::Path;

use super::formats::{
    CsvStrategy, ImageStrategy, PassthroughStrategy, PdfStrategy, PlainTextDocument,
    PresentationDocument, SpreadsheetDocument, WordDocument,
};
use super::strategy::{RedactionStrategy, StructuredStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    PlainText,
    Word,
    Presentation,
    Spreadsheet,
    Csv,
    Pdf,
    Image,
    /// Anything else: copied verbatim with a Low finding
    Unsupported,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "md" | "log" => Self::PlainText,
            "docx" => Self::Word,
            "pptx" => Self::Presentation,
            "xlsx" => Self::Spreadsheet,
            "csv" => Self::Csv,
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" => Self::Image,
            _ => Self::Unsupported,
        }
    }

    /// Report label: the upper-cased extension, `UNKNOWN` without one.
    pub fn label(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_ascii_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    pub fn is_supported(&self) -> bool {
        *self != Self::Unsupported
    }

    /// The redactor for this kind.
    pub fn strategy(&self) -> Box<dyn RedactionStrategy> {
        match self {
            Self::PlainText => Box::new(StructuredStrategy::<PlainTextDocument>::new("PlainText")),
            Self::Word => Box::new(StructuredStrategy::<WordDocument>::new("Word")),
            Self::Presentation => {
                Box::new(StructuredStrategy::<PresentationDocument>::new("Presentation"))
            }
            Self::Spreadsheet => {
                Box::new(StructuredStrategy::<SpreadsheetDocument>::new("Spreadsheet"))
            }
            Self::Csv => Box::new(CsvStrategy::new()),
            Self::Pdf => Box::new(PdfStrategy::new()),
            Self::Image => Box::new(ImageStrategy::new()),
            Self::Unsupported => Box::new(PassthroughStrategy::new()),
        }
    }

    /// Default one-line description used when no summarizer is configured.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PlainText => "Plain text document.",
            Self::Word => "Word processing document.",
            Self::Presentation => "Slide presentation.",
            Self::Spreadsheet => "Spreadsheet workbook.",
            Self::Csv => "Tabular data log or record sheet.",
            Self::Pdf => "Paginated PDF document.",
            Self::Image => "Raster image.",
            Self::Unsupported => "Unsupported file type; copied without redaction.",
        }
    }
}
