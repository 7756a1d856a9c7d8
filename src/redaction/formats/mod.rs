//! One redactor per container family.

pub mod csv;
pub mod image;
pub mod ooxml;
pub mod passthrough;
pub mod pdf;
pub mod text;

pub use self::csv::{CsvStrategy, CsvTable};
pub use self::image::ImageStrategy;
pub use self::ooxml::{PresentationDocument, SpreadsheetDocument, WordDocument};
pub use self::passthrough::PassthroughStrategy;
pub use self::pdf::PdfStrategy;
pub use self::text::PlainTextDocument;
