//! Paginated documents, redacted with MuPDF.
//!
//! Detected surface forms are searched in each page's glyph layout and
//! covered with redaction annotations that are then applied, which removes
//! the underlying content rather than drawing over it.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::Rect as MuRect;
use tracing::{debug, warn};

use crate::domain::Span;
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::output;
use crate::redaction::strategy::{RedactionOutcome, RedactionStrategy};
use crate::redaction::RedactionContext;

const FORMAT: &str = "PDF";

/// Shortest entity word searched on its own.
const MIN_NEEDLE_CHARS: usize = 2;

/// MuPDF contexts are not shared safely across threads; every document
/// operation holds this lock.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

fn mupdf_lock() -> MutexGuard<'static, ()> {
    MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn path_str<'a>(path: &'a Path, parameter: &str) -> RedactorResult<&'a str> {
    path.to_str().ok_or_else(|| RedactorError::InvalidInput {
        parameter: parameter.to_string(),
        reason: "Path contains invalid UTF-8".to_string(),
    })
}

/// Strings to search for on each page.
///
/// Entity mentions are split into words so a name broken across lines is
/// still found; pattern matches are searched whole.
pub fn search_needles(spans: &[Span]) -> Vec<String> {
    let mut needles: Vec<String> = Vec::new();
    let mut push = |needle: &str| {
        let needle = needle.trim();
        if needle.chars().count() >= MIN_NEEDLE_CHARS && !needles.iter().any(|n| n == needle) {
            needles.push(needle.to_string());
        }
    };

    for span in spans {
        if span.category.is_entity() {
            span.source_text.split_whitespace().for_each(&mut push);
        } else {
            push(&span.source_text);
        }
    }
    needles
}

/// Per-page presence of extractable text, by zero-based page index.
///
/// A page lopdf cannot read is treated as having text so it is still searched.
fn pages_with_text(bytes: &[u8]) -> Option<Vec<bool>> {
    let doc = lopdf::Document::load_mem(bytes).ok()?;
    Some(
        doc.get_pages()
            .keys()
            .map(|&number| {
                doc.extract_text(&[number])
                    .map(|text| !text.trim().is_empty())
                    .unwrap_or(true)
            })
            .collect(),
    )
}

/// Document text for detection: pdf-extract first, lopdf as a fallback.
fn extract_text(bytes: &[u8], path: &Path) -> RedactorResult<String> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => Ok(text),
        Err(primary) => {
            debug!(error = %primary, "pdf-extract failed; falling back to lopdf");
            let doc = lopdf::Document::load_mem(bytes)
                .map_err(|e| RedactorError::open(FORMAT, path, e))?;
            let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
            doc.extract_text(&pages)
                .map_err(|e| RedactorError::open(FORMAT, path, e))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PageStats {
    processed: usize,
    modified: usize,
    hits: usize,
}

/// Secure PDF redaction that physically removes matched glyphs.
#[derive(Debug, Clone)]
pub struct PdfStrategy {
    /// Maximum search hits per needle per page
    max_hits: Option<u32>,
}

impl PdfStrategy {
    pub fn new() -> Self {
        Self { max_hits: None }
    }

    /// Overrides the per-needle hit limit from the settings.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = Some(max_hits);
        self
    }

    fn apply_mupdf_redactions(
        &self,
        pdf_doc: &PdfDocument,
        needles: &[String],
        text_pages: Option<&[bool]>,
        max_hits: u32,
    ) -> RedactorResult<PageStats> {
        let page_count = pdf_doc
            .page_count()
            .map_err(|e| RedactorError::BackendError {
                backend: "MuPDF".to_string(),
                message: format!("Failed to get page count: {}", e),
                source: Some(Box::new(e)),
            })?;

        let mut stats = PageStats::default();

        for page_idx in 0..page_count {
            let page_number = page_idx as usize + 1;
            let has_text = text_pages
                .and_then(|pages| pages.get(page_idx as usize).copied())
                .unwrap_or(true);
            if !has_text {
                debug!(page = page_number, "no extractable text; page skipped");
                continue;
            }

            let page = pdf_doc
                .load_page(page_idx)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: format!("Failed to load page {}", page_number),
                    page: Some(page_number),
                    source: Some(Box::new(e)),
                })?;

            let mut pdf_page = match PdfPage::try_from(page.clone()) {
                Ok(p) => p,
                Err(_) => continue,
            };
            stats.processed += 1;

            let mut page_redactions = 0;
            for needle in needles {
                let hits = match page.search(needle, max_hits) {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(page = page_number, error = %e, "search failed; needle skipped");
                        continue;
                    }
                };

                for quad in hits {
                    let annot = pdf_page
                        .create_annotation(PdfAnnotationType::Redact)
                        .map_err(|e| RedactorError::PdfProcessing {
                            message: "Failed to create redaction annotation".to_string(),
                            page: Some(page_number),
                            source: Some(Box::new(e)),
                        })?;

                    let rect = MuRect {
                        x0: quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
                        y0: quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
                        x1: quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
                        y1: quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
                    };

                    unsafe {
                        ffi::set_annotation_rect(&annot, rect);
                    }
                    page_redactions += 1;
                }
            }

            if page_redactions > 0 {
                pdf_page
                    .redact()
                    .map_err(|e| RedactorError::PdfProcessing {
                        message: format!("Failed to apply redactions on page {}", page_number),
                        page: Some(page_number),
                        source: Some(Box::new(e)),
                    })?;
                stats.hits += page_redactions;
                stats.modified += 1;
            }
        }

        Ok(stats)
    }
}

impl Default for PdfStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionStrategy for PdfStrategy {
    fn redact(
        &self,
        ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome> {
        let bytes = output::read_input(input)?;
        let text = extract_text(&bytes, input)?;
        let redaction = ctx.engine.redact_text(&text);
        let needles = search_needles(&redaction.spans);

        let mut outcome = RedactionOutcome {
            counts: redaction.counts,
            detector_failures: redaction.detector_failure.into_iter().collect(),
            text: redaction.redacted,
            ..Default::default()
        };

        let input_str = path_str(input, "input")?;
        let max_hits = self.max_hits.unwrap_or(ctx.settings.pdf_max_hits);
        let text_pages = pages_with_text(&bytes);

        let _guard = mupdf_lock();
        let pdf_doc = PdfDocument::open(input_str).map_err(|e| RedactorError::open(FORMAT, input, e))?;
        let page_count = pdf_doc.page_count().unwrap_or(0).max(0) as usize;

        let stats = if needles.is_empty() {
            PageStats::default()
        } else {
            self.apply_mupdf_redactions(&pdf_doc, &needles, text_pages.as_deref(), max_hits)?
        };

        if stats.hits > 0 {
            output::write_atomically(output, |tmp| {
                let tmp_str = path_str(tmp, "output")?;
                pdf_doc
                    .save(tmp_str)
                    .map_err(|e| RedactorError::save(FORMAT, output, e))
            })?;
        } else {
            output::copy_verbatim(input, output)?;
        }
        debug!(
            needles = needles.len(),
            hits = stats.hits,
            pages_modified = stats.modified,
            "pdf redacted"
        );

        outcome.fragments_rewritten = stats.hits;
        outcome.pages_processed = stats.processed;
        outcome.pages_modified = stats.modified;
        outcome.description = Some(format!("PDF document with {} page(s)", page_count));
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "SecurePdfRedaction"
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be valid and the caller must hold the MuPDF lock.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
