//! Output layout and all-or-nothing file writes.
//!
//! Every artifact is produced in a temporary file next to its destination
//! and renamed into place, so a failed write never leaves a partial file.

use std::fs;
use std::path::{Path, PathBuf};

use super::kind::FileKind;
use crate::error::{RedactorError, RedactorResult};

/// Directory for redacted documents.
pub const CLEANSED_DIR: &str = "cleansed_files";
/// Directory for redacted images.
pub const REDACTED_IMAGES_DIR: &str = "redacted_images";
/// Prefix added to every output file name.
pub const OUTPUT_PREFIX: &str = "cleansed_";

/// Where outputs for a batch land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join(CLEANSED_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(REDACTED_IMAGES_DIR)
    }

    /// Creates both output directories.
    pub fn prepare(&self) -> RedactorResult<()> {
        for dir in [self.documents_dir(), self.images_dir()] {
            fs::create_dir_all(&dir).map_err(|e| RedactorError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Output path for an input file name, derived only from that name.
    pub fn cleansed_path(&self, kind: FileKind, file_name: &str) -> PathBuf {
        let dir = if kind == FileKind::Image {
            self.images_dir()
        } else {
            self.documents_dir()
        };
        dir.join(format!("{}{}", OUTPUT_PREFIX, file_name))
    }

    /// Path of the redacted OCR transcript for an image.
    pub fn ocr_transcript_path(&self, file_name: &str) -> PathBuf {
        self.documents_dir()
            .join(format!("{}{}_ocr.txt", OUTPUT_PREFIX, file_name))
    }
}

/// Runs `write` against a temporary path and renames the result to `output`.
pub fn write_atomically<F>(output: &Path, write: F) -> RedactorResult<()>
where
    F: FnOnce(&Path) -> RedactorResult<()>,
{
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let scratch = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .map_err(|e| RedactorError::io(dir, e))?;

    write(scratch.path())?;

    scratch
        .persist(output)
        .map_err(|e| RedactorError::io(output, e.error))?;
    Ok(())
}

/// Copies `input` byte for byte to `output`.
pub fn copy_verbatim(input: &Path, output: &Path) -> RedactorResult<()> {
    write_atomically(output, |tmp| {
        fs::copy(input, tmp)
            .map(|_| ())
            .map_err(|e| RedactorError::io(input, e))
    })
}

/// Writes `bytes` to `output`.
pub fn write_bytes(output: &Path, bytes: &[u8]) -> RedactorResult<()> {
    write_atomically(output, |tmp| {
        fs::write(tmp, bytes).map_err(|e| RedactorError::io(tmp, e))
    })
}

/// Reads a whole input file.
pub fn read_input(input: &Path) -> RedactorResult<Vec<u8>> {
    fs::read(input).map_err(|e| RedactorError::io(input, e))
}
