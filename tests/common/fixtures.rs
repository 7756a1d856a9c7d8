//! Test fixtures and document builders.
//!
//! Provides builders for creating minimal but valid documents of every
//! supported kind, following the Builder pattern for clean test setup.

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{Rgb, RgbImage};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_package(path: &Path, parts: &[(String, String)]) -> Result<PathBuf> {
    let mut zip = ZipWriter::new(fs::File::create(path)?);
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish()?;
    Ok(path.to_path_buf())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

/// Writes a Word document with one paragraph per entry.
pub fn write_docx(path: &Path, paragraphs: &[&str]) -> Result<PathBuf> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(p)))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    write_package(
        path,
        &[
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("word/document.xml".to_string(), document),
        ],
    )
}

/// Writes a presentation; each slide holds one paragraph per entry.
pub fn write_pptx(path: &Path, slides: &[&[&str]]) -> Result<PathBuf> {
    let mut parts = vec![
        ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
        (
            "ppt/presentation.xml".to_string(),
            r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#
                .to_string(),
        ),
    ];
    for (i, paragraphs) in slides.iter().enumerate() {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(p)))
            .collect();
        let slide = format!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            body
        );
        parts.push((format!("ppt/slides/slide{}.xml", i + 1), slide));
    }
    write_package(path, &parts)
}

fn workbook_parts(strings: &[&str]) -> Vec<(String, String)> {
    let items: String = strings
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", escape(s)))
        .collect();
    let shared = format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
        strings.len(),
        items
    );
    vec![
        ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
        (
            "xl/workbook.xml".to_string(),
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"/>"#
                .to_string(),
        ),
        ("xl/sharedStrings.xml".to_string(), shared),
    ]
}

/// Writes a workbook whose shared string table holds `strings`.
pub fn write_xlsx(path: &Path, strings: &[&str]) -> Result<PathBuf> {
    write_package(path, &workbook_parts(strings))
}

/// Writes a workbook with one sheet: row `i` holds shared string `i` in
/// column A and `numbers[i]` as a numeric cell in column B.
pub fn write_xlsx_with_numbers(path: &Path, strings: &[&str], numbers: &[&str]) -> Result<PathBuf> {
    let rows: String = numbers
        .iter()
        .enumerate()
        .map(|(i, n)| {
            format!(
                r#"<row r="{0}"><c r="A{0}" t="s"><v>{1}</v></c><c r="B{0}"><v>{2}</v></c></row>"#,
                i + 1,
                i,
                n
            )
        })
        .collect();
    let sheet = format!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows
    );
    let mut parts = workbook_parts(strings);
    parts.push(("xl/worksheets/sheet1.xml".to_string(), sheet));
    write_package(path, &parts)
}

/// Reads one part of a zip package as text.
pub fn read_part(path: &Path, name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(fs::File::open(path)?)?;
    let mut part = archive.by_name(name)?;
    let mut out = String::new();
    part.read_to_string(&mut out)?;
    Ok(out)
}

/// Writes a white RGB image.
pub fn write_white_png(path: &Path, width: u32, height: u32) -> Result<PathBuf> {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255])).save(path)?;
    Ok(path.to_path_buf())
}

/// Builder for creating test PDFs, one text line per entry.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    lines: Vec<String>,
    blank_pages: usize,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            lines: Vec::new(),
            blank_pages: 0,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Appends pages without any text.
    pub fn with_blank_pages(mut self, count: usize) -> Self {
        self.blank_pages = count;
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, Mm(210.0), Mm(297.0), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        layer.use_text(&self.title, 14.0, Mm(20.0), Mm(270.0), &font);
        for (i, line) in self.lines.iter().enumerate() {
            let y = 255.0 - 10.0 * i as f32;
            layer.use_text(line, 12.0, Mm(20.0), Mm(y), &font);
        }
        for _ in 0..self.blank_pages {
            doc.add_page(Mm(210.0), Mm(297.0), "Blank");
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
