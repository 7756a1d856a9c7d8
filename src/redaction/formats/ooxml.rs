//! Office Open XML packages (Word, PowerPoint, Excel).
//!
//! A package is a zip archive of XML parts. Fragments are the text of
//! "container" elements (paragraphs, shared strings) gathered from the
//! `t` elements beneath them. Rebuilding streams each touched part through
//! a reader/writer pair: a changed container gets its whole redacted text in
//! its first `t` element and its other `t` elements emptied; everything else
//! is written back event for event. Untouched parts are copied raw.
//!
//! Worksheets also yield their numeric cells (`<c>` without a `t` attribute,
//! or `t="n"`) as fragments. A redacted numeric cell is rewritten as an
//! inline string; its cached value and any formula are dropped.

use std::borrow::Cow;
use std::io::{Cursor, Read, Write};
use std::marker::PhantomData;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{RedactorError, RedactorResult};
use crate::redaction::mapper::RedactionMap;
use crate::redaction::output;
use crate::redaction::strategy::StructuredDocument;

/// Maximum decompressed bytes read from a single part (zip-bomb protection).
const MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

/// Local name of text-run elements (`w:t`, `a:t`, `t`).
const TEXT_ELEMENT: &[u8] = b"t";

const CELL_ELEMENT: &[u8] = b"c";
const VALUE_ELEMENT: &[u8] = b"v";

/// Describes which parts and elements of a package carry text.
pub trait OoxmlProfile: 'static {
    const FORMAT: &'static str;
    /// Part whose absence means the file is not this kind of package.
    const REQUIRED_PART: &'static str;
    /// Local names of elements whose text forms one fragment.
    const CONTAINERS: &'static [&'static [u8]];
    /// Whether rewritten runs need `xml:space="preserve"`.
    const PRESERVE_SPACE: bool;
    /// Whether numeric worksheet cells are fragments too.
    const VALUE_CELLS: bool = false;

    fn is_text_part(name: &str) -> bool;

    /// Sort key giving parts in reading order.
    fn part_order(name: &str) -> (u8, u32);
}

/// Trailing number of names like `ppt/slides/slide12.xml`.
fn part_number(name: &str) -> u32 {
    let stem = name.rsplit('/').next().unwrap_or(name);
    let stem = stem.strip_suffix(".xml").unwrap_or(stem);
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().unwrap_or(0)
}

pub struct Word;

impl OoxmlProfile for Word {
    const FORMAT: &'static str = "DOCX";
    const REQUIRED_PART: &'static str = "word/document.xml";
    const CONTAINERS: &'static [&'static [u8]] = &[b"p"];
    const PRESERVE_SPACE: bool = true;

    fn is_text_part(name: &str) -> bool {
        name == "word/document.xml"
            || name == "word/footnotes.xml"
            || name == "word/endnotes.xml"
            || name == "word/comments.xml"
            || ((name.starts_with("word/header") || name.starts_with("word/footer"))
                && name.ends_with(".xml"))
    }

    fn part_order(name: &str) -> (u8, u32) {
        let group = match name {
            "word/document.xml" => 0,
            n if n.starts_with("word/header") => 1,
            n if n.starts_with("word/footer") => 2,
            "word/footnotes.xml" => 3,
            "word/endnotes.xml" => 4,
            _ => 5,
        };
        (group, part_number(name))
    }
}

pub struct Presentation;

impl OoxmlProfile for Presentation {
    const FORMAT: &'static str = "PPTX";
    const REQUIRED_PART: &'static str = "ppt/presentation.xml";
    const CONTAINERS: &'static [&'static [u8]] = &[b"p"];
    const PRESERVE_SPACE: bool = false;

    fn is_text_part(name: &str) -> bool {
        name.ends_with(".xml")
            && (name.starts_with("ppt/slides/slide") || name.starts_with("ppt/notesSlides/notesSlide"))
    }

    fn part_order(name: &str) -> (u8, u32) {
        let group = if name.starts_with("ppt/slides/") { 0 } else { 1 };
        (group, part_number(name))
    }
}

pub struct Spreadsheet;

impl OoxmlProfile for Spreadsheet {
    const FORMAT: &'static str = "XLSX";
    const REQUIRED_PART: &'static str = "xl/workbook.xml";
    const CONTAINERS: &'static [&'static [u8]] = &[b"si", b"is"];
    const PRESERVE_SPACE: bool = false;
    const VALUE_CELLS: bool = true;

    fn is_text_part(name: &str) -> bool {
        name == "xl/sharedStrings.xml"
            || (name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml"))
    }

    fn part_order(name: &str) -> (u8, u32) {
        if name == "xl/sharedStrings.xml" {
            (0, 0)
        } else {
            (1, part_number(name))
        }
    }
}

pub type WordDocument = OoxmlDocument<Word>;
pub type PresentationDocument = OoxmlDocument<Presentation>;
pub type SpreadsheetDocument = OoxmlDocument<Spreadsheet>;

#[derive(Debug, Clone)]
struct XmlPart {
    name: String,
    xml: Vec<u8>,
    texts: Vec<String>,
    rewritten: Option<Vec<u8>>,
}

/// An OOXML package held in memory.
#[derive(Debug, Clone)]
pub struct OoxmlDocument<P> {
    package: Vec<u8>,
    parts: Vec<XmlPart>,
    _profile: PhantomData<fn() -> P>,
}

fn xml_error(format: &str, path: &Path, e: impl ToString) -> RedactorError {
    RedactorError::open(format, path, e)
}

fn is_container<P: OoxmlProfile>(local_name: &[u8]) -> bool {
    P::CONTAINERS.iter().any(|c| *c == local_name)
}

/// A worksheet cell holding a plain number.
fn is_value_cell<P: OoxmlProfile>(start: &BytesStart<'_>) -> bool {
    if !P::VALUE_CELLS || start.local_name().as_ref() != CELL_ELEMENT {
        return false;
    }
    match start.try_get_attribute("t") {
        Ok(Some(kind)) => kind.value.as_ref() == b"n",
        Ok(None) => true,
        Err(_) => false,
    }
}

impl<P: OoxmlProfile> OoxmlDocument<P> {
    /// Parses a package from its bytes.
    pub fn from_bytes(package: Vec<u8>, path: &Path) -> RedactorResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(package.as_slice()))
            .map_err(|e| xml_error(P::FORMAT, path, e))?;

        if archive.index_for_name(P::REQUIRED_PART).is_none() {
            return Err(xml_error(
                P::FORMAT,
                path,
                format!("{} not found", P::REQUIRED_PART),
            ));
        }

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| P::is_text_part(n))
            .map(str::to_string)
            .collect();
        names.sort_by(|a, b| P::part_order(a).cmp(&P::part_order(b)).then(a.cmp(b)));

        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let xml = read_part(&mut archive, &name).map_err(|e| xml_error(P::FORMAT, path, e))?;
            let texts = collect_containers::<P>(&xml)
                .map_err(|e| xml_error(P::FORMAT, path, format!("{}: {}", name, e)))?;
            parts.push(XmlPart {
                name,
                xml,
                texts,
                rewritten: None,
            });
        }

        Ok(Self {
            package,
            parts,
            _profile: PhantomData,
        })
    }

    /// Serializes the package, replacing rewritten parts.
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        let mut archive =
            ZipArchive::new(Cursor::new(self.package.as_slice())).map_err(|e| e.to_string())?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.package.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(|e| e.to_string())?;
            let replacement = self
                .parts
                .iter()
                .find(|p| p.name == entry.name())
                .and_then(|p| p.rewritten.as_ref());

            match replacement {
                Some(xml) => {
                    let name = entry.name().to_string();
                    drop(entry);
                    writer.start_file(name, options).map_err(|e| e.to_string())?;
                    writer.write_all(xml).map_err(|e| e.to_string())?;
                }
                None => writer.raw_copy_file(entry).map_err(|e| e.to_string())?,
            }
        }

        let cursor = writer.finish().map_err(|e| e.to_string())?;
        Ok(cursor.into_inner())
    }
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, String> {
    let entry = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    entry
        .take(MAX_PART_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 >= MAX_PART_BYTES {
        return Err(format!("{} exceeds size limit ({} bytes)", name, MAX_PART_BYTES));
    }
    Ok(out)
}

/// Text of every container element, in document order.
///
/// Nested containers (a text box paragraph inside a paragraph) own the text
/// beneath them; the outer one only gets its direct runs.
fn collect_containers<P: OoxmlProfile>(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut cell: Option<usize> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let local = e.local_name();
                if is_container::<P>(local.as_ref()) {
                    open.push(texts.len());
                    texts.push(String::new());
                } else if local.as_ref() == TEXT_ELEMENT && !open.is_empty() {
                    in_text = true;
                } else if open.is_empty() && is_value_cell::<P>(&e) {
                    cell = Some(texts.len());
                    texts.push(String::new());
                } else if local.as_ref() == VALUE_ELEMENT && cell.is_some() {
                    in_text = true;
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                if is_container::<P>(local.as_ref()) {
                    open.pop();
                } else if local.as_ref() == TEXT_ELEMENT || local.as_ref() == VALUE_ELEMENT {
                    in_text = false;
                } else if local.as_ref() == CELL_ELEMENT {
                    cell = None;
                }
            }
            Event::Text(t) if in_text => {
                if let Some(idx) = open.last().copied().or(cell) {
                    texts[idx].push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(c) if in_text => {
                if let Some(idx) = open.last().copied().or(cell) {
                    texts[idx].push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(texts)
}

struct OpenContainer {
    index: usize,
    runs: usize,
}

struct OpenRun<'r> {
    replacement: Option<&'r str>,
    first: bool,
    written: bool,
}

impl<'r> OpenRun<'r> {
    /// Text to emit for this run, if it is the carrier of a replacement
    /// that has not been written yet.
    fn take_pending(&mut self) -> Option<&'r str> {
        match self.replacement {
            Some(r) if self.first && !self.written => {
                self.written = true;
                Some(r)
            }
            _ => None,
        }
    }
}

/// Registers a text run in the innermost open container.
///
/// Returns whether it is the container's first run and the container's
/// replacement text, or `None` for runs outside any container.
fn begin_run<'r>(
    open: &mut [OpenContainer],
    replacements: &'r [Option<String>],
) -> Option<(bool, Option<&'r str>)> {
    let current = open.last_mut()?;
    let first = current.runs == 0;
    current.runs += 1;
    let replacement = replacements.get(current.index).and_then(|r| r.as_deref());
    Some((first, replacement))
}

fn preserve_space(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut owned = start.to_owned();
    let present = start
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space");
    if !present {
        owned.push_attribute(("xml:space", "preserve"));
    }
    owned
}

/// Start tag of `cell` retyped as an inline string cell.
fn inline_string_cell(cell: &BytesStart<'_>) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(cell.name().as_ref()).into_owned();
    let mut retyped = BytesStart::new(name);
    retyped.extend_attributes(cell.attributes().flatten().filter(|a| a.key.as_ref() != b"t"));
    retyped.push_attribute(("t", "inlineStr"));
    retyped
}

/// Re-serializes `xml`, writing `replacements[i]` into container `i`.
fn rewrite_containers<P: OoxmlProfile>(
    xml: &[u8],
    replacements: &[Option<String>],
) -> Result<Vec<u8>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut next_index = 0;
    let mut open: Vec<OpenContainer> = Vec::new();
    let mut run: Option<OpenRun<'_>> = None;
    // Depth inside a replaced cell whose original children are dropped.
    let mut skip = 0usize;

    macro_rules! emit {
        ($event:expr) => {
            writer.write_event($event).map_err(|e| e.to_string())?
        };
    }

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| e.to_string())?;
        if skip > 0 {
            match event {
                Event::Start(_) => skip += 1,
                Event::End(e) => {
                    skip -= 1;
                    if skip == 0 {
                        emit!(Event::End(e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Start(e) if open.is_empty() && is_value_cell::<P>(&e) => {
                let index = next_index;
                next_index += 1;
                match replacements.get(index).and_then(|r| r.as_deref()) {
                    Some(text) => {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        let prefix = name
                            .rsplit_once(':')
                            .map(|(p, _)| format!("{}:", p))
                            .unwrap_or_default();
                        emit!(Event::Start(inline_string_cell(&e)));
                        emit!(Event::Start(BytesStart::new(format!("{}is", prefix))));
                        emit!(Event::Start(BytesStart::new(format!("{}t", prefix))));
                        emit!(Event::Text(BytesText::new(text)));
                        emit!(Event::End(BytesEnd::new(format!("{}t", prefix))));
                        emit!(Event::End(BytesEnd::new(format!("{}is", prefix))));
                        skip = 1;
                    }
                    None => emit!(Event::Start(e)),
                }
            }
            Event::Start(e) if is_container::<P>(e.local_name().as_ref()) => {
                open.push(OpenContainer {
                    index: next_index,
                    runs: 0,
                });
                next_index += 1;
                emit!(Event::Start(e));
            }
            Event::End(e) if is_container::<P>(e.local_name().as_ref()) => {
                open.pop();
                emit!(Event::End(e));
            }
            Event::Start(e) if e.local_name().as_ref() == TEXT_ELEMENT => {
                match begin_run(&mut open, replacements) {
                    Some((first, replacement)) => {
                        if replacement.is_some() && first && P::PRESERVE_SPACE {
                            emit!(Event::Start(preserve_space(&e)));
                        } else {
                            emit!(Event::Start(e));
                        }
                        run = Some(OpenRun {
                            replacement,
                            first,
                            written: false,
                        });
                    }
                    None => emit!(Event::Start(e)),
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == TEXT_ELEMENT => {
                match begin_run(&mut open, replacements) {
                    Some((true, Some(text))) => {
                        let start = if P::PRESERVE_SPACE {
                            preserve_space(&e)
                        } else {
                            e.to_owned()
                        };
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        emit!(Event::Start(start));
                        emit!(Event::Text(BytesText::new(text)));
                        emit!(Event::End(BytesEnd::new(Cow::Owned(name))));
                    }
                    _ => emit!(Event::Empty(e)),
                }
            }
            Event::Text(t) => match run.as_mut() {
                Some(current) if current.replacement.is_some() => {
                    if let Some(text) = current.take_pending() {
                        emit!(Event::Text(BytesText::new(text)));
                    }
                }
                _ => emit!(Event::Text(t)),
            },
            Event::CData(c) => match run.as_mut() {
                Some(current) if current.replacement.is_some() => {
                    if let Some(text) = current.take_pending() {
                        emit!(Event::Text(BytesText::new(text)));
                    }
                }
                _ => emit!(Event::CData(c)),
            },
            Event::End(e) if e.local_name().as_ref() == TEXT_ELEMENT => {
                if let Some(mut current) = run.take() {
                    if let Some(text) = current.take_pending() {
                        emit!(Event::Text(BytesText::new(text)));
                    }
                }
                emit!(Event::End(e));
            }
            Event::Eof => break,
            other => emit!(other),
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

impl<P: OoxmlProfile> StructuredDocument for OoxmlDocument<P> {
    const FORMAT: &'static str = P::FORMAT;

    fn open(path: &Path) -> RedactorResult<Self> {
        let package = output::read_input(path)?;
        Self::from_bytes(package, path)
    }

    fn fragments(&self) -> Vec<String> {
        self.parts
            .iter()
            .flat_map(|p| p.texts.iter().cloned())
            .collect()
    }

    fn rebuild(&mut self, map: &RedactionMap) -> RedactorResult<usize> {
        let mut rewritten = 0;
        for part in &mut self.parts {
            let replacements: Vec<Option<String>> = part
                .texts
                .iter()
                .map(|t| map.replacement(t).map(str::to_string))
                .collect();
            let changed = replacements.iter().filter(|r| r.is_some()).count();
            if changed == 0 {
                continue;
            }

            let xml = rewrite_containers::<P>(&part.xml, &replacements).map_err(|e| {
                RedactorError::save(P::FORMAT, part.name.as_str(), e)
            })?;
            part.rewritten = Some(xml);
            rewritten += changed;
        }
        Ok(rewritten)
    }

    fn save(&self, path: &Path) -> RedactorResult<()> {
        let bytes = self
            .to_bytes()
            .map_err(|e| RedactorError::save(P::FORMAT, path, e))?;
        std::fs::write(path, bytes).map_err(|e| RedactorError::io(path, e))
    }
}
