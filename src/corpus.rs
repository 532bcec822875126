//! Source documents and the merged corpus fed to the chunker.
//!
//! Every document is wrapped in deterministic banners and listed in a
//! leading manifest. Banner and manifest lines all start with `===` so the
//! extractor can strip them as structural noise.

use std::fs;
use std::path::Path;

/// Prefix shared by every structural line the corpus inserts.
pub const BANNER_PREFIX: &str = "===";

/// A single uploaded requirement document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Display name (usually the file name).
    pub name: String,
    /// Full text content.
    pub content: String,
}

impl RawDocument {
    /// Create a document from a name and content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a document from disk, using the file name as its name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self { name, content })
    }

    /// Size of the content in bytes.
    pub fn byte_size(&self) -> usize {
        self.content.len()
    }

    /// Whether the document has no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Line range occupied by one document's content inside the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRegion {
    /// Document name.
    pub name: String,
    /// 1-based ordinal of the document.
    pub ordinal: usize,
    /// First content line (0-based, inclusive).
    pub start_line: usize,
    /// One past the last content line (0-based, exclusive).
    pub end_line: usize,
}

/// All documents concatenated with banners and a manifest.
#[derive(Debug, Clone)]
pub struct MergedCorpus {
    /// The merged text.
    pub text: String,
    /// Content regions, one per document, in input order.
    pub regions: Vec<DocumentRegion>,
}

impl MergedCorpus {
    /// Merge documents in order.
    pub fn build(documents: &[RawDocument]) -> Self {
        let total = documents.len();
        let total_bytes: usize = documents.iter().map(RawDocument::byte_size).sum();

        let mut lines: Vec<String> = Vec::new();
        lines.push(format!(
            "{} MERGED CORPUS: {} documents, {} bytes {}",
            BANNER_PREFIX, total, total_bytes, BANNER_PREFIX
        ));
        for (i, doc) in documents.iter().enumerate() {
            lines.push(format!(
                "{} [{}/{}] {} ({} bytes) {}",
                BANNER_PREFIX,
                i + 1,
                total,
                doc.name,
                doc.byte_size(),
                BANNER_PREFIX
            ));
        }

        let mut regions = Vec::with_capacity(total);
        for (i, doc) in documents.iter().enumerate() {
            let ordinal = i + 1;
            lines.push(String::new());
            lines.push(format!(
                "{} BEGIN [{}/{}] {} ({} bytes) {}",
                BANNER_PREFIX,
                ordinal,
                total,
                doc.name,
                doc.byte_size(),
                BANNER_PREFIX
            ));
            let start_line = lines.len();
            lines.extend(doc.content.lines().map(str::to_string));
            let end_line = lines.len();
            lines.push(format!(
                "{} END [{}/{}] {} {}",
                BANNER_PREFIX, ordinal, total, doc.name, BANNER_PREFIX
            ));
            regions.push(DocumentRegion {
                name: doc.name.clone(),
                ordinal,
                start_line,
                end_line,
            });
        }

        Self {
            text: lines.join("\n"),
            regions,
        }
    }

    /// Name of the document a corpus line (0-based) came from, if any.
    pub fn source_of_line(&self, line: usize) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| line >= r.start_line && line < r.end_line)
            .map(|r| r.name.as_str())
    }

    /// Label naming the documents this corpus was built from.
    pub fn label(&self) -> String {
        corpus_label(self.regions.iter().map(|r| r.name.as_str()))
    }
}

/// Build a human-readable label from document names.
pub fn corpus_label<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    match names.len() {
        0 => "uploaded documents".to_string(),
        1 => names[0].to_string(),
        2 | 3 => names.join(", "),
        n => format!("{}, {} and {} more", names[0], names[1], n - 2),
    }
}

/// Whether a line is a structural banner or separator rather than content.
pub fn is_structural_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with(BANNER_PREFIX) {
        return true;
    }
    trimmed.len() >= 3
        && ['-', '=', '*', '_']
            .iter()
            .any(|&c| trimmed.chars().all(|ch| ch == c))
}
