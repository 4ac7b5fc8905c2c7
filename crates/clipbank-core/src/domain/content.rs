//! Clipboard content: a typed payload plus a cached content-equality hash.
//!
//! # Why a hash instead of comparing payloads? (for beginners)
//!
//! Duplicate suppression runs on every promotion.  Comparing two 8 MB
//! bitmaps byte-by-byte each time would be wasteful, so every non-empty
//! content computes a 64-bit xxh3 hash of its payload exactly once, when it
//! is constructed.  Two contents are considered *the same* iff their
//! [`ContentKind`] tags and hashes match.  The kind is part of the identity:
//! a `Text("abc")` and an `Html("abc")` are never equal.
//!
//! Payloads are immutable after construction; the only way to change a
//! payload is to build a new [`ClipboardContent`], which recomputes the hash.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use twox_hash::xxh3::hash64;

/// The type tag of a clipboard content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Empty,
    Text,
    RichText,
    Html,
    Image,
    FileList,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Empty => "empty",
            ContentKind::Text => "text",
            ContentKind::RichText => "rich-text",
            ContentKind::Html => "html",
            ContentKind::Image => "image",
            ContentKind::FileList => "file-list",
        };
        f.write_str(name)
    }
}

/// 64-bit xxh3 hash of a payload's canonical byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub u64);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A bitmap as a device-independent bitmap blob.
///
/// The engine treats `dib` as opaque bytes; encoding and decoding live with
/// the platform clipboard adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub dib: Vec<u8>,
}

/// The raw payload of a clipboard content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Empty,
    Text(String),
    RichText {
        rtf: Vec<u8>,
        plain: Option<String>,
    },
    Html {
        html: String,
        plain: Option<String>,
    },
    Image(ImageData),
    FileList(Vec<PathBuf>),
}

impl Payload {
    fn kind(&self) -> ContentKind {
        match self {
            Payload::Empty => ContentKind::Empty,
            Payload::Text(_) => ContentKind::Text,
            Payload::RichText { .. } => ContentKind::RichText,
            Payload::Html { .. } => ContentKind::Html,
            Payload::Image(_) => ContentKind::Image,
            Payload::FileList(_) => ContentKind::FileList,
        }
    }

    fn compute_hash(&self) -> Option<ContentHash> {
        let h = match self {
            Payload::Empty => return None,
            Payload::Text(text) => hash64(text.as_bytes()),
            Payload::RichText { rtf, .. } => hash64(rtf),
            Payload::Html { html, .. } => hash64(html.as_bytes()),
            Payload::Image(img) => {
                // Hash the pixels once, then fold in the dimensions.
                let pixels = hash64(&img.dib);
                let mut header = Vec::with_capacity(16);
                header.extend_from_slice(&img.width.to_le_bytes());
                header.extend_from_slice(&img.height.to_le_bytes());
                header.extend_from_slice(&pixels.to_le_bytes());
                hash64(&header)
            }
            Payload::FileList(paths) => {
                let mut joined = Vec::new();
                for p in paths {
                    joined.extend_from_slice(p.to_string_lossy().as_bytes());
                    joined.push(0);
                }
                hash64(&joined)
            }
        };
        Some(ContentHash(h))
    }
}

/// A captured clipboard content with its cached hash.
///
/// Serialises as its [`Payload`]; the hash is recomputed on deserialisation
/// so a persisted hash can never go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Payload", into = "Payload")]
pub struct ClipboardContent {
    payload: Payload,
    hash: Option<ContentHash>,
}

impl From<Payload> for ClipboardContent {
    fn from(payload: Payload) -> Self {
        let hash = payload.compute_hash();
        Self { payload, hash }
    }
}

impl From<ClipboardContent> for Payload {
    fn from(content: ClipboardContent) -> Self {
        content.payload
    }
}

impl Default for ClipboardContent {
    fn default() -> Self {
        Self::empty()
    }
}

/// Content equality is kind + hash, never the raw payload.
impl PartialEq for ClipboardContent {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.hash == other.hash
    }
}

impl Eq for ClipboardContent {}

impl ClipboardContent {
    /// The empty content.
    pub fn empty() -> Self {
        Payload::Empty.into()
    }

    /// Plain Unicode text.
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text(text.into()).into()
    }

    /// RTF bytes with an optional plain-text fallback.
    pub fn rich_text(rtf: Vec<u8>, plain: Option<String>) -> Self {
        Payload::RichText { rtf, plain }.into()
    }

    /// An HTML fragment with an optional plain-text fallback.
    pub fn html(html: impl Into<String>, plain: Option<String>) -> Self {
        Payload::Html {
            html: html.into(),
            plain,
        }
        .into()
    }

    /// A bitmap.
    pub fn image(width: u32, height: u32, dib: Vec<u8>) -> Self {
        Payload::Image(ImageData { width, height, dib }).into()
    }

    /// An ordered list of file paths.
    pub fn file_list(paths: Vec<PathBuf>) -> Self {
        Payload::FileList(paths).into()
    }

    /// The type tag.
    pub fn kind(&self) -> ContentKind {
        self.payload.kind()
    }

    /// The raw payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The cached content hash; `None` only for [`ContentKind::Empty`].
    pub fn hash(&self) -> Option<ContentHash> {
        self.hash
    }

    /// Returns `true` for the empty content.
    pub fn is_empty(&self) -> bool {
        matches!(self.payload, Payload::Empty)
    }

    /// Returns `true` if `self` and `other` are the same content
    /// (same kind and same hash).  Empty never matches anything.
    pub fn same_content(&self, other: &ClipboardContent) -> bool {
        !self.is_empty() && self == other
    }

    /// Plain-text rendition, where one exists.
    ///
    /// Text returns itself, RichText/Html their fallback, FileList the paths
    /// one per line.  Images and Empty have none.
    pub fn plain_text(&self) -> Option<String> {
        match &self.payload {
            Payload::Empty | Payload::Image(_) => None,
            Payload::Text(text) => Some(text.clone()),
            Payload::RichText { plain, .. } | Payload::Html { plain, .. } => plain.clone(),
            Payload::FileList(paths) => Some(
                paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }

    /// Size of the raw payload in bytes.
    pub fn byte_len(&self) -> usize {
        match &self.payload {
            Payload::Empty => 0,
            Payload::Text(text) => text.len(),
            Payload::RichText { rtf, .. } => rtf.len(),
            Payload::Html { html, .. } => html.len(),
            Payload::Image(img) => img.dib.len(),
            Payload::FileList(paths) => paths.iter().map(|p| p.as_os_str().len()).sum(),
        }
    }

    /// A short single-line description for menus and tooltips.
    pub fn preview(&self, max_chars: usize) -> String {
        match &self.payload {
            Payload::Empty => String::new(),
            Payload::Image(img) => format!("[image {}x{}]", img.width, img.height),
            Payload::FileList(paths) => match paths.first() {
                Some(first) if paths.len() == 1 => truncate_line(&first.to_string_lossy(), max_chars),
                Some(first) => format!(
                    "[{} files] {}",
                    paths.len(),
                    truncate_line(&first.to_string_lossy(), max_chars)
                ),
                None => "[0 files]".to_string(),
            },
            _ => truncate_line(&self.plain_text().unwrap_or_default(), max_chars),
        }
    }
}

/// First non-blank line of `s`, cut at `max_chars` characters with an ellipsis.
fn truncate_line(s: &str, max_chars: usize) -> String {
    let line = s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
