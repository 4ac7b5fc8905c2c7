//! Clipboard content detection.
//!
//! The clipboard usually offers the same copy in several formats at once
//! (a browser selection is HTML *and* plain text).  Detection picks the
//! richest one with a fixed-priority chain:
//!
//! ```text
//!   FileList  >  Image  >  Html  >  RichText  >  Text
//! ```
//!
//! Each [`Detector`] inspects the clipboard through a [`ClipboardReader`] and
//! answers with a typed [`Detection`]: a match, no match, or a deferral to
//! another detector.  The only deferral today is a file list whose files are
//! all images: chat clients put a temp-file drop *and* a bitmap on the
//! clipboard, and the bitmap pastes into more applications.  Deferral is best
//! effort; if the image detector then finds nothing, the file list is kept.

use std::path::Path;

use clipbank_core::{ClipboardContent, ContentKind};
use tracing::{debug, trace};

use super::clipboard_bridge::{ClipboardError, ClipboardReader};

/// Extensions treated as images by the file-list deferral.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// One content detector of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    FileList,
    Image,
    Html,
    RichText,
    Text,
}

/// All detectors in descending priority.
pub const DETECTOR_CHAIN: [Detector; 5] = [
    Detector::FileList,
    Detector::Image,
    Detector::Html,
    Detector::RichText,
    Detector::Text,
];

/// Result of running one detector.
#[derive(Debug)]
pub enum Detection {
    Match(ClipboardContent),
    NoMatch,
    /// Let `to` decide; use `fallback` if it finds nothing.
    Defer {
        to: Detector,
        fallback: ClipboardContent,
    },
}

impl Detector {
    /// The content kind this detector produces.
    pub fn kind(self) -> ContentKind {
        match self {
            Detector::FileList => ContentKind::FileList,
            Detector::Image => ContentKind::Image,
            Detector::Html => ContentKind::Html,
            Detector::RichText => ContentKind::RichText,
            Detector::Text => ContentKind::Text,
        }
    }

    /// Inspects the clipboard for this detector's format.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if reading the clipboard failed.
    pub fn detect(self, reader: &dyn ClipboardReader) -> Result<Detection, ClipboardError> {
        let detection = match self {
            Detector::FileList => match reader.file_list()? {
                Some(paths) if !paths.is_empty() => {
                    let all_images = paths.iter().all(|p| is_image_path(p));
                    let content = ClipboardContent::file_list(paths);
                    if all_images {
                        Detection::Defer {
                            to: Detector::Image,
                            fallback: content,
                        }
                    } else {
                        Detection::Match(content)
                    }
                }
                _ => Detection::NoMatch,
            },
            Detector::Image => match reader.image()? {
                Some(img) if !img.dib.is_empty() => {
                    Detection::Match(ClipboardContent::image(img.width, img.height, img.dib))
                }
                _ => Detection::NoMatch,
            },
            Detector::Html => match reader.html()? {
                Some(html) if !html.is_empty() => {
                    Detection::Match(ClipboardContent::html(html, plain_fallback(reader)))
                }
                _ => Detection::NoMatch,
            },
            Detector::RichText => match reader.rtf()? {
                Some(rtf) if !rtf.is_empty() => {
                    Detection::Match(ClipboardContent::rich_text(rtf, plain_fallback(reader)))
                }
                _ => Detection::NoMatch,
            },
            Detector::Text => match reader.text()? {
                Some(text) if !text.is_empty() => Detection::Match(ClipboardContent::text(text)),
                _ => Detection::NoMatch,
            },
        };
        Ok(detection)
    }
}

/// Runs the chain and returns the first detected content.
///
/// Returns [`ClipboardContent::empty`] when no detector matches.  A
/// malformed payload in one format only skips that detector.
///
/// # Errors
///
/// Returns [`ClipboardError`] for failures other than [`ClipboardError::Format`].
pub fn detect_content(reader: &dyn ClipboardReader) -> Result<ClipboardContent, ClipboardError> {
    for detector in DETECTOR_CHAIN {
        match run(detector, reader)? {
            Detection::Match(content) => {
                trace!(kind = %content.kind(), "detected");
                return Ok(content);
            }
            Detection::NoMatch => {}
            Detection::Defer { to, fallback } => {
                if let Detection::Match(content) = run(to, reader)? {
                    return Ok(content);
                }
                debug!(from = ?detector, to = ?to, "deferral found nothing; keeping original");
                return Ok(fallback);
            }
        }
    }
    debug!("no detector matched");
    Ok(ClipboardContent::empty())
}

fn run(detector: Detector, reader: &dyn ClipboardReader) -> Result<Detection, ClipboardError> {
    match detector.detect(reader) {
        Err(ClipboardError::Format(reason)) => {
            debug!(?detector, %reason, "malformed clipboard payload skipped");
            Ok(Detection::NoMatch)
        }
        other => other,
    }
}

fn plain_fallback(reader: &dyn ClipboardReader) -> Option<String> {
    reader.text().ok().flatten().filter(|t| !t.is_empty())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|img| e.eq_ignore_ascii_case(img)))
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clipbank_core::ImageData;

    use super::*;

    /// Clipboard stand-in holding one value per format.
    #[derive(Default)]
    struct FakeReader {
        files: Option<Vec<PathBuf>>,
        image: Option<ImageData>,
        html: Option<String>,
        rtf: Option<Vec<u8>>,
        text: Option<String>,
        malformed_image: bool,
    }

    impl ClipboardReader for FakeReader {
        fn file_list(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
            Ok(self.files.clone())
        }
        fn image(&self) -> Result<Option<ImageData>, ClipboardError> {
            if self.malformed_image {
                return Err(ClipboardError::Format("truncated DIB".into()));
            }
            Ok(self.image.clone())
        }
        fn html(&self) -> Result<Option<String>, ClipboardError> {
            Ok(self.html.clone())
        }
        fn rtf(&self) -> Result<Option<Vec<u8>>, ClipboardError> {
            Ok(self.rtf.clone())
        }
        fn text(&self) -> Result<Option<String>, ClipboardError> {
            Ok(self.text.clone())
        }
    }

    fn bitmap() -> ImageData {
        ImageData {
            width: 2,
            height: 2,
            dib: vec![0xFF; 56],
        }
    }

    #[test]
    fn test_plain_text_only_is_text() {
        let reader = FakeReader {
            text: Some("hello".into()),
            ..FakeReader::default()
        };
        let content = detect_content(&reader).unwrap();
        assert_eq!(content, ClipboardContent::text("hello"));
    }

    #[test]
    fn test_html_beats_text_and_keeps_plain_fallback() {
        // Arrange – a browser selection
        let reader = FakeReader {
            html: Some("<b>hi</b>".into()),
            text: Some("hi".into()),
            ..FakeReader::default()
        };

        // Act
        let content = detect_content(&reader).unwrap();

        // Assert
        assert_eq!(content.kind(), ContentKind::Html);
        assert_eq!(content.plain_text().as_deref(), Some("hi"));
    }

    #[test]
    fn test_html_beats_rich_text() {
        let reader = FakeReader {
            html: Some("<i>x</i>".into()),
            rtf: Some(b"{\\rtf1 x}".to_vec()),
            ..FakeReader::default()
        };
        assert_eq!(detect_content(&reader).unwrap().kind(), ContentKind::Html);
    }

    #[test]
    fn test_image_beats_html() {
        let reader = FakeReader {
            image: Some(bitmap()),
            html: Some("<img>".into()),
            ..FakeReader::default()
        };
        assert_eq!(detect_content(&reader).unwrap().kind(), ContentKind::Image);
    }

    #[test]
    fn test_mixed_file_list_is_kept_even_with_bitmap_present() {
        let reader = FakeReader {
            files: Some(vec!["C:\\a.png".into(), "C:\\notes.txt".into()]),
            image: Some(bitmap()),
            ..FakeReader::default()
        };
        assert_eq!(detect_content(&reader).unwrap().kind(), ContentKind::FileList);
    }

    #[test]
    fn test_all_image_file_list_defers_to_bitmap() {
        // Arrange – chat client: temp-file drop plus the bitmap itself
        let reader = FakeReader {
            files: Some(vec!["C:\\Temp\\paste.PNG".into()]),
            image: Some(bitmap()),
            ..FakeReader::default()
        };

        // Act
        let content = detect_content(&reader).unwrap();

        // Assert
        assert_eq!(content.kind(), ContentKind::Image);
    }

    #[test]
    fn test_all_image_file_list_without_bitmap_falls_back_to_files() {
        let reader = FakeReader {
            files: Some(vec!["a.jpg".into(), "b.gif".into()]),
            ..FakeReader::default()
        };
        assert_eq!(detect_content(&reader).unwrap().kind(), ContentKind::FileList);
    }

    #[test]
    fn test_malformed_image_is_skipped_for_next_detector() {
        let reader = FakeReader {
            malformed_image: true,
            text: Some("still here".into()),
            ..FakeReader::default()
        };
        assert_eq!(detect_content(&reader).unwrap(), ClipboardContent::text("still here"));
    }

    #[test]
    fn test_nothing_recognised_is_empty() {
        let reader = FakeReader {
            text: Some(String::new()),
            ..FakeReader::default()
        };
        assert!(detect_content(&reader).unwrap().is_empty());
    }

    #[test]
    fn test_chain_order_matches_kinds() {
        let kinds: Vec<ContentKind> = DETECTOR_CHAIN.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ContentKind::FileList,
                ContentKind::Image,
                ContentKind::Html,
                ContentKind::RichText,
                ContentKind::Text
            ]
        );
    }
}
