//! Byte layouts of the Windows clipboard formats ClipBank reads and writes.
//!
//! These are plain functions over byte slices so they can be tested on any
//! platform; the Win32 adapter only moves the bytes in and out of global
//! memory.
//!
//! - **CF_HTML** ("HTML Format") – UTF-8 text with an ASCII header giving
//!   byte offsets of the HTML document and of the copied fragment.
//! - **CF_HDROP** – a 20-byte `DROPFILES` header followed by NUL-separated
//!   paths, terminated by an empty string.
//! - **CF_DIB** – a `BITMAPINFOHEADER` (or the old 12-byte
//!   `BITMAPCOREHEADER`) followed by the pixels.  Only the dimensions are
//!   read here.

use std::path::PathBuf;

const FRAGMENT_PREFIX: &str = "<html><body>\r\n<!--StartFragment-->";
const FRAGMENT_SUFFIX: &str = "<!--EndFragment-->\r\n</body></html>";
const START_MARKER: &str = "<!--StartFragment-->";
const END_MARKER: &str = "<!--EndFragment-->";

/// Size of `DROPFILES`: pFiles, pt.x, pt.y, fNC, fWide.
const DROPFILES_LEN: usize = 20;

// ── CF_HTML ───────────────────────────────────────────────────────────────────

/// Wraps an HTML fragment in a CF_HTML document with a correct header.
pub fn encode_cf_html(fragment: &str) -> String {
    // All offsets are zero-padded to 10 digits, so the header length is fixed.
    let header_len = cf_html_header(0, 0, 0, 0).len();
    let start_html = header_len;
    let start_fragment = start_html + FRAGMENT_PREFIX.len();
    let end_fragment = start_fragment + fragment.len();
    let end_html = end_fragment + FRAGMENT_SUFFIX.len();
    format!(
        "{}{FRAGMENT_PREFIX}{fragment}{FRAGMENT_SUFFIX}",
        cf_html_header(start_html, end_html, start_fragment, end_fragment)
    )
}

/// Extracts the copied fragment from a CF_HTML document.
///
/// Uses the header offsets when they are valid, otherwise the
/// `<!--StartFragment-->` / `<!--EndFragment-->` comments.
pub fn decode_cf_html(raw: &str) -> Option<String> {
    let by_offsets = header_offset(raw, "StartFragment:")
        .zip(header_offset(raw, "EndFragment:"))
        .filter(|&(start, end)| start <= end && end <= raw.len())
        .map(|(start, end)| String::from_utf8_lossy(&raw.as_bytes()[start..end]).into_owned());
    if by_offsets.is_some() {
        return by_offsets;
    }

    let start = raw.find(START_MARKER)? + START_MARKER.len();
    let end = start + raw[start..].find(END_MARKER)?;
    Some(raw[start..end].to_string())
}

fn cf_html_header(start_html: usize, end_html: usize, start_fragment: usize, end_fragment: usize) -> String {
    format!(
        "Version:0.9\r\nStartHTML:{start_html:010}\r\nEndHTML:{end_html:010}\r\n\
         StartFragment:{start_fragment:010}\r\nEndFragment:{end_fragment:010}\r\n"
    )
}

fn header_offset(raw: &str, key: &str) -> Option<usize> {
    raw.lines()
        .take_while(|line| !line.starts_with('<'))
        .find_map(|line| line.strip_prefix(key))
        .and_then(|value| value.trim().parse().ok())
}

// ── CF_HDROP ──────────────────────────────────────────────────────────────────

/// Builds a wide-character `DROPFILES` block for `paths`.
pub fn encode_hdrop(paths: &[PathBuf]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(DROPFILES_LEN + paths.len() * 64);
    bytes.extend_from_slice(&(DROPFILES_LEN as u32).to_le_bytes()); // pFiles
    bytes.extend_from_slice(&0i32.to_le_bytes()); // pt.x
    bytes.extend_from_slice(&0i32.to_le_bytes()); // pt.y
    bytes.extend_from_slice(&0u32.to_le_bytes()); // fNC
    bytes.extend_from_slice(&1u32.to_le_bytes()); // fWide

    for path in paths {
        for unit in path.to_string_lossy().encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes
}

/// Reads the paths out of a `DROPFILES` block (wide or ANSI).
pub fn decode_hdrop(bytes: &[u8]) -> Result<Vec<PathBuf>, String> {
    if bytes.len() < DROPFILES_LEN {
        return Err(format!("DROPFILES too short: {} bytes", bytes.len()));
    }
    let offset = read_u32(bytes, 0) as usize;
    let wide = read_u32(bytes, 16) != 0;
    let body = bytes
        .get(offset..)
        .ok_or_else(|| format!("DROPFILES offset {offset} out of bounds"))?;

    let names: Vec<String> = if wide {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        units
            .split(|&u| u == 0)
            .take_while(|name| !name.is_empty())
            .map(String::from_utf16_lossy)
            .collect()
    } else {
        body.split(|&b| b == 0)
            .take_while(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect()
    };
    Ok(names.into_iter().map(PathBuf::from).collect())
}

// ── CF_DIB ────────────────────────────────────────────────────────────────────

/// Width and height from a DIB header.  Top-down bitmaps store a negative height.
pub fn dib_dimensions(dib: &[u8]) -> Option<(u32, u32)> {
    if dib.len() < 12 {
        return None;
    }
    let header_size = read_u32(dib, 0);
    if header_size == 12 {
        // BITMAPCOREHEADER: 16-bit unsigned dimensions
        let width = u16::from_le_bytes([dib[4], dib[5]]);
        let height = u16::from_le_bytes([dib[6], dib[7]]);
        return Some((u32::from(width), u32::from(height)));
    }
    if header_size < 40 || dib.len() < 40 {
        return None;
    }
    let width = read_u32(dib, 4) as i32;
    let height = read_u32(dib, 8) as i32;
    Some((width.unsigned_abs(), height.unsigned_abs()))
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cf_html_offsets_point_at_fragment() {
        // Arrange
        let fragment = "<b>héllo</b>";

        // Act
        let doc = encode_cf_html(fragment);

        // Assert
        let start = header_offset(&doc, "StartFragment:").unwrap();
        let end = header_offset(&doc, "EndFragment:").unwrap();
        assert_eq!(&doc.as_bytes()[start..end], fragment.as_bytes());
        assert_eq!(header_offset(&doc, "EndHTML:"), Some(doc.len()));
        assert_eq!(decode_cf_html(&doc).as_deref(), Some(fragment));
    }

    #[test]
    fn test_decode_cf_html_falls_back_to_markers() {
        let raw = "Version:0.9\r\nStartFragment:-1\r\n<html><!--StartFragment--><i>x</i><!--EndFragment--></html>";
        assert_eq!(decode_cf_html(raw).as_deref(), Some("<i>x</i>"));
    }

    #[test]
    fn test_decode_cf_html_without_fragment_is_none() {
        assert_eq!(decode_cf_html("<p>no markers</p>"), None);
    }

    #[test]
    fn test_hdrop_encodes_and_decodes_paths_in_order() {
        let paths = vec![PathBuf::from("C:\\a b.txt"), PathBuf::from("D:\\ünï.png")];
        let bytes = encode_hdrop(&paths);
        assert_eq!(read_u32(&bytes, 0), 20);
        assert_eq!(decode_hdrop(&bytes).unwrap(), paths);
    }

    #[test]
    fn test_hdrop_decodes_ansi_lists() {
        // Arrange – fWide = 0
        let mut bytes = vec![0u8; DROPFILES_LEN];
        bytes[0] = 20;
        bytes.extend_from_slice(b"C:\\x.txt\0C:\\y.txt\0\0");

        // Act / Assert
        assert_eq!(
            decode_hdrop(&bytes).unwrap(),
            vec![PathBuf::from("C:\\x.txt"), PathBuf::from("C:\\y.txt")]
        );
    }

    #[test]
    fn test_hdrop_rejects_truncated_header() {
        assert!(decode_hdrop(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_dib_dimensions_handles_top_down_bitmaps() {
        let mut dib = vec![0u8; 40];
        dib[0] = 40;
        dib[4..8].copy_from_slice(&640i32.to_le_bytes());
        dib[8..12].copy_from_slice(&(-480i32).to_le_bytes());
        assert_eq!(dib_dimensions(&dib), Some((640, 480)));
    }

    #[test]
    fn test_dib_dimensions_reads_core_header() {
        let mut dib = vec![0u8; 12];
        dib[0] = 12;
        dib[4..6].copy_from_slice(&32u16.to_le_bytes());
        dib[6..8].copy_from_slice(&16u16.to_le_bytes());
        assert_eq!(dib_dimensions(&dib), Some((32, 16)));
    }

    #[test]
    fn test_dib_dimensions_rejects_short_input() {
        assert_eq!(dib_dimensions(&[40, 0, 0]), None);
    }
}
