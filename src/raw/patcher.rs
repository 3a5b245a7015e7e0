//! In-place header patch for copied 3FR files
//!
//! Phocus flags a capture as imported/processed through a 12-byte marker in
//! the TIFF header. The copy gets that marker rewritten; the original file
//! is never touched.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Marker as written by the camera.
pub const PROCESSED_MARKER_SEARCH: [u8; 12] = [
    0x12, 0x00, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00,
];

/// Same marker with the flag byte bumped 0x40 -> 0x42.
pub const PROCESSED_MARKER_REPLACE: [u8; 12] = [
    0x12, 0x00, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x42, 0x00, 0x00, 0x00,
];

/// The marker sits in the header; nothing past this is scanned. Identical
/// byte runs deeper in the file must stay untouched.
pub const HEADER_SCAN_BYTES: usize = 4096;

/// Replace the first occurrence of `search` with `replace` within the first
/// `max_scan_bytes` of the file, rewriting only the modified prefix.
///
/// Returns the match offset, or `None` when nothing was patched. Unequal or
/// empty patterns are a no-op, not an error. A marker that is absent from
/// the scan window leaves the file byte-identical.
pub fn patch_header_in_place(
    path: &Path,
    search: &[u8],
    replace: &[u8],
    max_scan_bytes: usize,
) -> std::io::Result<Option<usize>> {
    if search.len() != replace.len() || search.is_empty() {
        return Ok(None);
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;

    let mut head = vec![0u8; max_scan_bytes];
    let mut filled = 0;
    while filled < max_scan_bytes {
        let n = file.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);

    if head.len() < search.len() {
        return Ok(None);
    }

    match head.windows(search.len()).position(|window| window == search) {
        Some(offset) => {
            head[offset..offset + replace.len()].copy_from_slice(replace);
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&head)?;
            Ok(Some(offset))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy.3FR");
        fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn patches_first_match_and_reports_offset() {
        let mut bytes = vec![0u8; 50];
        bytes.extend_from_slice(&PROCESSED_MARKER_SEARCH);
        bytes.extend_from_slice(&[0xAA; 100]);
        let (_dir, path) = write_file(&bytes);

        let offset = patch_header_in_place(
            &path,
            &PROCESSED_MARKER_SEARCH,
            &PROCESSED_MARKER_REPLACE,
            HEADER_SCAN_BYTES,
        )
        .unwrap();
        assert_eq!(offset, Some(50));

        let patched = fs::read(&path).unwrap();
        assert_eq!(&patched[50..62], &PROCESSED_MARKER_REPLACE);
        assert_eq!(&patched[..50], &bytes[..50]);
        assert_eq!(&patched[62..], &bytes[62..]);
    }

    #[test]
    fn only_the_first_occurrence_changes() {
        let mut bytes = vec![0u8; 10];
        bytes.extend_from_slice(&PROCESSED_MARKER_SEARCH);
        bytes.extend_from_slice(&[0u8; 10]);
        bytes.extend_from_slice(&PROCESSED_MARKER_SEARCH);
        let (_dir, path) = write_file(&bytes);

        let offset = patch_header_in_place(
            &path,
            &PROCESSED_MARKER_SEARCH,
            &PROCESSED_MARKER_REPLACE,
            HEADER_SCAN_BYTES,
        )
        .unwrap();
        assert_eq!(offset, Some(10));

        let patched = fs::read(&path).unwrap();
        assert_eq!(&patched[10..22], &PROCESSED_MARKER_REPLACE);
        assert_eq!(&patched[32..44], &PROCESSED_MARKER_SEARCH);
    }

    #[test]
    fn missing_marker_leaves_file_untouched() {
        let bytes = vec![0x55u8; 4096];
        let (_dir, path) = write_file(&bytes);

        let offset = patch_header_in_place(
            &path,
            &PROCESSED_MARKER_SEARCH,
            &PROCESSED_MARKER_REPLACE,
            HEADER_SCAN_BYTES,
        )
        .unwrap();
        assert_eq!(offset, None);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn marker_outside_scan_window_is_not_found() {
        let mut bytes = vec![0u8; 5000];
        bytes[5000 - 12..].copy_from_slice(&PROCESSED_MARKER_SEARCH);
        let (_dir, path) = write_file(&bytes);

        let offset = patch_header_in_place(
            &path,
            &PROCESSED_MARKER_SEARCH,
            &PROCESSED_MARKER_REPLACE,
            HEADER_SCAN_BYTES,
        )
        .unwrap();
        assert_eq!(offset, None);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn mismatched_pattern_lengths_are_a_no_op() {
        let mut bytes = vec![0u8; 20];
        bytes.extend_from_slice(&PROCESSED_MARKER_SEARCH);
        let (_dir, path) = write_file(&bytes);

        let offset =
            patch_header_in_place(&path, &PROCESSED_MARKER_SEARCH, &[0x42], HEADER_SCAN_BYTES)
                .unwrap();
        assert_eq!(offset, None);

        let offset = patch_header_in_place(&path, &[], &[], HEADER_SCAN_BYTES).unwrap();
        assert_eq!(offset, None);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }
}
