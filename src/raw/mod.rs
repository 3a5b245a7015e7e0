/// Raw capture handling module
///
/// This module handles:
/// - Extracting and normalizing EXIF metadata from 3FR captures (metadata.rs)
/// - Patching the processed-flag marker in copied raw files (patcher.rs)
/// - Synthesizing placeholder preview JPEGs (placeholder.rs)

pub mod metadata;
pub mod patcher;
pub mod placeholder;

#[cfg(test)]
pub mod test_tiff {
    /// Minimal little-endian TIFF carrying one IFD0 entry with the given
    /// orientation code. Enough container for the tag reader to accept a
    /// synthetic capture in tests.
    pub fn tiff_with_orientation(code: u16) -> Vec<u8> {
        let mut bytes = vec![
            0x49, 0x49, 0x2A, 0x00, // "II", magic 42
            0x08, 0x00, 0x00, 0x00, // IFD0 at offset 8
            0x01, 0x00, // one entry
            0x12, 0x01, // tag 0x0112 Orientation
            0x03, 0x00, // SHORT
            0x01, 0x00, 0x00, 0x00, // count 1
        ];
        bytes.extend_from_slice(&code.to_le_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]); // value field padding
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // no next IFD
        bytes
    }
}
