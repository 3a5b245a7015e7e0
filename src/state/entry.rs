//! Catalog record construction
//!
//! Builds the immutable photo-index row for one import before anything is
//! persisted. Everything here is pure data transformation; the store and
//! the duplicate-id policy live with the callers.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Extension literal baked into every derived image id.
const ID_EXTENSION_TAG: &str = "3FR";

/// Fixed suffix of the synthetic camera-index identifier.
const CAMERA_INDEX_SUFFIX: &str = "f9617ffbebb1cb5b434bf12a4628f081927HASBL";

/// Vendor capture-time format ("YYYY:MM:DD HH:MM:SS").
const VENDOR_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// One row of the host's photo index.
///
/// Built once per import and never mutated afterwards. Fields that stay
/// `None` are deliberately unpopulated; the host treats them as absent.
/// `adjustment_data` is different: it is a present, zero-length blob.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoIndexRecord {
    pub image_id: String,
    pub device_name: Option<String>,
    pub image_name: String,
    pub thumbnail_jpeg: Option<String>,
    pub media_type: i64,
    pub middle_jpeg: Option<String>,
    pub full_jpeg: Option<String>,
    pub raw_file: Option<String>,
    pub heif_file: Option<String>,
    pub shot: Option<String>,
    pub date_time_digitized_str: Option<String>,
    pub date_time_original_str: String,
    pub date_time_original_desc: String,
    pub exif_data: Vec<u8>,
    pub date_time_digitized: Option<DateTime<Utc>>,
    pub date_time_original: DateTime<Utc>,
    pub rely_raw_file: Option<String>,
    pub adjustment_data: Vec<u8>,
    pub is_adjusted: bool,
    pub is_like: bool,
    pub is_ai_denoised: bool,
    pub ai_denoise_type: i64,
    pub color_mark: Option<String>,
    pub storage_type: i64,
    pub local_identify: Option<String>,
    pub camera_index_uuid: Option<String>,
    pub camera_serial_number: Option<String>,
    pub rating: i64,
    pub date_time_offset: Option<String>,
    pub date_time_original_legacy: Option<DateTime<Utc>>,
}

/// Unique key of a record: `<base name>3FR<unix timestamp>`.
///
/// Deterministic; collisions on a repeated base name + timestamp pair are
/// the caller's duplicate policy to handle.
pub fn derive_image_id(base_name: &str, timestamp: i64) -> String {
    format!("{base_name}{ID_EXTENSION_TAG}{timestamp}")
}

pub fn raw_file_name(image_id: &str) -> String {
    format!("{image_id}.3FR")
}

pub fn thumbnail_file_name(image_id: &str) -> String {
    format!("Thumbnail_{image_id}.jpg")
}

pub fn middle_file_name(image_id: &str) -> String {
    format!("Middle_{image_id}.jpg")
}

/// Interpret the vendor capture string as UTC wall-clock.
///
/// The capture's UTC offset is stored in its own column and is deliberately
/// not applied here; the host keeps the instant unadjusted.
pub fn parse_vendor_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, VENDOR_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// "YYYY:MM:DD HH:MM:SS" -> "YYYY:MM:DD" (the whole string when shorter).
pub fn date_only_desc(s: &str) -> String {
    s.chars().take(10).collect()
}

/// Synthetic camera-index id: first 8 characters of the base name plus a
/// fixed suffix.
pub fn camera_index_uuid(base_name: &str) -> String {
    let prefix: String = base_name.chars().take(8).collect();
    format!("{prefix}{CAMERA_INDEX_SUFFIX}")
}

/// Assemble the record for one import.
///
/// An unparseable or empty capture string falls back to the current time;
/// that is expected for captures without EXIF, not an error.
pub fn build_record(
    base_name: &str,
    timestamp: i64,
    exif_data: Vec<u8>,
    device_name: &str,
    date_time_original_str: &str,
    offset: &str,
) -> PhotoIndexRecord {
    let image_id = derive_image_id(base_name, timestamp);

    PhotoIndexRecord {
        device_name: none_if_empty(device_name),
        image_name: base_name.to_string(),
        thumbnail_jpeg: Some(thumbnail_file_name(&image_id)),
        media_type: 0,
        middle_jpeg: Some(middle_file_name(&image_id)),
        full_jpeg: None,
        raw_file: Some(raw_file_name(&image_id)),
        heif_file: None,
        shot: None,
        date_time_digitized_str: None,
        date_time_original_str: date_time_original_str.to_string(),
        date_time_original_desc: date_only_desc(date_time_original_str),
        exif_data,
        date_time_digitized: None,
        date_time_original: parse_vendor_datetime(date_time_original_str)
            .unwrap_or_else(Utc::now),
        rely_raw_file: None,
        adjustment_data: Vec::new(),
        is_adjusted: false,
        is_like: false,
        is_ai_denoised: false,
        ai_denoise_type: 0,
        color_mark: Some("0".to_string()),
        storage_type: 1,
        local_identify: None,
        camera_index_uuid: Some(camera_index_uuid(base_name)),
        camera_serial_number: None,
        rating: 0,
        date_time_offset: none_if_empty(offset),
        date_time_original_legacy: None,
        image_id,
    }
}

fn none_if_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn image_id_derivation() {
        assert_eq!(
            derive_image_id("IMG_0001", 1700000000),
            "IMG_00013FR1700000000"
        );
    }

    #[test]
    fn companion_file_names() {
        let id = derive_image_id("IMG_0001", 1700000000);
        assert_eq!(raw_file_name(&id), "IMG_00013FR1700000000.3FR");
        assert_eq!(thumbnail_file_name(&id), "Thumbnail_IMG_00013FR1700000000.jpg");
        assert_eq!(middle_file_name(&id), "Middle_IMG_00013FR1700000000.jpg");
    }

    #[test]
    fn vendor_datetime_is_read_as_utc() {
        let parsed = parse_vendor_datetime("2025:12:07 13:55:50").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 12, 7, 13, 55, 50).unwrap();
        assert_eq!(parsed, expected);

        assert_eq!(parse_vendor_datetime(""), None);
        assert_eq!(parse_vendor_datetime("yesterday-ish"), None);
    }

    #[test]
    fn date_only_descriptor() {
        assert_eq!(date_only_desc("2025:12:07 13:55:50"), "2025:12:07");
        assert_eq!(date_only_desc("2025:12"), "2025:12");
        assert_eq!(date_only_desc(""), "");
    }

    #[test]
    fn camera_index_id_uses_first_eight_characters() {
        assert_eq!(
            camera_index_uuid("IMG_00012345"),
            format!("IMG_0001{CAMERA_INDEX_SUFFIX}")
        );
        assert_eq!(
            camera_index_uuid("A7"),
            format!("A7{CAMERA_INDEX_SUFFIX}")
        );
    }

    #[test]
    fn record_defaults_and_derived_fields() {
        let record = build_record(
            "IMG_0001",
            1700000000,
            b"{}".to_vec(),
            "X2D 100C",
            "2025:12:07 13:55:50",
            "+08:00",
        );

        assert_eq!(record.image_id, "IMG_00013FR1700000000");
        assert_eq!(record.image_name, "IMG_0001");
        assert_eq!(record.device_name.as_deref(), Some("X2D 100C"));
        assert_eq!(
            record.thumbnail_jpeg.as_deref(),
            Some("Thumbnail_IMG_00013FR1700000000.jpg")
        );
        assert_eq!(
            record.middle_jpeg.as_deref(),
            Some("Middle_IMG_00013FR1700000000.jpg")
        );
        assert_eq!(record.raw_file.as_deref(), Some("IMG_00013FR1700000000.3FR"));
        assert_eq!(record.date_time_original_desc, "2025:12:07");
        assert_eq!(
            record.date_time_original,
            Utc.with_ymd_and_hms(2025, 12, 7, 13, 55, 50).unwrap()
        );
        assert_eq!(record.date_time_offset.as_deref(), Some("+08:00"));

        // Deliberately absent or fixed-default host fields.
        assert!(record.adjustment_data.is_empty());
        assert_eq!(record.full_jpeg, None);
        assert_eq!(record.heif_file, None);
        assert_eq!(record.camera_serial_number, None);
        assert_eq!(record.date_time_original_legacy, None);
        assert_eq!(record.color_mark.as_deref(), Some("0"));
        assert_eq!(record.storage_type, 1);
        assert_eq!(record.media_type, 0);
        assert_eq!(record.rating, 0);
        assert!(!record.is_adjusted);
        assert!(!record.is_like);
        assert!(!record.is_ai_denoised);
    }

    #[test]
    fn empty_capture_string_falls_back_to_now() {
        let before = Utc::now();
        let record = build_record("IMG_0002", 1700000001, Vec::new(), "", "", "");
        let after = Utc::now();

        assert_eq!(record.device_name, None);
        assert_eq!(record.date_time_offset, None);
        assert_eq!(record.date_time_original_desc, "");
        assert!(record.date_time_original >= before && record.date_time_original <= after);
    }
}
