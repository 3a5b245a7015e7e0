//! EXIF extraction and normalization from 3FR captures
//!
//! A 3FR is a TIFF container, so the standard tag reader handles it. Every
//! field is pulled through an explicit fallback chain and rendered into the
//! string forms the host catalog stores.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use exif::{Context, Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Windows XP star-rating tag in IFD0; the tag reader has no name for it.
const RATING_TAG: Tag = Tag(Context::Tiff, 0x4746);

/// How much of the file the loose XMP rating scan reads.
const XMP_SCAN_BYTES: usize = 64 * 1024;

/// The metadata blob stored verbatim in the catalog record.
///
/// Key spelling and field order are the host application's contract: the
/// encoded bytes are kept and re-read by Phocus, so the serialization must
/// stay exactly as declared here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExifSummary {
    #[serde(rename = "Shot")]
    pub shot: String,
    #[serde(rename = "Device")]
    pub device: String,
    #[serde(rename = "Dimensions")]
    pub dimensions: String,
    #[serde(rename = "DateTimeOriginal")]
    pub date_time_original: String,
    #[serde(rename = "ApertureValue")]
    pub aperture_value: String,
    #[serde(rename = "OffsetTimeOriginal")]
    pub offset_time_original: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "ShutterSpeedValue")]
    pub shutter_speed_value: String,
    #[serde(rename = "ISO")]
    pub iso: String,
    #[serde(rename = "Orientation")]
    pub orientation: String,
}

impl ExifSummary {
    /// Encode for storage in the catalog record.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a caller-supplied blob.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Extraction result: the normalized summary plus the raw values the
/// catalog record needs alongside the encoded blob.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub summary: ExifSummary,
    pub device_name: String,
    pub date_time_original: String,
    pub offset_time_original: String,
}

/// Read and normalize the metadata of one 3FR capture.
///
/// Fails with `UnsupportedFormat` when the container cannot be parsed at
/// all; individual absent tags degrade to empty strings or defaults.
pub fn extract(path: &Path) -> Result<Extraction, ImportError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader)?;

    let width = uint_field(&exif, Tag::ImageWidth).or_else(|| uint_field(&exif, Tag::PixelXDimension));
    let height = uint_field(&exif, Tag::ImageLength).or_else(|| uint_field(&exif, Tag::PixelYDimension));
    let dimensions = match (width, height) {
        (Some(w), Some(h)) => format!("{} * {}", w, h),
        _ => String::new(),
    };

    let orientation = orientation_degrees(uint_field(&exif, Tag::Orientation));

    let device = string_field(&exif, Tag::Model).unwrap_or_default();
    let date_time_original = string_field(&exif, Tag::DateTimeOriginal).unwrap_or_default();
    // Not every capture carries an offset; absent is fine.
    let offset = string_field(&exif, Tag::OffsetTimeOriginal).unwrap_or_default();

    let aperture = rational_field(&exif, Tag::FNumber)
        .or_else(|| rational_field(&exif, Tag::ApertureValue));
    let aperture_str = aperture.map(format_one_decimal).unwrap_or_default();

    // APEX shutter speed: seconds = 2^(-apex)
    let exposure = rational_field(&exif, Tag::ExposureTime)
        .or_else(|| rational_field(&exif, Tag::ShutterSpeedValue).map(|apex| (-apex).exp2()));
    let shutter_str = exposure.map(format_exposure).unwrap_or_default();

    let iso = uint_field(&exif, Tag::PhotographicSensitivity)
        .map(|v| v.to_string())
        .unwrap_or_default();

    let shot = string_field(&exif, Tag::LensModel)
        .or_else(|| string_field_in(&exif, Tag::LensModel, In::THUMBNAIL))
        .unwrap_or_default();

    let rating = uint_field(&exif, RATING_TAG)
        .map(i64::from)
        .or_else(|| scan_xmp_rating(path));

    let summary = ExifSummary {
        shot,
        device: device.clone(),
        dimensions,
        date_time_original: date_time_original.clone(),
        aperture_value: aperture_str,
        offset_time_original: offset.clone(),
        rating: format_rating(rating),
        shutter_speed_value: shutter_str,
        iso,
        orientation: orientation.to_string(),
    };

    Ok(Extraction {
        summary,
        device_name: device,
        date_time_original,
        offset_time_original: offset,
    })
}

/// Render an exposure duration the way the host catalog displays it:
/// `"2s"`, `"2.5s"`, `"1/200s"`, `"0s"`.
pub fn format_exposure(seconds: f64) -> String {
    if seconds >= 1.0 {
        let v = (seconds * 10.0).round() / 10.0;
        if v.fract() == 0.0 {
            format!("{}s", v as i64)
        } else {
            format!("{v}s")
        }
    } else if seconds > 0.0 {
        format!("1/{}s", (1.0 / seconds).round() as i64)
    } else {
        "0s".to_string()
    }
}

/// Round to one decimal and drop a trailing ".0" (aperture rendering).
pub fn format_one_decimal(value: f64) -> String {
    let v = (value * 10.0).round() / 10.0;
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Map an EXIF orientation code to the degree string the host expects.
/// Unknown or absent codes fall back to "0".
pub fn orientation_degrees(code: Option<u32>) -> &'static str {
    match code {
        Some(1) => "0",
        Some(3) => "180",
        Some(6) => "90",
        Some(8) => "270",
        _ => "0",
    }
}

/// The host stores the star rating as the literal text `Optional(N)`.
pub fn format_rating(rating: Option<i64>) -> String {
    format!("Optional({})", rating.unwrap_or(0))
}

/// Loose fallback: some capture variants carry the star rating in an XMP
/// packet rather than the TIFF rating tag. Scan the file head for the
/// usual attribute spellings.
fn scan_xmp_rating(path: &Path) -> Option<i64> {
    let mut file = File::open(path).ok()?;
    let mut buf = vec![0u8; XMP_SCAN_BYTES];
    let n = file.read(&mut buf).ok()?;
    buf.truncate(n);

    let text = String::from_utf8_lossy(&buf);
    for key in ["xmp:Rating=\"", "Rating=\""] {
        if let Some(pos) = text.find(key) {
            let digits: String = text[pos + key.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(v) = digits.parse() {
                return Some(v);
            }
        }
    }
    None
}

fn string_field(exif: &Exif, tag: Tag) -> Option<String> {
    string_field_in(exif, tag, In::PRIMARY)
}

fn string_field_in(exif: &Exif, tag: Tag, ifd: In) -> Option<String> {
    exif.get_field(tag, ifd).and_then(|f| ascii_value(&f.value))
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .map(|s| s.trim_matches('\u{0}').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// First element for list-valued tags (ISO is commonly a list).
fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
}

fn rational_field(exif: &Exif, tag: Tag) -> Option<f64> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match &f.value {
        Value::Rational(v) if !v.is_empty() => Some(v[0].to_f64()),
        Value::SRational(v) if !v.is_empty() => Some(v[0].to_f64()),
        _ => None,
    })
}
