use std::path::PathBuf;
use thiserror::Error;

/// Errors that end an import run, or fail a single file in batch mode.
///
/// Per-file skips (missing file, wrong extension, duplicate id in lenient
/// mode) and an absent patch marker are not errors; they travel through
/// `import::ImportOutcome` instead.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The metadata reader could not open the capture at all.
    #[error("unsupported raw format: {0}")]
    UnsupportedFormat(#[from] exif::Error),

    /// Placeholder preview creation or finalization failed.
    #[error("placeholder encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("metadata blob encode failed: {0}")]
    MetadataEncode(#[from] serde_json::Error),

    /// Fatal in strict (single-file) mode; batch mode skips instead.
    #[error("image id already in catalog: {0}")]
    DuplicateKey(String),

    /// The host application's store file is not where it should be.
    #[error("catalog store not found: {} (open Phocus once first)", .0.display())]
    StoreUnavailable(PathBuf),

    #[error("catalog store schema version {found} does not match expected {expected}")]
    SchemaVersion { found: i32, expected: i32 },

    #[error("no Phocus container found: {0}")]
    ContainerNotFound(String),

    #[error("no .3FR files in {}", .0.display())]
    EmptyBatch(PathBuf),

    #[error("{0}")]
    Usage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
