//! Import orchestration
//!
//! Drives one capture through the full pipeline: validation, metadata
//! resolution, raw copy + header patch, placeholder previews, record build,
//! and the single transactional store insert. The batch coordinator lifts
//! that across a directory with per-file failure isolation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use crate::container::ContainerLayout;
use crate::error::ImportError;
use crate::raw::metadata::{self, ExifSummary};
use crate::raw::patcher::{
    patch_header_in_place, HEADER_SCAN_BYTES, PROCESSED_MARKER_REPLACE, PROCESSED_MARKER_SEARCH,
};
use crate::raw::placeholder::{write_black_jpeg, MIDDLE_SIZE, PLACEHOLDER_QUALITY, THUMBNAIL_SIZE};
use crate::state::entry;
use crate::state::store::CatalogStore;

/// Only Hasselblad 3FR captures are accepted.
const RAW_EXTENSION: &str = "3fr";

/// What to do when the derived image id is already in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Abort the run (single-file mode).
    Strict,
    /// Skip the file and keep going (batch mode).
    Lenient,
}

/// Per-file result. Skips are deliberate non-errors; the batch tally
/// counts them on the failure side, matching what the tool reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { image_id: String },
    SkippedNotFound,
    SkippedWrongExtension,
    SkippedDuplicate { image_id: String },
}

/// Batch tally printed at the end of a directory run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub imported: usize,
    pub failed: usize,
}

pub struct Importer<'a> {
    store: &'a mut CatalogStore,
    layout: &'a ContainerLayout,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a mut CatalogStore, layout: &'a ContainerLayout) -> Self {
        Importer { store, layout }
    }

    /// Import one 3FR capture.
    ///
    /// `exif_bin` substitutes extraction with a caller-supplied pre-encoded
    /// metadata blob. `ts_override` pins the unix timestamp used in the
    /// derived image id; it defaults to now.
    pub fn import_file(
        &mut self,
        source: &Path,
        ts_override: Option<i64>,
        exif_bin: Option<&[u8]>,
        policy: DuplicatePolicy,
    ) -> Result<ImportOutcome, ImportError> {
        if !source.exists() {
            println!("⚠️  Skipping: file does not exist: {}", source.display());
            return Ok(ImportOutcome::SkippedNotFound);
        }
        if !has_raw_extension(source) {
            println!("⚠️  Skipping: not a .3FR: {}", source.display());
            return Ok(ImportOutcome::SkippedWrongExtension);
        }

        let base_name = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        if base_name.is_empty() {
            println!("⚠️  Skipping: cannot resolve file name: {}", source.display());
            return Ok(ImportOutcome::SkippedWrongExtension);
        }

        // Metadata: caller-supplied blob, or extraction from the capture.
        // An undecodable blob is still stored verbatim; only the derived
        // capture fields degrade to empty.
        let (exif_data, device_name, date_time_original, offset) = match exif_bin {
            Some(bytes) => match ExifSummary::from_json(bytes) {
                Ok(summary) => (
                    bytes.to_vec(),
                    summary.device,
                    summary.date_time_original,
                    summary.offset_time_original,
                ),
                Err(_) => {
                    println!(
                        "⚠️  Supplied metadata blob does not decode; storing it verbatim with empty capture fields"
                    );
                    (bytes.to_vec(), String::new(), String::new(), String::new())
                }
            },
            None => {
                let extraction = metadata::extract(source)?;
                println!("✅ EXIF read from {}", source.display());
                (
                    extraction.summary.to_json()?,
                    extraction.device_name,
                    extraction.date_time_original,
                    extraction.offset_time_original,
                )
            }
        };

        let ts = ts_override.unwrap_or_else(|| Utc::now().timestamp());
        let image_id = entry::derive_image_id(&base_name, ts);

        if self.store.contains(&image_id)? {
            match policy {
                DuplicatePolicy::Strict => return Err(ImportError::DuplicateKey(image_id)),
                DuplicatePolicy::Lenient => {
                    println!("⚠️  Skipping: image id already in catalog: {image_id}");
                    return Ok(ImportOutcome::SkippedDuplicate { image_id });
                }
            }
        }

        // Place the raw copy, then patch its header. A failed or skipped
        // patch must not block the entry from becoming usable.
        let raw_dst = self.layout.images_dir.join(entry::raw_file_name(&image_id));
        copy_replace(source, &raw_dst)?;

        match patch_header_in_place(
            &raw_dst,
            &PROCESSED_MARKER_SEARCH,
            &PROCESSED_MARKER_REPLACE,
            HEADER_SCAN_BYTES,
        ) {
            Ok(Some(offset)) => println!("🧩 Raw header patched at offset {offset} (40->42)"),
            Ok(None) => println!("🧩 Raw header marker not found; copy left as-is"),
            Err(e) => eprintln!("⚠️  Raw header patch failed: {e}"),
        }

        // Placeholder previews. Encoding failure is fatal for this file.
        let thumb_dst = self
            .layout
            .preview_cache_dir
            .join(entry::thumbnail_file_name(&image_id));
        let middle_dst = self
            .layout
            .preview_cache_dir
            .join(entry::middle_file_name(&image_id));
        write_black_jpeg(&thumb_dst, THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1, PLACEHOLDER_QUALITY)?;
        write_black_jpeg(&middle_dst, MIDDLE_SIZE.0, MIDDLE_SIZE.1, PLACEHOLDER_QUALITY)?;

        let record = entry::build_record(
            &base_name,
            ts,
            exif_data,
            &device_name,
            &date_time_original,
            &offset,
        );
        println!(
            "🧩 adjustment_data bytes = {} (always empty)",
            record.adjustment_data.len()
        );
        self.store.insert(&record)?;

        println!(
            "🎉 Imported {} -> image id {image_id}",
            source.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(ImportOutcome::Imported { image_id })
    }

    /// Import every 3FR directly inside `dir`.
    ///
    /// Files are taken in name order and each gets `run start + index` as
    /// its timestamp, so ids stay unique even when the whole batch lands
    /// within one wall-clock second. One file's failure is logged and
    /// counted, never propagated.
    pub fn import_directory(&mut self, dir: &Path) -> Result<BatchSummary, ImportError> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.into_path())
            .filter(|path| has_raw_extension(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ImportError::EmptyBatch(dir.to_path_buf()));
        }

        println!(
            "🚀 Batch import: dir={} files={}",
            dir.display(),
            files.len()
        );

        let base_ts = Utc::now().timestamp();
        let mut summary = BatchSummary::default();

        for (idx, file) in files.iter().enumerate() {
            let ts = base_ts + idx as i64;
            match self.import_file(file, Some(ts), None, DuplicatePolicy::Lenient) {
                Ok(ImportOutcome::Imported { .. }) => summary.imported += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    eprintln!(
                        "❌ Import failed: {}: {e}",
                        file.file_name().unwrap_or_default().to_string_lossy()
                    );
                }
            }
        }

        println!(
            "✅ Batch done: imported={} failed/skipped={}",
            summary.imported, summary.failed
        );
        Ok(summary)
    }
}

fn has_raw_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(RAW_EXTENSION))
        .unwrap_or(false)
}

/// Copy `src` over `dst`, replacing any stale file from an earlier run.
fn copy_replace(src: &Path, dst: &Path) -> std::io::Result<()> {
    if dst.exists() {
        fs::remove_file(dst)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}
