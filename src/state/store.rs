//! Embedded catalog store
//!
//! Single-writer handle on the host application's photo-index database.
//! The store file belongs to Phocus: it must already exist, its schema
//! version must match, and the importer only ever adds rows.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::entry::PhotoIndexRecord;
use crate::error::ImportError;

/// Schema version the host application ships; must match exactly.
pub const SCHEMA_VERSION: i32 = 13;

pub struct CatalogStore {
    conn: Connection,
    path: PathBuf,
}

impl CatalogStore {
    /// Open the host's existing store.
    ///
    /// A missing file is fatal: importing into a fresh database the host
    /// has never seen would not surface in the app.
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        if !path.exists() {
            return Err(ImportError::StoreUnavailable(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        let store = CatalogStore {
            conn,
            path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self, ImportError> {
        let conn = Connection::open_in_memory()?;
        let store = CatalogStore {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), ImportError> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version == 0 {
            self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        } else if version != SCHEMA_VERSION {
            return Err(ImportError::SchemaVersion {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS photo_index (
                image_id                   TEXT PRIMARY KEY,
                device_name                TEXT,
                image_name                 TEXT NOT NULL,
                thumbnail_jpeg             TEXT,
                media_type                 INTEGER NOT NULL DEFAULT 0,
                middle_jpeg                TEXT,
                full_jpeg                  TEXT,
                raw_file                   TEXT,
                heif_file                  TEXT,
                shot                       TEXT,
                date_time_digitized_str    TEXT,
                date_time_original_str     TEXT NOT NULL,
                date_time_original_desc    TEXT NOT NULL,
                exif_data                  BLOB NOT NULL,
                date_time_digitized        INTEGER,
                date_time_original         INTEGER NOT NULL,
                rely_raw_file              TEXT,
                adjustment_data            BLOB,
                is_adjusted                INTEGER NOT NULL DEFAULT 0,
                is_like                    INTEGER NOT NULL DEFAULT 0,
                is_ai_denoised             INTEGER NOT NULL DEFAULT 0,
                ai_denoise_type            INTEGER NOT NULL DEFAULT 0,
                color_mark                 TEXT,
                storage_type               INTEGER NOT NULL DEFAULT 1,
                local_identify             TEXT,
                camera_index_uuid          TEXT,
                camera_serial_number       TEXT,
                rating                     INTEGER NOT NULL DEFAULT 0,
                date_time_offset           TEXT,
                date_time_original_legacy  INTEGER
            )",
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point lookup backing the duplicate-id check.
    pub fn contains(&self, image_id: &str) -> Result<bool, ImportError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM photo_index WHERE image_id = ?1",
                params![image_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Load a full record by id.
    pub fn get(&self, image_id: &str) -> Result<Option<PhotoIndexRecord>, ImportError> {
        let record = self
            .conn
            .query_row(
                "SELECT image_id, device_name, image_name, thumbnail_jpeg, media_type,
                        middle_jpeg, full_jpeg, raw_file, heif_file, shot,
                        date_time_digitized_str, date_time_original_str,
                        date_time_original_desc, exif_data, date_time_digitized,
                        date_time_original, rely_raw_file, adjustment_data,
                        is_adjusted, is_like, is_ai_denoised, ai_denoise_type,
                        color_mark, storage_type, local_identify, camera_index_uuid,
                        camera_serial_number, rating, date_time_offset,
                        date_time_original_legacy
                 FROM photo_index WHERE image_id = ?1",
                params![image_id],
                |row| {
                    Ok(PhotoIndexRecord {
                        image_id: row.get(0)?,
                        device_name: row.get(1)?,
                        image_name: row.get(2)?,
                        thumbnail_jpeg: row.get(3)?,
                        media_type: row.get(4)?,
                        middle_jpeg: row.get(5)?,
                        full_jpeg: row.get(6)?,
                        raw_file: row.get(7)?,
                        heif_file: row.get(8)?,
                        shot: row.get(9)?,
                        date_time_digitized_str: row.get(10)?,
                        date_time_original_str: row.get(11)?,
                        date_time_original_desc: row.get(12)?,
                        exif_data: row.get(13)?,
                        date_time_digitized: row
                            .get::<_, Option<i64>>(14)?
                            .map(from_unix),
                        date_time_original: from_unix(row.get(15)?),
                        rely_raw_file: row.get(16)?,
                        adjustment_data: row
                            .get::<_, Option<Vec<u8>>>(17)?
                            .unwrap_or_default(),
                        is_adjusted: row.get(18)?,
                        is_like: row.get(19)?,
                        is_ai_denoised: row.get(20)?,
                        ai_denoise_type: row.get(21)?,
                        color_mark: row.get(22)?,
                        storage_type: row.get(23)?,
                        local_identify: row.get(24)?,
                        camera_index_uuid: row.get(25)?,
                        camera_serial_number: row.get(26)?,
                        rating: row.get(27)?,
                        date_time_offset: row.get(28)?,
                        date_time_original_legacy: row
                            .get::<_, Option<i64>>(29)?
                            .map(from_unix),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Insert exactly one record inside one transaction.
    ///
    /// A primary-key collision surfaces as `DuplicateKey`; callers are
    /// expected to have checked `contains` first, so hitting it here means
    /// the same id was derived twice in one run.
    pub fn insert(&mut self, record: &PhotoIndexRecord) -> Result<(), ImportError> {
        let tx = self.conn.transaction()?;
        let result = tx.execute(
            "INSERT INTO photo_index (
                image_id, device_name, image_name, thumbnail_jpeg, media_type,
                middle_jpeg, full_jpeg, raw_file, heif_file, shot,
                date_time_digitized_str, date_time_original_str,
                date_time_original_desc, exif_data, date_time_digitized,
                date_time_original, rely_raw_file, adjustment_data,
                is_adjusted, is_like, is_ai_denoised, ai_denoise_type,
                color_mark, storage_type, local_identify, camera_index_uuid,
                camera_serial_number, rating, date_time_offset,
                date_time_original_legacy
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30
            )",
            params![
                record.image_id,
                record.device_name,
                record.image_name,
                record.thumbnail_jpeg,
                record.media_type,
                record.middle_jpeg,
                record.full_jpeg,
                record.raw_file,
                record.heif_file,
                record.shot,
                record.date_time_digitized_str,
                record.date_time_original_str,
                record.date_time_original_desc,
                record.exif_data,
                record.date_time_digitized.map(|d| d.timestamp()),
                record.date_time_original.timestamp(),
                record.rely_raw_file,
                record.adjustment_data,
                record.is_adjusted,
                record.is_like,
                record.is_ai_denoised,
                record.ai_denoise_type,
                record.color_mark,
                record.storage_type,
                record.local_identify,
                record.camera_index_uuid,
                record.camera_serial_number,
                record.rating,
                record.date_time_offset,
                record.date_time_original_legacy.map(|d| d.timestamp()),
            ],
        );

        match result {
            Ok(_) => {
                tx.commit()?;
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(ImportError::DuplicateKey(record.image_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// How many records the index holds.
    pub fn record_count(&self) -> Result<i64, ImportError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM photo_index", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn from_unix(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("path", &self.path)
            .finish()
    }
}
