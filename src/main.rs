use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod container;
mod error;
mod import;
mod raw;
mod state;

use container::{ContainerLayout, PHOCUS_BUNDLE_ID};
use error::ImportError;
use import::{DuplicatePolicy, ImportOutcome, Importer};
use state::store::CatalogStore;

/// Import Hasselblad .3FR captures into Phocus 2 by writing files + the catalog store.
#[derive(Debug, Parser)]
#[command(name = "phocus-importer", version, about)]
struct Cli {
    /// Single .3FR file to import
    #[arg(long = "3fr", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Pre-encoded metadata blob stored in place of extraction
    /// (must decode as the host's ten-field JSON shape)
    #[arg(long = "exif-bin", value_name = "FILE")]
    exif_bin: Option<PathBuf>,

    /// Unix timestamp for the derived image id (default: current time)
    #[arg(long = "ts", value_name = "SECONDS")]
    ts: Option<i64>,

    /// A .3FR file, or a directory to batch-import
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ImportError> {
    let cli = Cli::parse();

    // A bare path naming a file is shorthand for --3fr; a directory means
    // batch mode.
    let mut file = cli.file;
    let mut batch_dir = None;
    if let Some(path) = cli.path {
        if file.is_none() && path.is_file() {
            file = Some(path);
        } else {
            batch_dir = Some(path);
        }
    }

    if let Some(dir) = &batch_dir {
        if file.is_some() || cli.exif_bin.is_some() || cli.ts.is_some() {
            return Err(ImportError::Usage(
                "batch mode takes no custom flags; use: phocus-importer /path/to/folder".into(),
            ));
        }
        if !dir.is_dir() {
            return Err(ImportError::Usage(format!(
                "batch mode needs a directory: {}",
                dir.display()
            )));
        }
    }

    let Some(mode) = mode_of(&file, &batch_dir) else {
        return Err(ImportError::Usage(
            "nothing to import; pass --3fr <file> or a directory (see --help)".into(),
        ));
    };

    let layout = ContainerLayout::discover()?;
    println!("🔎 Phocus bundle id = {PHOCUS_BUNDLE_ID}");
    println!("🔎 Container uuid = {}", layout.container_uuid());
    println!("🔎 Container root = {}", layout.container_root.display());

    let mut store = CatalogStore::open(&layout.store_path)?;
    layout.ensure_dirs()?;

    let mut importer = Importer::new(&mut store, &layout);

    match mode {
        Mode::Single(source) => {
            let exif_bin = match &cli.exif_bin {
                Some(path) => {
                    if !path.exists() {
                        return Err(ImportError::Usage(format!(
                            "metadata blob does not exist: {}",
                            path.display()
                        )));
                    }
                    Some(fs::read(path)?)
                }
                None => None,
            };

            let outcome =
                importer.import_file(&source, cli.ts, exif_bin.as_deref(), DuplicatePolicy::Strict)?;

            // A skip is fine mid-batch, but the one requested file not
            // importing means the invocation itself was wrong.
            match outcome {
                ImportOutcome::SkippedNotFound => {
                    return Err(ImportError::Usage(format!(
                        "input file does not exist: {}",
                        source.display()
                    )));
                }
                ImportOutcome::SkippedWrongExtension => {
                    return Err(ImportError::Usage(format!(
                        "not a .3FR file: {}",
                        source.display()
                    )));
                }
                _ => {}
            }
        }
        Mode::Batch(dir) => {
            importer.import_directory(&dir)?;
        }
    }

    println!("📁 Raw images: {}", layout.images_dir.display());
    println!("📁 Preview cache: {}", layout.preview_cache_dir.display());
    println!("📁 Catalog store: {}", layout.store_path.display());
    Ok(())
}

enum Mode {
    Single(PathBuf),
    Batch(PathBuf),
}

fn mode_of(file: &Option<PathBuf>, batch_dir: &Option<PathBuf>) -> Option<Mode> {
    if let Some(file) = file {
        Some(Mode::Single(file.clone()))
    } else {
        batch_dir.as_ref().map(|dir| Mode::Batch(dir.clone()))
    }
}
