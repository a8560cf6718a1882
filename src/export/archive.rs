//! Export ZIP extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipArchive;

use crate::error::{FerdError, Result};

/// Extract an export ZIP into `output_dir` and return the export root.
///
/// Exports usually wrap their contents in a single top-level directory; when
/// exactly one directory comes out of the archive, that directory is the
/// root. Otherwise the output directory itself is.
pub fn extract_zip(zip_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !zip_path.exists() {
        return Err(FerdError::Archive(format!(
            "ZIP file not found: {}",
            zip_path.display()
        )));
    }

    std::fs::create_dir_all(output_dir)?;

    info!(
        "Extracting {} to {}",
        zip_path.display(),
        output_dir.display()
    );

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(output_dir)?;

    let entries: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();

    let root = match entries.as_slice() {
        [single] if single.is_dir() => single.clone(),
        _ => output_dir.to_path_buf(),
    };

    info!("Extraction complete: {}", root.display());
    Ok(root)
}
