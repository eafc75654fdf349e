use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::model::OutputRecord;

/// Where accepted records end up.
pub trait RecordSink {
    /// Persist `records`; returns the path written, or `None` when nothing was written.
    fn persist(&mut self, records: &[OutputRecord]) -> Result<Option<PathBuf>>;
}

/// CSV file sink. Never overwrites: an existing target gets a `_V<n>` suffix.
pub struct CsvSink {
    target: PathBuf,
}

impl CsvSink {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl RecordSink for CsvSink {
    fn persist(&mut self, records: &[OutputRecord]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            info!("No exhibitors to save");
            return Ok(None);
        }

        let path = next_free_path(&self.target);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!("Data successfully saved to {}", path.display());
        if let Ok(abs) = path.canonicalize() {
            info!("Absolute path: {}", abs.display());
        }
        Ok(Some(path))
    }
}

/// `out.csv` if free, else the first free `out_V1.csv`, `out_V2.csv`, …
pub fn next_free_path(target: &Path) -> PathBuf {
    if !target.exists() {
        return target.to_path_buf();
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|n| target.with_file_name(format!("{}_V{}{}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| target.to_path_buf())
}
