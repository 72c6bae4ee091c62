//! Run report: a timestamped text file with the three reconciliation buckets

use chrono::{DateTime, Local};
use log::{error, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::models::quote_repr;
use crate::reconcile::Classification;

const FILE_PREFIX: &str = "update_products_log_";
const LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Writes the report of one run into `<dir>/update_products_log_<stamp>.txt`
#[derive(Debug, Clone)]
pub struct Reporter {
    path: PathBuf,
}

impl Reporter {
    /// `generated_at` stamps the file name; it is normally the process start time
    pub fn new(dir: impl AsRef<Path>, generated_at: DateTime<Local>) -> Self {
        let file_name = format!("{}{}.txt", FILE_PREFIX, generated_at.format("%Y%m%d_%H%M%S"));
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the three report lines. Failures are logged, never returned:
    /// the writes have already happened by the time the report is produced.
    pub fn write(&self, classification: &Classification) -> Option<PathBuf> {
        let stamp = Local::now().format(LINE_TIMESTAMP).to_string();
        match self.try_write(&render_lines(classification, &stamp)) {
            Ok(()) => {
                info!("Report written to {}", self.path.display());
                Some(self.path.clone())
            }
            Err(e) => {
                error!("Failed to write report {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn try_write(&self, lines: &[String]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        file.flush()
    }
}

/// Found, not-found and mismatch lines, always in that order
pub fn render_lines(classification: &Classification, stamp: &str) -> [String; 3] {
    let found = render_list(classification.found.iter().map(|id| id.repr()));
    let not_found = render_list(classification.not_found.iter().map(|id| id.repr()));
    let mismatched = render_list(classification.sku_mismatch.iter().map(|sku| quote_repr(sku)));

    [
        format!("{} - Found IDs: {}", stamp, found),
        format!("{} - Not Found IDs: {}", stamp, not_found),
        format!("{} - SKU Mismatches: {}", stamp, mismatched),
    ]
}

fn render_list(items: impl Iterator<Item = String>) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}
