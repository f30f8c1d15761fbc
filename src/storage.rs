use crate::error::PersistenceError;
use crate::results::{ProductRecord, SnapshotPaths};
use chrono::Local;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Outcome of one flush; each format succeeds or fails on its own.
#[derive(Debug)]
pub struct FlushReport {
    pub records: usize,
    pub json: Result<PathBuf, PersistenceError>,
    pub csv: Result<PathBuf, PersistenceError>,
}

impl FlushReport {
    pub fn paths(&self) -> SnapshotPaths {
        SnapshotPaths {
            json: self.json.as_ref().ok().cloned(),
            csv: self.csv.as_ref().ok().cloned(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.json.is_ok() && self.csv.is_ok()
    }
}

/// Writes timestamped snapshots of the whole run buffer as JSON and CSV.
///
/// Every flush produces new files; an existing snapshot is never overwritten.
#[derive(Debug)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
    prefix: String,
    // Serializes flushes so two writers never pick the same file name.
    naming: Mutex<()>,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            naming: Mutex::new(()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `records` to a fresh pair of artifacts.
    ///
    /// Returns `None` when there is nothing to write.
    pub fn flush(&self, records: &[ProductRecord]) -> Option<FlushReport> {
        if records.is_empty() {
            ::log::info!("Nothing collected yet, skipping snapshot");
            return None;
        }

        let _guard = self
            .naming
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            let err = || -> Result<PathBuf, PersistenceError> {
                Err(PersistenceError::io(&self.output_dir, clone_io_error(&e)))
            };
            ::log::error!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            );
            return Some(FlushReport {
                records: records.len(),
                json: err(),
                csv: err(),
            });
        }

        let stamp = Local::now().format("%Y%m%d_%H%M").to_string();
        let base = self.unique_base(&stamp);

        let json = write_atomically(&base.with_extension("json"), |file| write_json(file, records));
        let csv = write_atomically(&base.with_extension("csv"), |file| write_csv(file, records));

        match &json {
            Ok(path) => ::log::info!("Saved {} records to {}", records.len(), path.display()),
            Err(e) => ::log::error!("Structured snapshot failed: {}", e),
        }
        match &csv {
            Ok(path) => ::log::info!("Saved {} records to {}", records.len(), path.display()),
            Err(e) => ::log::error!("Tabular snapshot failed: {}", e),
        }

        Some(FlushReport {
            records: records.len(),
            json,
            csv,
        })
    }

    /// First `<prefix>_<stamp>[_n]` whose artifacts do not exist yet
    fn unique_base(&self, stamp: &str) -> PathBuf {
        let mut n = 1;
        loop {
            let name = if n == 1 {
                format!("{}_{}", self.prefix, stamp)
            } else {
                format!("{}_{}_{}", self.prefix, stamp, n)
            };
            let base = self.output_dir.join(name);
            if !base.with_extension("json").exists() && !base.with_extension("csv").exists() {
                return base;
            }
            n += 1;
        }
    }
}

fn clone_io_error(e: &std::io::Error) -> std::io::Error {
    std::io::Error::new(e.kind(), e.to_string())
}

/// Write to a temporary sibling, then rename into place
fn write_atomically<F>(path: &Path, write: F) -> Result<PathBuf, PersistenceError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), PersistenceError>,
{
    let tmp = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or_default()
    ));

    let result = File::create(&tmp)
        .map_err(|e| PersistenceError::io(&tmp, e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush().map_err(|e| PersistenceError::io(&tmp, e))
        })
        .and_then(|_| fs::rename(&tmp, path).map_err(|e| PersistenceError::io(path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map(|_| path.to_path_buf())
}

fn write_json(out: &mut BufWriter<File>, records: &[ProductRecord]) -> Result<(), PersistenceError> {
    serde_json::to_writer_pretty(out, records)?;
    Ok(())
}

fn write_csv(out: &mut BufWriter<File>, records: &[ProductRecord]) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record.to_row())?;
    }
    writer.flush().map_err(|e| PersistenceError::Csv(e.into()))?;
    Ok(())
}

/// Load a structured snapshot back into records
pub fn load_snapshot(path: &Path) -> Result<Vec<ProductRecord>, PersistenceError> {
    let file = File::open(path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
