//! Time-series file writer.
//!
//! One delimited file per (component, attribute) series, named
//! `<system>_<component>_<attribute><ext>`. Rows follow the snapshot
//! index; columns follow the network's scenario order (deterministic
//! mode: one column). No header row and no index column: the study format
//! addresses a series by file name alone.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use psc_core::{PscError, PscResult};

use crate::classify::SeriesColumns;
use crate::format::SeriesFormat;

/// Resolved pointer to a written series: the name component records embed
/// and the file backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesReference {
    pub name: String,
    pub path: PathBuf,
}

/// Writes data-series files into a study's `data-series` directory.
///
/// The writer is the sole owner of that directory; every series is written
/// exactly once and a repeated (component, attribute) address is an
/// integrity violation.
pub struct SeriesWriter {
    dir: PathBuf,
    format: SeriesFormat,
    system: String,
    written: BTreeSet<String>,
}

impl SeriesWriter {
    pub fn new(dir: impl Into<PathBuf>, format: SeriesFormat, system: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            format,
            system: system.into(),
            written: BTreeSet::new(),
        }
    }

    /// Number of series written so far.
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Write one series and return its reference.
    pub fn write(
        &mut self,
        component: &str,
        attribute: &str,
        series: &SeriesColumns,
    ) -> PscResult<SeriesReference> {
        let name = format!("{}_{}_{}", self.system, component, attribute);
        if !self.written.insert(name.clone()) {
            return Err(PscError::IntegrityError(format!(
                "series '{name}' would be written twice"
            )));
        }

        // The directory appears only once there is a series to put in it.
        fs::create_dir_all(&self.dir)
            .map_err(|e| PscError::io(format!("creating {}", self.dir.display()), e))?;

        let path = self.dir.join(format!("{name}{}", self.format.extension()));
        write_columns(&path, self.format, &series.columns)?;
        Ok(SeriesReference { name, path })
    }
}

fn write_columns(path: &Path, format: SeriesFormat, columns: &[Vec<f64>]) -> PscResult<()> {
    let context = || format!("writing series file {}", path.display());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(context(), e))?;

    let rows = columns.first().map(Vec::len).unwrap_or(0);
    for row in 0..rows {
        let record: Vec<String> = columns.iter().map(|col| col[row].to_string()).collect();
        writer.write_record(&record).map_err(|e| csv_error(context(), e))?;
    }
    writer
        .flush()
        .map_err(|e| PscError::io(context(), e))?;
    Ok(())
}

fn csv_error(context: String, err: csv::Error) -> PscError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => PscError::io(context, io),
        other => PscError::Other(format!("{context}: {other:?}")),
    }
}
