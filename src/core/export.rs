// OrderPulse - core/export.rs
//
// CSV export of summary rows and JSON export of the run report.
// Writes to any Write trait object; the caller owns file creation.

use crate::util::constants;
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Export summary rows as semicolon-delimited CSV with a header row.
///
/// Returns the number of data rows written.
pub fn export_csv<W: Write, T: Serialize>(
    rows: &[T],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(constants::DEFAULT_DELIMITER)
        .from_writer(writer);

    for row in rows {
        csv_writer.serialize(row).map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(rows.len())
}

/// Export any serialisable value as pretty-printed JSON.
///
/// The writer is flushed before returning so buffered write failures
/// surface here instead of on drop.
pub fn export_json<W: Write, T: Serialize + ?Sized>(
    value: &T,
    mut writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })
}
