//! CSV dataset reading for reference blocks.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::DatasetError;

/// Reads the reference-block column of a CSV dataset.
///
/// The first line is the header. `start` data rows are skipped so a run can
/// resume from a given row index. Rows whose cell is missing produce an empty
/// block rather than an error, keeping row positions aligned.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened, the CSV is
/// malformed, or `column` is not one of the header names.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_reference_blocks(
    path: &Path,
    column: &str,
    start: usize,
) -> Result<Vec<String>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DatasetError::open(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::csv(path, e))?
        .clone();
    let Some(index) = headers.iter().position(|h| h.trim() == column) else {
        return Err(DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        });
    };
    debug!(column, index, "located reference column");

    let mut blocks = Vec::new();
    for record in reader.records().skip(start) {
        let record = record.map_err(|e| DatasetError::csv(path, e))?;
        blocks.push(record.get(index).unwrap_or_default().to_string());
    }

    info!(rows = blocks.len(), start, "dataset loaded");
    Ok(blocks)
}
