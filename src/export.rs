use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::record::Transaction;

pub const DEFAULT_EXPORT_FILE: &str = "fraud_analysis_results.csv";

/// Writes `records` as CSV: a header of the first record's field names, then
/// one row per record. Values containing delimiters are quoted. Fields absent
/// from a later record are written as empty cells. Empty input writes nothing.
pub fn export_csv<W: Write>(records: &[Transaction], writer: W) -> Result<(), ExportError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let headers = first.field_names();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;
    for tx in records {
        let row: Vec<String> = headers
            .iter()
            .map(|name| tx.get(name).map(|value| value.to_string()).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv_bytes(records: &[Transaction]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    export_csv(records, &mut buf)?;
    Ok(buf)
}

pub fn export_to_file(records: &[Transaction], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path.as_ref())?;
    export_csv(records, file)?;
    info!(path = %path.as_ref().display(), rows = records.len(), "exported results");
    Ok(())
}
