//! Write any `DataFrame` as CSV.
//!
//! Every column is cast to text by polars, so dates come out in ISO form
//! and nulls become empty fields. Used for the features and outcomes
//! tables, whose column sets vary with configuration.

use crate::export::ExportError;
use polars::prelude::*;
use std::io::Write;
use std::path::Path;

/// Write `df` as CSV with a header row.
pub fn write_frame_csv<W: Write>(df: &DataFrame, writer: W) -> Result<(), ExportError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let mut columns: Vec<Vec<Option<String>>> = Vec::with_capacity(names.len());
    for name in &names {
        let text = df.column(name)?.cast(&DataType::String)?;
        let values = text.str()?;
        columns.push(values.into_iter().map(|v| v.map(str::to_string)).collect());
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&names)?;
    for row in 0..df.height() {
        wtr.write_record(
            columns
                .iter()
                .map(|column| column[row].as_deref().unwrap_or("")),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `df` to a CSV file, creating parent directories.
pub fn write_frame_csv_file(df: &DataFrame, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_frame_csv(df, std::fs::File::create(path)?)
}
