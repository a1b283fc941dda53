//! Quote files on disk.
//!
//! A quote file is a CSV with a header row naming the quote columns
//! (`symbol,date,open,high,low,close,volume,adjusted_close`), dates in
//! ISO `YYYY-MM-DD` form. Column order in the file does not matter.

use crate::error::{DataError, Result};
use crate::frame::{self, QuoteRow};
use crate::source::FrameSource;
use polars::prelude::DataFrame;
use std::io::{Read, Write};
use std::path::Path;

/// Read quote rows from any reader holding CSV text.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<QuoteRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<QuoteRow>, _>>()?;
    Ok(rows)
}

/// Read a quote file into a quote frame.
pub fn read_quotes<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let rows = read_rows(file)?;

    if rows.is_empty() {
        return Err(DataError::MissingData {
            symbol: path.display().to_string(),
            reason: "Quote file has no rows".to_string(),
        });
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read quote file");
    frame::quotes_from_rows(&rows)
}

/// Open a quote file as a [`FrameSource`].
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<FrameSource> {
    FrameSource::new(read_quotes(path)?)
}

/// Write a quote frame as CSV.
pub fn write_quotes<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in frame::rows_from_quotes(df)? {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
symbol,date,open,high,low,close,volume,adjusted_close
AAPL,2024-01-02,187.15,188.44,183.89,185.64,82488700,184.73
AAPL,2024-01-03,184.22,185.88,183.43,184.25,58414500,183.35
";

    #[test]
    fn test_read_rows() {
        let rows = read_rows(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[1].volume, 58_414_500);
    }

    #[test]
    fn test_read_rows_rejects_bad_date() {
        let text = "symbol,date,open,high,low,close,volume,adjusted_close\n\
                    AAPL,02/01/2024,1,1,1,1,1,1\n";
        assert!(matches!(read_rows(text.as_bytes()), Err(DataError::Csv(_))));
    }

    #[test]
    fn test_write_then_read_keeps_rows() {
        let rows = read_rows(SAMPLE.as_bytes()).unwrap();
        let df = frame::quotes_from_rows(&rows).unwrap();

        let mut buffer = Vec::new();
        write_quotes(&df, &mut buffer).unwrap();

        assert_eq!(read_rows(buffer.as_slice()).unwrap(), rows);
    }
}
