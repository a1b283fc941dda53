//! Master table of static per-symbol attributes.
//!
//! Unlike the features and outcomes tables the master table is keyed by
//! `symbol` alone. It is a snapshot: attaching it to a features table copies
//! today's attributes onto every historical row of the symbol.

use crate::error::Result;
use darwin_data::SecurityRecord;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Static attributes keyed by symbol
#[derive(Debug, Clone)]
pub struct MasterTable {
    records: Vec<SecurityRecord>,
}

impl MasterTable {
    /// Build from security records. Later records for a symbol replace earlier ones.
    pub fn from_records(records: &[SecurityRecord]) -> Self {
        let mut merged: Vec<SecurityRecord> = Vec::with_capacity(records.len());
        for record in records {
            match merged.iter_mut().find(|r| r.symbol == record.symbol) {
                Some(existing) => *existing = record.clone(),
                None => merged.push(record.clone()),
            }
        }
        merged.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self { records: merged }
    }

    /// The records, sorted by symbol.
    pub fn records(&self) -> &[SecurityRecord] {
        &self.records
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no symbols are present.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `[symbol, name, sector_code, shares_outstanding]`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Column::new(
                "symbol".into(),
                self.records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "name".into(),
                self.records.iter().map(|r| r.name.as_deref()).collect::<Vec<_>>(),
            ),
            Column::new(
                "sector_code".into(),
                self.records
                    .iter()
                    .map(|r| r.sector_code.map(i32::from))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "shares_outstanding".into(),
                self.records
                    .iter()
                    .map(|r| r.shares_outstanding)
                    .collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }

    /// Sector codes present, ascending.
    pub fn sector_codes(&self) -> Vec<u8> {
        self.records
            .iter()
            .filter_map(|r| r.sector_code)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One `sector_{code}` indicator column per sector present, as 0.0/1.0.
    ///
    /// Symbols without a sector get 0.0 in every column.
    pub fn sector_dummies(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(
            "symbol".into(),
            self.records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        )];
        for code in self.sector_codes() {
            let indicator: Vec<f64> = self
                .records
                .iter()
                .map(|r| if r.sector_code == Some(code) { 1.0 } else { 0.0 })
                .collect();
            columns.push(Column::new(format!("sector_{}", code).into(), indicator));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Left-join `sector_code` and `shares_outstanding` onto a table keyed by symbol.
    pub fn attach(&self, table: &DataFrame) -> Result<DataFrame> {
        let master = self
            .to_frame()?
            .lazy()
            .select([col("symbol"), col("sector_code"), col("shares_outstanding")]);
        join_on_symbol(table, master)
    }

    /// Left-join the sector indicator columns onto a table keyed by symbol.
    pub fn attach_sector_dummies(&self, table: &DataFrame) -> Result<DataFrame> {
        join_on_symbol(table, self.sector_dummies()?.lazy())
    }
}

fn join_on_symbol(table: &DataFrame, master: LazyFrame) -> Result<DataFrame> {
    crate::table::require_columns(table, &["symbol"])?;
    let joined = table
        .clone()
        .lazy()
        .join(
            master,
            [col("symbol")],
            [col("symbol")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use darwin_data::frame::column_f64;

    fn master() -> MasterTable {
        MasterTable::from_records(&[
            SecurityRecord::new("XOM").with_sector_code(10),
            SecurityRecord::new("AAPL")
                .with_sector_code(45)
                .with_shares_outstanding(15.0e9),
            SecurityRecord::new("MSFT").with_sector_code(45),
            SecurityRecord::new("AAPL")
                .with_sector_code(45)
                .with_shares_outstanding(14.0e9),
        ])
    }

    fn features() -> DataFrame {
        DataFrame::new(vec![
            Column::new("symbol".into(), ["AAPL", "AAPL", "XOM", "TSLA"]),
            Column::new("close_chg_1d".into(), [0.01, 0.02, -0.01, 0.03]),
        ])
        .unwrap()
    }

    #[test]
    fn test_later_records_win() {
        let master = master();
        assert_eq!(master.len(), 3);
        assert_eq!(master.records()[0].symbol, "AAPL");
        assert_eq!(master.records()[0].shares_outstanding, Some(14.0e9));
    }

    fn sorted(df: DataFrame) -> DataFrame {
        df.lazy()
            .sort(["symbol", "close_chg_1d"], Default::default())
            .collect()
            .unwrap()
    }

    #[test]
    fn test_attach_copies_snapshot_to_every_row() {
        let out = sorted(master().attach(&features()).unwrap());
        assert_eq!(out.height(), 4);

        // AAPL, AAPL, TSLA, XOM
        let shares = column_f64(&out, "shares_outstanding").unwrap();
        assert_eq!(shares[0], Some(14.0e9));
        assert_eq!(shares[1], Some(14.0e9));
        // Unknown symbols keep their rows
        assert_eq!(shares[2], None);
        assert_eq!(shares[3], None);
        assert_eq!(column_f64(&out, "sector_code").unwrap()[3], Some(10.0));
    }

    #[test]
    fn test_sector_dummies() {
        let master = master();
        assert_eq!(master.sector_codes(), vec![10, 45]);

        let out = sorted(master.attach_sector_dummies(&features()).unwrap());
        assert_eq!(column_f64(&out, "sector_45").unwrap()[0], Some(1.0));
        assert_eq!(column_f64(&out, "sector_10").unwrap()[0], Some(0.0));
        assert_eq!(column_f64(&out, "sector_10").unwrap()[2], None);
        assert_eq!(column_f64(&out, "sector_10").unwrap()[3], Some(1.0));
    }
}
