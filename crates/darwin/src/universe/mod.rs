//! Stock universes.
//!
//! A universe is the list of symbols a run fetches and models, each with a
//! GICS sector when known. Its security records seed the master table.

pub mod default;
pub mod gics;

pub use default::{DefaultUniverse, ListUniverse};
pub use gics::GicsSector;

use darwin_data::SecurityRecord;

/// Universe member with its sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    /// Stock symbol.
    pub symbol: String,
    /// GICS sector, if known.
    pub sector: Option<GicsSector>,
}

impl Constituent {
    /// Create a new constituent.
    pub fn new(symbol: impl Into<String>, sector: Option<GicsSector>) -> Self {
        Self {
            symbol: symbol.into(),
            sector,
        }
    }
}

/// Trait for stock universes.
pub trait Universe {
    /// All members.
    fn constituents(&self) -> Vec<Constituent>;

    /// All symbols, in universe order.
    fn symbols(&self) -> Vec<String> {
        self.constituents().into_iter().map(|c| c.symbol).collect()
    }

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.constituents().iter().any(|c| c.symbol == symbol)
    }

    /// Number of members.
    fn size(&self) -> usize {
        self.constituents().len()
    }

    /// Sector of a member.
    fn sector(&self, symbol: &str) -> Option<GicsSector> {
        self.constituents()
            .into_iter()
            .find(|c| c.symbol == symbol)
            .and_then(|c| c.sector)
    }

    /// Security master records carrying each member's sector code.
    fn security_records(&self) -> Vec<SecurityRecord> {
        self.constituents()
            .into_iter()
            .map(|c| match c.sector {
                Some(sector) => SecurityRecord::new(c.symbol).with_sector_code(sector.code()),
                None => SecurityRecord::new(c.symbol),
            })
            .collect()
    }
}
