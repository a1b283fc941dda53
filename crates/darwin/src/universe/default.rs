//! Built-in universes.

use super::{Constituent, GicsSector, Universe};

/// Three liquid large caps per sector.
const DEFAULT_MEMBERS: [(&str, GicsSector); 33] = [
    ("XOM", GicsSector::Energy),
    ("CVX", GicsSector::Energy),
    ("COP", GicsSector::Energy),
    ("LIN", GicsSector::Materials),
    ("SHW", GicsSector::Materials),
    ("APD", GicsSector::Materials),
    ("CAT", GicsSector::Industrials),
    ("HON", GicsSector::Industrials),
    ("UNP", GicsSector::Industrials),
    ("AMZN", GicsSector::ConsumerDiscretionary),
    ("HD", GicsSector::ConsumerDiscretionary),
    ("MCD", GicsSector::ConsumerDiscretionary),
    ("PG", GicsSector::ConsumerStaples),
    ("KO", GicsSector::ConsumerStaples),
    ("WMT", GicsSector::ConsumerStaples),
    ("JNJ", GicsSector::HealthCare),
    ("UNH", GicsSector::HealthCare),
    ("MRK", GicsSector::HealthCare),
    ("JPM", GicsSector::Financials),
    ("BAC", GicsSector::Financials),
    ("GS", GicsSector::Financials),
    ("AAPL", GicsSector::InformationTechnology),
    ("MSFT", GicsSector::InformationTechnology),
    ("NVDA", GicsSector::InformationTechnology),
    ("GOOGL", GicsSector::CommunicationServices),
    ("META", GicsSector::CommunicationServices),
    ("VZ", GicsSector::CommunicationServices),
    ("NEE", GicsSector::Utilities),
    ("DUK", GicsSector::Utilities),
    ("SO", GicsSector::Utilities),
    ("PLD", GicsSector::RealEstate),
    ("AMT", GicsSector::RealEstate),
    ("O", GicsSector::RealEstate),
];

/// The default universe: 33 large caps covering all 11 GICS sectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUniverse;

impl DefaultUniverse {
    /// Create the default universe.
    pub const fn new() -> Self {
        Self
    }

    /// Sector of a default member.
    pub fn lookup(symbol: &str) -> Option<GicsSector> {
        DEFAULT_MEMBERS
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, sector)| *sector)
    }
}

impl Universe for DefaultUniverse {
    fn constituents(&self) -> Vec<Constituent> {
        DEFAULT_MEMBERS
            .iter()
            .map(|(symbol, sector)| Constituent::new(*symbol, Some(*sector)))
            .collect()
    }
}

/// A user-supplied symbol list. Sectors come from the default table when known.
#[derive(Debug, Clone)]
pub struct ListUniverse {
    symbols: Vec<String>,
}

impl ListUniverse {
    /// Upper-cased, de-duplicated symbols in the given order.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if !symbol.is_empty() && !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        Self { symbols: unique }
    }
}

impl Universe for ListUniverse {
    fn constituents(&self) -> Vec<Constituent> {
        self.symbols
            .iter()
            .map(|s| Constituent::new(s.clone(), DefaultUniverse::lookup(s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_covers_every_sector() {
        let universe = DefaultUniverse::new();
        assert_eq!(universe.size(), 33);

        let sectors: HashSet<GicsSector> = universe
            .constituents()
            .into_iter()
            .filter_map(|c| c.sector)
            .collect();
        assert_eq!(sectors.len(), 11);
    }

    #[test]
    fn test_default_has_no_duplicates() {
        let symbols = DefaultUniverse.symbols();
        let unique: HashSet<&String> = symbols.iter().collect();
        assert_eq!(unique.len(), symbols.len());
    }

    #[test]
    fn test_universe_trait() {
        let universe = DefaultUniverse;
        assert!(universe.contains("AAPL"));
        assert!(!universe.contains("NOTREAL"));
        assert_eq!(universe.sector("XOM"), Some(GicsSector::Energy));
    }

    #[test]
    fn test_list_universe() {
        let universe = ListUniverse::new(&["aapl", " TSLA ", "AAPL", ""]);
        assert_eq!(universe.symbols(), vec!["AAPL", "TSLA"]);
        assert_eq!(universe.sector("AAPL"), Some(GicsSector::InformationTechnology));
        assert_eq!(universe.sector("TSLA"), None);
    }

    #[test]
    fn test_security_records() {
        let records = ListUniverse::new(&["JPM", "TSLA"]).security_records();
        assert_eq!(records[0].sector_code, Some(40));
        assert_eq!(records[1].sector_code, None);
    }
}
