//! GICS level 1 sectors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GICS level 1 sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GicsSector {
    /// Energy (10)
    Energy,
    /// Materials (15)
    Materials,
    /// Industrials (20)
    Industrials,
    /// Consumer Discretionary (25)
    ConsumerDiscretionary,
    /// Consumer Staples (30)
    ConsumerStaples,
    /// Health Care (35)
    HealthCare,
    /// Financials (40)
    Financials,
    /// Information Technology (45)
    InformationTechnology,
    /// Communication Services (50)
    CommunicationServices,
    /// Utilities (55)
    Utilities,
    /// Real Estate (60)
    RealEstate,
}

/// Sector, two-digit code and display name, in code order.
const SECTORS: [(GicsSector, u8, &str); 11] = [
    (GicsSector::Energy, 10, "Energy"),
    (GicsSector::Materials, 15, "Materials"),
    (GicsSector::Industrials, 20, "Industrials"),
    (GicsSector::ConsumerDiscretionary, 25, "Consumer Discretionary"),
    (GicsSector::ConsumerStaples, 30, "Consumer Staples"),
    (GicsSector::HealthCare, 35, "Health Care"),
    (GicsSector::Financials, 40, "Financials"),
    (GicsSector::InformationTechnology, 45, "Information Technology"),
    (GicsSector::CommunicationServices, 50, "Communication Services"),
    (GicsSector::Utilities, 55, "Utilities"),
    (GicsSector::RealEstate, 60, "Real Estate"),
];

impl GicsSector {
    /// Every sector in code order.
    pub fn all() -> impl Iterator<Item = Self> {
        SECTORS.iter().map(|(sector, _, _)| *sector)
    }

    const fn entry(&self) -> (Self, u8, &'static str) {
        SECTORS[*self as usize]
    }

    /// Two-digit sector code.
    pub const fn code(&self) -> u8 {
        self.entry().1
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        self.entry().2
    }

    /// Sector for a two-digit code.
    pub fn from_code(code: u8) -> Option<Self> {
        SECTORS
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(sector, _, _)| *sector)
    }

    /// Sector for a display name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        SECTORS
            .iter()
            .find(|(_, _, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(sector, _, _)| *sector)
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_order_matches_variants() {
        for (i, sector) in GicsSector::all().enumerate() {
            assert_eq!(sector as usize, i);
        }
        assert_eq!(GicsSector::all().count(), 11);
    }

    #[rstest]
    #[case(GicsSector::Energy, 10, "Energy")]
    #[case(GicsSector::InformationTechnology, 45, "Information Technology")]
    #[case(GicsSector::RealEstate, 60, "Real Estate")]
    fn test_code_and_name(#[case] sector: GicsSector, #[case] code: u8, #[case] name: &str) {
        assert_eq!(sector.code(), code);
        assert_eq!(sector.to_string(), name);
        assert_eq!(GicsSector::from_code(code), Some(sector));
        assert_eq!(GicsSector::from_name(&name.to_lowercase()), Some(sector));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(GicsSector::from_code(99), None);
        assert_eq!(GicsSector::from_name("Crypto"), None);
    }
}
