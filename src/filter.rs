//! Named row predicates.
//!
//! Charts select their rows through these instead of ad hoc literals so the
//! selection can be described, recorded as provenance and re-checked against
//! new data.

use crate::types::{Observation, NATIONAL};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    All,
    ByYear(i32),
    ExcludeNational,
    NationalOnly,
    And(Vec<RowFilter>),
}

impl RowFilter {
    pub fn all() -> Self {
        RowFilter::All
    }

    pub fn by_year(year: i32) -> Self {
        RowFilter::ByYear(year)
    }

    pub fn exclude_national() -> Self {
        RowFilter::ExcludeNational
    }

    pub fn national_only() -> Self {
        RowFilter::NationalOnly
    }

    /// Conjunction; nested conjunctions are flattened and `All` is dropped.
    pub fn and(self, other: RowFilter) -> Self {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                RowFilter::All => {}
                RowFilter::And(inner) => parts.extend(inner),
                f => parts.push(f),
            }
        }
        match parts.len() {
            0 => RowFilter::All,
            1 => parts.remove(0),
            _ => RowFilter::And(parts),
        }
    }

    pub fn matches(&self, row: &Observation) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::ByYear(y) => row.year == *y,
            RowFilter::ExcludeNational => !row.is_national(),
            RowFilter::NationalOnly => row.is_national(),
            RowFilter::And(parts) => parts.iter().all(|p| p.matches(row)),
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFilter::All => write!(f, "all rows"),
            RowFilter::ByYear(y) => write!(f, "year = {}", y),
            RowFilter::ExcludeNational => write!(f, "province != {}", NATIONAL),
            RowFilter::NationalOnly => write!(f, "province = {}", NATIONAL),
            RowFilter::And(parts) => {
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_filters_match_and_describe() {
        let f = RowFilter::by_year(2021).and(RowFilter::exclude_national());
        assert!(f.matches(&Observation::new("Aceh", 2021)));
        assert!(!f.matches(&Observation::new(NATIONAL, 2021)));
        assert!(!f.matches(&Observation::new("Aceh", 2020)));
        assert_eq!(f.to_string(), "year = 2021 and province != Indonesia");
    }

    #[test]
    fn and_flattens_and_drops_all() {
        let f = RowFilter::all()
            .and(RowFilter::national_only())
            .and(RowFilter::by_year(2010).and(RowFilter::all()));
        assert_eq!(
            f,
            RowFilter::And(vec![RowFilter::NationalOnly, RowFilter::ByYear(2010)])
        );
        assert_eq!(RowFilter::all().and(RowFilter::all()), RowFilter::All);
        assert_eq!(RowFilter::all().to_string(), "all rows");
    }
}
