// Missing-value normalization.
//
// Gaps are backward filled within each province: a missing value takes the
// value of the nearest later year that has one. Provinces never share values.
use crate::types::{BaseMetric, Dataset, Observation};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    pub column: String,
    pub filled: usize,
    /// Gaps with no later value to take from.
    pub unresolved: Vec<(String, i32)>,
    /// Provinces where the column is missing in every year.
    pub incomplete: Vec<String>,
}

pub fn backfill(dataset: &Dataset, column: BaseMetric) -> (Dataset, FillReport) {
    let mut rows: Vec<Observation> = dataset.rows().to_vec();
    let mut report = FillReport {
        column: column.column_name().to_string(),
        ..FillReport::default()
    };

    // Row indices per province, ordered by year.
    let mut by_province: BTreeMap<String, Vec<(i32, usize)>> = BTreeMap::new();
    for (i, r) in rows.iter().enumerate() {
        by_province.entry(r.province.clone()).or_default().push((r.year, i));
    }

    for (province, mut idxs) in by_province {
        idxs.sort_unstable();
        if idxs.iter().all(|&(_, i)| rows[i].get(column).is_none()) {
            warn!(province = %province, column = %report.column, "column missing in every year");
            report.incomplete.push(province.clone());
        }
        let mut next: Option<f64> = None;
        for &(year, i) in idxs.iter().rev() {
            match rows[i].get(column) {
                Some(v) => next = Some(v),
                None => match next {
                    Some(v) => {
                        rows[i].set(column, Some(v));
                        report.filled += 1;
                        debug!(province = %province, year, value = v, "backward filled");
                    }
                    None => report.unresolved.push((province.clone(), year)),
                },
            }
        }
    }
    report.unresolved.sort();

    (dataset.with_values(rows), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NATIONAL;

    fn pop(province: &str, year: i32, v: Option<f64>) -> Observation {
        let mut o = Observation::new(province, year).with(BaseMetric::MaleHdi, 70.0);
        o.population = v;
        o
    }

    #[test]
    fn fills_from_the_nearest_later_year() {
        let ds = Dataset::new(vec![
            pop("A", 2010, None),
            pop("A", 2011, None),
            pop("A", 2012, Some(120.0)),
            pop("A", 2013, Some(130.0)),
        ])
        .unwrap();
        let (out, report) = backfill(&ds, BaseMetric::Population);
        assert_eq!(out.get("A", 2010).unwrap().population, Some(120.0));
        assert_eq!(out.get("A", 2011).unwrap().population, Some(120.0));
        assert_eq!(out.get("A", 2013).unwrap().population, Some(130.0));
        assert_eq!(report.filled, 2);
        assert!(report.unresolved.is_empty());
        assert_eq!(out.get("A", 2010).unwrap().male_hdi, Some(70.0));
    }

    #[test]
    fn two_year_scenario_fills_year_one() {
        let ds = Dataset::new(vec![pop("A", 1, None), pop("A", 2, Some(100.0))]).unwrap();
        let (out, _) = backfill(&ds, BaseMetric::Population);
        assert_eq!(out.get("A", 1).unwrap().population, Some(100.0));
    }

    #[test]
    fn does_not_leak_across_provinces_or_row_order() {
        // B's value appears right after A's gap in row order.
        let ds = Dataset::new(vec![
            pop("A", 2011, None),
            pop("B", 2010, Some(50.0)),
            pop("A", 2010, Some(10.0)),
            pop("B", 2011, Some(55.0)),
        ])
        .unwrap();
        let (out, report) = backfill(&ds, BaseMetric::Population);
        assert_eq!(out.get("A", 2011).unwrap().population, None);
        assert_eq!(report.unresolved, vec![("A".to_string(), 2011)]);
        assert_eq!(report.filled, 0);
    }

    #[test]
    fn all_missing_province_is_reported_not_defaulted() {
        let ds = Dataset::new(vec![
            pop(NATIONAL, 2010, Some(1.0)),
            pop("C", 2010, None),
            pop("C", 2011, None),
        ])
        .unwrap();
        let (out, report) = backfill(&ds, BaseMetric::Population);
        assert_eq!(report.incomplete, vec!["C".to_string()]);
        assert_eq!(report.unresolved.len(), 2);
        assert_eq!(out.get("C", 2010).unwrap().population, None);
    }
}
