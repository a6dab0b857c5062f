//! National references, threshold counts and provincial rankings.
//!
//! Counting is strict on both sides: a province exactly equal to the
//! threshold is neither above nor below it and only shows up in
//! [`count_equal`]. Provinces missing the metric are in none of the three.

use crate::error::{Error, Result};
use crate::filter::RowFilter;
use crate::metrics::Metric;
use crate::types::{Dataset, NATIONAL};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub province: String,
    pub value: f64,
    pub is_national: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub metric: String,
    pub year: i32,
    pub direction: Direction,
    pub entries: Vec<RankEntry>,
    /// Provinces with no value for the metric that year, sorted by name.
    pub missing: Vec<String>,
}

impl Ranking {
    pub fn first(&self) -> Option<&RankEntry> {
        self.entries.iter().find(|e| !e.is_national)
    }

    pub fn last(&self) -> Option<&RankEntry> {
        self.entries.iter().rev().find(|e| !e.is_national)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Comparison {
    pub above: usize,
    pub below: usize,
    pub equal: usize,
    pub missing: usize,
}

impl Comparison {
    pub fn total(&self) -> usize {
        self.above + self.below + self.equal + self.missing
    }
}

/// Value of `metric` on the national row for `year`.
pub fn national_reference(dataset: &Dataset, metric: Metric, year: i32) -> Result<f64> {
    let row = dataset
        .get(NATIONAL, year)
        .ok_or_else(|| Error::not_found(format!("no {} row for {}", NATIONAL, year)))?;
    metric.evaluate(row).value().ok_or_else(|| {
        Error::incomplete(format!("{} missing for {} in {}", metric.name(), NATIONAL, year))
    })
}

/// Partition the provinces (national row excluded) against `threshold`.
pub fn compare_to(dataset: &Dataset, metric: Metric, year: i32, threshold: f64) -> Comparison {
    let filter = RowFilter::by_year(year).and(RowFilter::exclude_national());
    let mut cmp = Comparison::default();
    for row in dataset.select(&filter) {
        match metric.evaluate(row).value() {
            None => cmp.missing += 1,
            Some(v) if v > threshold => cmp.above += 1,
            Some(v) if v < threshold => cmp.below += 1,
            Some(_) => cmp.equal += 1,
        }
    }
    cmp
}

pub fn count_above(dataset: &Dataset, metric: Metric, year: i32, threshold: f64) -> usize {
    compare_to(dataset, metric, year, threshold).above
}

pub fn count_below(dataset: &Dataset, metric: Metric, year: i32, threshold: f64) -> usize {
    compare_to(dataset, metric, year, threshold).below
}

pub fn count_equal(dataset: &Dataset, metric: Metric, year: i32, threshold: f64) -> usize {
    compare_to(dataset, metric, year, threshold).equal
}

/// Order every row of `year` by `metric`, ties broken by province name.
///
/// The national row is kept and flagged so ranked bars can draw it as the
/// reference bar.
pub fn rank(dataset: &Dataset, metric: Metric, year: i32, direction: Direction) -> Ranking {
    let filter = RowFilter::by_year(year);
    let mut entries = Vec::new();
    let mut missing = Vec::new();
    for row in dataset.select(&filter) {
        match metric.evaluate(row).value() {
            Some(value) => entries.push(RankEntry {
                province: row.province.clone(),
                value,
                is_national: row.is_national(),
            }),
            None => missing.push(row.province.clone()),
        }
    }
    entries.sort_by(|a, b| {
        let by_value = match direction {
            Direction::Descending => b.value.partial_cmp(&a.value),
            Direction::Ascending => a.value.partial_cmp(&b.value),
        };
        by_value
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.province.cmp(&b.province))
    });
    missing.sort();
    Ranking {
        metric: metric.name().to_string(),
        year,
        direction,
        entries,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DerivedMetric;
    use crate::types::{BaseMetric, Observation};

    fn gem_table(values: &[(&str, Option<f64>)], national: Option<f64>) -> Dataset {
        let mut rows: Vec<Observation> = values
            .iter()
            .map(|(p, v)| {
                let mut o = Observation::new(*p, 2021);
                o.gem = *v;
                o
            })
            .collect();
        if let Some(n) = national {
            rows.push(Observation::new(NATIONAL, 2021).with(BaseMetric::Gem, n));
        }
        Dataset::new(rows).unwrap()
    }

    #[test]
    fn national_reference_reads_the_national_row() {
        let ds = gem_table(&[("Aceh", Some(60.0))], Some(75.0));
        let v = national_reference(&ds, BaseMetric::Gem.into(), 2021).unwrap();
        assert_eq!(v, 75.0);
    }

    #[test]
    fn national_reference_not_found_without_row() {
        let ds = gem_table(&[("Aceh", Some(60.0))], None);
        let err = national_reference(&ds, BaseMetric::Gem.into(), 2021).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = national_reference(&ds, BaseMetric::Gem.into(), 2019).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn national_reference_with_missing_value_is_incomplete() {
        let ds = gem_table(&[("Aceh", Some(60.0))], Some(75.0));
        let err = national_reference(&ds, BaseMetric::MaleHdi.into(), 2021).unwrap_err();
        assert!(matches!(err, Error::IncompleteSeries(_)));
    }

    #[test]
    fn ties_are_excluded_from_above_and_below() {
        let ds = gem_table(
            &[
                ("A", Some(80.0)),
                ("B", Some(75.0)),
                ("C", Some(70.0)),
                ("D", Some(75.0)),
                ("E", None),
            ],
            Some(75.0),
        );
        let metric = BaseMetric::Gem.into();
        let reference = national_reference(&ds, metric, 2021).unwrap();
        assert_eq!(count_above(&ds, metric, 2021, reference), 1);
        assert_eq!(count_below(&ds, metric, 2021, reference), 1);
        assert_eq!(count_equal(&ds, metric, 2021, reference), 2);
        let cmp = compare_to(&ds, metric, 2021, reference);
        assert_eq!(cmp.missing, 1);
        assert_eq!(cmp.total(), ds.regional_provinces().len());
    }

    #[test]
    fn counts_partition_all_provinces() {
        let values: Vec<(String, Option<f64>)> = (0..34)
            .map(|i| (format!("P{:02}", i), Some(50.0 + (i % 7) as f64 * 5.0)))
            .collect();
        let refs: Vec<(&str, Option<f64>)> =
            values.iter().map(|(p, v)| (p.as_str(), *v)).collect();
        let ds = gem_table(&refs, Some(65.0));
        let metric = BaseMetric::Gem.into();
        let t = national_reference(&ds, metric, 2021).unwrap();
        let sum = count_above(&ds, metric, 2021, t)
            + count_below(&ds, metric, 2021, t)
            + count_equal(&ds, metric, 2021, t);
        assert_eq!(sum, 34);
    }

    #[test]
    fn rank_is_monotonic_with_lexicographic_ties() {
        let ds = gem_table(
            &[
                ("Riau", Some(70.0)),
                ("Bali", Some(80.0)),
                ("Aceh", Some(70.0)),
                ("Jambi", None),
            ],
            Some(72.0),
        );
        let r = rank(&ds, BaseMetric::Gem.into(), 2021, Direction::Descending);
        let names: Vec<&str> = r.entries.iter().map(|e| e.province.as_str()).collect();
        assert_eq!(names, vec!["Bali", NATIONAL, "Aceh", "Riau"]);
        assert!(r.entries.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(r.missing, vec!["Jambi".to_string()]);
        assert_eq!(r.first().unwrap().province, "Bali");
        assert_eq!(r.last().unwrap().province, "Riau");

        let asc = rank(&ds, BaseMetric::Gem.into(), 2021, Direction::Ascending);
        let names: Vec<&str> = asc.entries.iter().map(|e| e.province.as_str()).collect();
        assert_eq!(names, vec!["Aceh", "Riau", NATIONAL, "Bali"]);
    }

    #[test]
    fn two_province_gdi_ranking() {
        let row = |p: &str, year: i32, m: f64, f: f64| {
            Observation::new(p, year)
                .with(BaseMetric::MaleHdi, m)
                .with(BaseMetric::FemaleHdi, f)
        };
        let ds = Dataset::new(vec![
            row("A", 1, 80.0, 70.0),
            row("A", 2, 82.0, 75.0),
            row("B", 1, 90.0, 85.0),
            row("B", 2, 91.0, 87.0),
        ])
        .unwrap();
        let r = rank(&ds, DerivedMetric::Gdi.into(), 2, Direction::Descending);
        let names: Vec<&str> = r.entries.iter().map(|e| e.province.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        approx::assert_relative_eq!(r.entries[1].value, 75.0 / 82.0 * 100.0, epsilon = 1e-9);
        approx::assert_relative_eq!(r.entries[0].value, 87.0 / 91.0 * 100.0, epsilon = 1e-9);
    }
}
