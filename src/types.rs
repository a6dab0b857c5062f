use crate::error::{Error, Result};
use crate::filter::RowFilter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tabled::Tabled;

/// Province value of the pre-aggregated country-wide row.
pub const NATIONAL: &str = "Indonesia";
pub const FIRST_YEAR: i32 = 2010;
pub const LAST_YEAR: i32 = 2021;

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Province")]
    pub province: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Population")]
    pub population: Option<String>,
    #[serde(rename = "MaleHDI")]
    pub male_hdi: Option<String>,
    #[serde(rename = "FemaleHDI")]
    pub female_hdi: Option<String>,
    #[serde(rename = "MaleLE")]
    pub male_le: Option<String>,
    #[serde(rename = "FemaleLE")]
    pub female_le: Option<String>,
    #[serde(rename = "MaleASY")]
    pub male_asy: Option<String>,
    #[serde(rename = "FemaleASY")]
    pub female_asy: Option<String>,
    #[serde(rename = "MaleESY")]
    pub male_esy: Option<String>,
    #[serde(rename = "FemaleESY")]
    pub female_esy: Option<String>,
    #[serde(rename = "MaleEPC")]
    pub male_epc: Option<String>,
    #[serde(rename = "FemaleEPC")]
    pub female_epc: Option<String>,
    #[serde(rename = "GEM")]
    pub gem: Option<String>,
    #[serde(rename = "MaleSI")]
    pub male_si: Option<String>,
    #[serde(rename = "FemaleSI")]
    pub female_si: Option<String>,
    #[serde(rename = "MaleIP")]
    pub male_ip: Option<String>,
    #[serde(rename = "FemaleIP")]
    pub female_ip: Option<String>,
    #[serde(rename = "MalePP")]
    pub male_pp: Option<String>,
    #[serde(rename = "FemalePP")]
    pub female_pp: Option<String>,
}

/// Columns read straight from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseMetric {
    Population,
    MaleHdi,
    FemaleHdi,
    MaleLe,
    FemaleLe,
    MaleAsy,
    FemaleAsy,
    MaleEsy,
    FemaleEsy,
    MaleEpc,
    FemaleEpc,
    Gem,
    MaleSi,
    FemaleSi,
    MaleIp,
    FemaleIp,
    MalePp,
    FemalePp,
}

impl BaseMetric {
    /// Header of the column in the source CSV.
    pub fn column_name(self) -> &'static str {
        match self {
            BaseMetric::Population => "Population",
            BaseMetric::MaleHdi => "MaleHDI",
            BaseMetric::FemaleHdi => "FemaleHDI",
            BaseMetric::MaleLe => "MaleLE",
            BaseMetric::FemaleLe => "FemaleLE",
            BaseMetric::MaleAsy => "MaleASY",
            BaseMetric::FemaleAsy => "FemaleASY",
            BaseMetric::MaleEsy => "MaleESY",
            BaseMetric::FemaleEsy => "FemaleESY",
            BaseMetric::MaleEpc => "MaleEPC",
            BaseMetric::FemaleEpc => "FemaleEPC",
            BaseMetric::Gem => "GEM",
            BaseMetric::MaleSi => "MaleSI",
            BaseMetric::FemaleSi => "FemaleSI",
            BaseMetric::MaleIp => "MaleIP",
            BaseMetric::FemaleIp => "FemaleIP",
            BaseMetric::MalePp => "MalePP",
            BaseMetric::FemalePp => "FemalePP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Observation {
    pub province: String,
    pub year: i32,
    pub population: Option<f64>,
    pub male_hdi: Option<f64>,
    pub female_hdi: Option<f64>,
    pub male_le: Option<f64>,
    pub female_le: Option<f64>,
    pub male_asy: Option<f64>,
    pub female_asy: Option<f64>,
    pub male_esy: Option<f64>,
    pub female_esy: Option<f64>,
    pub male_epc: Option<f64>,
    pub female_epc: Option<f64>,
    pub gem: Option<f64>,
    pub male_si: Option<f64>,
    pub female_si: Option<f64>,
    pub male_ip: Option<f64>,
    pub female_ip: Option<f64>,
    pub male_pp: Option<f64>,
    pub female_pp: Option<f64>,
}

impl Observation {
    pub fn new(province: impl Into<String>, year: i32) -> Self {
        Self {
            province: province.into(),
            year,
            ..Self::default()
        }
    }

    pub fn is_national(&self) -> bool {
        self.province == NATIONAL
    }

    pub fn get(&self, metric: BaseMetric) -> Option<f64> {
        match metric {
            BaseMetric::Population => self.population,
            BaseMetric::MaleHdi => self.male_hdi,
            BaseMetric::FemaleHdi => self.female_hdi,
            BaseMetric::MaleLe => self.male_le,
            BaseMetric::FemaleLe => self.female_le,
            BaseMetric::MaleAsy => self.male_asy,
            BaseMetric::FemaleAsy => self.female_asy,
            BaseMetric::MaleEsy => self.male_esy,
            BaseMetric::FemaleEsy => self.female_esy,
            BaseMetric::MaleEpc => self.male_epc,
            BaseMetric::FemaleEpc => self.female_epc,
            BaseMetric::Gem => self.gem,
            BaseMetric::MaleSi => self.male_si,
            BaseMetric::FemaleSi => self.female_si,
            BaseMetric::MaleIp => self.male_ip,
            BaseMetric::FemaleIp => self.female_ip,
            BaseMetric::MalePp => self.male_pp,
            BaseMetric::FemalePp => self.female_pp,
        }
    }

    pub fn set(&mut self, metric: BaseMetric, value: Option<f64>) {
        let slot = match metric {
            BaseMetric::Population => &mut self.population,
            BaseMetric::MaleHdi => &mut self.male_hdi,
            BaseMetric::FemaleHdi => &mut self.female_hdi,
            BaseMetric::MaleLe => &mut self.male_le,
            BaseMetric::FemaleLe => &mut self.female_le,
            BaseMetric::MaleAsy => &mut self.male_asy,
            BaseMetric::FemaleAsy => &mut self.female_asy,
            BaseMetric::MaleEsy => &mut self.male_esy,
            BaseMetric::FemaleEsy => &mut self.female_esy,
            BaseMetric::MaleEpc => &mut self.male_epc,
            BaseMetric::FemaleEpc => &mut self.female_epc,
            BaseMetric::Gem => &mut self.gem,
            BaseMetric::MaleSi => &mut self.male_si,
            BaseMetric::FemaleSi => &mut self.female_si,
            BaseMetric::MaleIp => &mut self.male_ip,
            BaseMetric::FemaleIp => &mut self.female_ip,
            BaseMetric::MalePp => &mut self.male_pp,
            BaseMetric::FemalePp => &mut self.female_pp,
        };
        *slot = value;
    }

    /// Builder used by fixtures and the loader.
    pub fn with(mut self, metric: BaseMetric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

/// Immutable observation table keyed by (province, year).
///
/// Rows keep their load order; provinces are reported in first-seen order,
/// which is also the order colors are handed out in.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<Observation>,
    index: BTreeMap<(String, i32), usize>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate (province, year) keys.
    pub fn new(rows: Vec<Observation>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            let key = (row.province.clone(), row.year);
            if index.insert(key, i).is_some() {
                return Err(Error::DuplicateKey {
                    province: row.province.clone(),
                    year: row.year,
                });
            }
        }
        Ok(Self { rows, index })
    }

    /// Swap in rows carrying the same keys in the same order.
    pub(crate) fn with_values(&self, rows: Vec<Observation>) -> Self {
        debug_assert!(rows
            .iter()
            .zip(&self.rows)
            .all(|(a, b)| a.province == b.province && a.year == b.year));
        Self {
            rows,
            index: self.index.clone(),
        }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, province: &str, year: i32) -> Option<&Observation> {
        self.index
            .get(&(province.to_string(), year))
            .map(|&i| &self.rows[i])
    }

    /// Rows matching a named predicate, in load order.
    pub fn select<'a>(&'a self, filter: &'a RowFilter) -> impl Iterator<Item = &'a Observation> + 'a {
        self.rows.iter().filter(move |r| filter.matches(r))
    }

    /// Distinct provinces in first-seen order, national row included.
    pub fn provinces(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.province.as_str()))
            .map(|r| r.province.as_str())
            .collect()
    }

    /// Distinct provinces excluding the national aggregate.
    pub fn regional_provinces(&self) -> Vec<&str> {
        self.provinces()
            .into_iter()
            .filter(|p| *p != NATIONAL)
            .collect()
    }

    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.rows.iter().map(|r| r.year).collect();
        years.into_iter().collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.rows.iter().map(|r| r.year).max()
    }

    /// Year for ranked charts and narrative counts: the override when given,
    /// otherwise the latest year present.
    pub fn resolve_year(&self, requested: Option<i32>) -> Result<i32> {
        match requested {
            Some(year) if !(FIRST_YEAR..=LAST_YEAR).contains(&year) => Err(Error::not_found(format!(
                "year {} is outside {}-{}",
                year, FIRST_YEAR, LAST_YEAR
            ))),
            Some(year) if self.rows.iter().all(|r| r.year != year) => {
                Err(Error::not_found(format!("no observations for year {}", year)))
            }
            Some(year) => Ok(year),
            None => self
                .latest_year()
                .ok_or_else(|| Error::missing_input("dataset has no years")),
        }
    }

    /// (province, year) pairs absent from the table for non-national
    /// provinces, over the whole FIRST_YEAR..=LAST_YEAR range.
    pub fn missing_keys(&self) -> Vec<(String, i32)> {
        let mut missing = Vec::new();
        for province in self.regional_provinces() {
            for year in FIRST_YEAR..=LAST_YEAR {
                if self.get(province, year).is_none() {
                    missing.push((province.to_string(), year));
                }
            }
        }
        missing
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NarrativeRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "National")]
    #[tabled(rename = "National")]
    pub national: String,
    #[serde(rename = "Above")]
    #[tabled(rename = "Above")]
    pub above: usize,
    #[serde(rename = "Below")]
    #[tabled(rename = "Below")]
    pub below: usize,
    #[serde(rename = "Equal")]
    #[tabled(rename = "Equal")]
    pub equal: usize,
    #[serde(rename = "Missing")]
    #[tabled(rename = "Missing")]
    pub missing: usize,
    #[serde(rename = "Highest")]
    #[tabled(rename = "Highest")]
    pub highest: String,
    #[serde(rename = "Lowest")]
    #[tabled(rename = "Lowest")]
    pub lowest: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChartRow {
    #[tabled(rename = "Chart")]
    pub id: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Series")]
    pub series: usize,
    #[tabled(rename = "Points")]
    pub points: usize,
    #[tabled(rename = "Gaps")]
    pub gaps: usize,
    #[tabled(rename = "Rows")]
    pub provenance: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_rows: usize,
    pub total_provinces: usize,
    pub first_year: Option<i32>,
    pub latest_year: Option<i32>,
    pub population_filled: usize,
    pub population_unresolved: usize,
    pub total_charts: usize,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(province: &str, year: i32) -> Observation {
        Observation::new(province, year)
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = Dataset::new(vec![obs("Aceh", 2010), obs("Aceh", 2010)]).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { year: 2010, .. }));
    }

    #[test]
    fn provinces_keep_first_seen_order() {
        let ds = Dataset::new(vec![
            obs("Bali", 2010),
            obs(NATIONAL, 2010),
            obs("Aceh", 2010),
            obs("Bali", 2011),
        ])
        .unwrap();
        assert_eq!(ds.provinces(), vec!["Bali", NATIONAL, "Aceh"]);
        assert_eq!(ds.regional_provinces(), vec!["Bali", "Aceh"]);
        assert_eq!(ds.latest_year(), Some(2011));
    }

    #[test]
    fn missing_keys_lists_gaps_for_regional_rows_only() {
        let mut rows: Vec<Observation> = (FIRST_YEAR..=LAST_YEAR).map(|y| obs("Bali", y)).collect();
        rows.extend((2011..=LAST_YEAR).map(|y| obs("Aceh", y)));
        rows.push(obs(NATIONAL, 2011));
        let ds = Dataset::new(rows).unwrap();
        assert_eq!(ds.missing_keys(), vec![("Aceh".to_string(), 2010)]);
    }

    #[test]
    fn year_absent_for_every_province_is_still_missing() {
        let rows = ["A", "B"]
            .iter()
            .flat_map(|p| (FIRST_YEAR..=LAST_YEAR).filter(|y| *y != 2011).map(move |y| obs(p, y)))
            .collect();
        let ds = Dataset::new(rows).unwrap();
        assert!(!ds.years().contains(&2011));
        assert_eq!(
            ds.missing_keys(),
            vec![("A".to_string(), 2011), ("B".to_string(), 2011)]
        );
    }

    #[test]
    fn resolve_year_checks_the_override() {
        let ds = Dataset::new(vec![obs("A", 2019), obs("A", 2021)]).unwrap();
        assert_eq!(ds.resolve_year(None).unwrap(), 2021);
        assert_eq!(ds.resolve_year(Some(2019)).unwrap(), 2019);
        assert!(matches!(ds.resolve_year(Some(2020)), Err(Error::NotFound(_))));
        assert!(matches!(ds.resolve_year(Some(2201)), Err(Error::NotFound(_))));
    }

    #[test]
    fn get_and_set_cover_every_column() {
        let mut o = obs("Aceh", 2010);
        o.set(BaseMetric::FemalePp, Some(41.5));
        assert_eq!(o.get(BaseMetric::FemalePp), Some(41.5));
        assert_eq!(o.get(BaseMetric::MalePp), None);
        assert_eq!(BaseMetric::FemalePp.column_name(), "FemalePP");
    }
}
