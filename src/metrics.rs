//! Derived metric calculator.
//!
//! Every derived value is a [`Measure`]: either present at full precision or
//! explicitly missing with the reason. Nothing here relies on NaN
//! propagation and nothing rounds; rounding is a presentation concern.

use crate::filter::RowFilter;
use crate::types::{BaseMetric, Dataset, Observation};
use serde::{Serialize, Serializer};

/// Divisor turning rupiah into millions of rupiah.
pub const EPC_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gap {
    MissingOperand,
    /// Ratio with a zero denominator, kept as a gap instead of a fault.
    ZeroDenominator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Present(f64),
    Missing(Gap),
}

impl Measure {
    pub fn from_option(v: Option<f64>) -> Self {
        match v {
            Some(v) => Measure::Present(v),
            None => Measure::Missing(Gap::MissingOperand),
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Present(v) => Some(v),
            Measure::Missing(_) => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Measure::Present(_))
    }
}

// Missing values go out as `null` so the renderer can omit or annotate them.
impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Present(v) => serializer.serialize_f64(*v),
            Measure::Missing(_) => serializer.serialize_none(),
        }
    }
}

pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Measure {
    match (numerator, denominator) {
        (Some(_), Some(d)) if d == 0.0 => Measure::Missing(Gap::ZeroDenominator),
        (Some(n), Some(d)) => Measure::Present(n / d * 100.0),
        _ => Measure::Missing(Gap::MissingOperand),
    }
}

pub fn diff(a: Option<f64>, b: Option<f64>) -> Measure {
    match (a, b) {
        (Some(a), Some(b)) => Measure::Present(a - b),
        _ => Measure::Missing(Gap::MissingOperand),
    }
}

pub fn scale(value: Option<f64>, factor: f64) -> Measure {
    match value {
        Some(_) if factor == 0.0 => Measure::Missing(Gap::ZeroDenominator),
        Some(v) => Measure::Present(v / factor),
        None => Measure::Missing(Gap::MissingOperand),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    Ratio(BaseMetric, BaseMetric),
    Diff(BaseMetric, BaseMetric),
    Scale(BaseMetric, f64),
}

impl Formula {
    pub fn apply(self, row: &Observation) -> Measure {
        match self {
            Formula::Ratio(n, d) => ratio(row.get(n), row.get(d)),
            Formula::Diff(a, b) => diff(row.get(a), row.get(b)),
            Formula::Scale(c, factor) => scale(row.get(c), factor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivedMetric {
    /// Gender Development Index.
    Gdi,
    IncomeParity,
    ParliamentParity,
    ProfessionalParity,
    AsyGap,
    EsyGap,
    LeGap,
    MaleEpcMillions,
    FemaleEpcMillions,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 9] = [
        DerivedMetric::Gdi,
        DerivedMetric::IncomeParity,
        DerivedMetric::ParliamentParity,
        DerivedMetric::ProfessionalParity,
        DerivedMetric::AsyGap,
        DerivedMetric::EsyGap,
        DerivedMetric::LeGap,
        DerivedMetric::MaleEpcMillions,
        DerivedMetric::FemaleEpcMillions,
    ];

    pub fn formula(self) -> Formula {
        use BaseMetric::*;
        match self {
            DerivedMetric::Gdi => Formula::Ratio(FemaleHdi, MaleHdi),
            DerivedMetric::IncomeParity => Formula::Ratio(FemaleSi, MaleSi),
            DerivedMetric::ParliamentParity => Formula::Ratio(FemaleIp, MaleIp),
            DerivedMetric::ProfessionalParity => Formula::Ratio(FemalePp, MalePp),
            DerivedMetric::AsyGap => Formula::Diff(MaleAsy, FemaleAsy),
            DerivedMetric::EsyGap => Formula::Diff(FemaleEsy, MaleEsy),
            DerivedMetric::LeGap => Formula::Diff(FemaleLe, MaleLe),
            DerivedMetric::MaleEpcMillions => Formula::Scale(MaleEpc, EPC_SCALE),
            DerivedMetric::FemaleEpcMillions => Formula::Scale(FemaleEpc, EPC_SCALE),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DerivedMetric::Gdi => "GDI",
            DerivedMetric::IncomeParity => "SI_parity",
            DerivedMetric::ParliamentParity => "IP_parity",
            DerivedMetric::ProfessionalParity => "PP_parity",
            DerivedMetric::AsyGap => "ASY_diff",
            DerivedMetric::EsyGap => "ESY_diff",
            DerivedMetric::LeGap => "LE_diff",
            DerivedMetric::MaleEpcMillions => "MaleEPC_millions",
            DerivedMetric::FemaleEpcMillions => "FemaleEPC_millions",
        }
    }
}

/// Anything that can be evaluated on a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Base(BaseMetric),
    Derived(DerivedMetric),
}

impl Metric {
    pub fn evaluate(self, row: &Observation) -> Measure {
        match self {
            Metric::Base(m) => Measure::from_option(row.get(m)),
            Metric::Derived(m) => m.formula().apply(row),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Base(m) => m.column_name(),
            Metric::Derived(m) => m.name(),
        }
    }
}

impl From<BaseMetric> for Metric {
    fn from(m: BaseMetric) -> Self {
        Metric::Base(m)
    }
}

impl From<DerivedMetric> for Metric {
    fn from(m: DerivedMetric) -> Self {
        Metric::Derived(m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedMeasure {
    pub province: String,
    pub year: i32,
    pub value: Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedColumn {
    pub name: String,
    pub filter: String,
    pub values: Vec<KeyedMeasure>,
}

impl DerivedColumn {
    pub fn gaps(&self) -> usize {
        self.values.iter().filter(|v| !v.value.is_present()).count()
    }
}

/// Evaluate `metric` row-wise over the rows selected by `filter`.
pub fn derive(dataset: &Dataset, metric: Metric, filter: &RowFilter) -> DerivedColumn {
    let values = dataset
        .select(filter)
        .map(|row| KeyedMeasure {
            province: row.province.clone(),
            year: row.year,
            value: metric.evaluate(row),
        })
        .collect();
    DerivedColumn {
        name: metric.name().to_string(),
        filter: filter.to_string(),
        values,
    }
}

/// Every derived metric over every row, for export.
pub fn derive_all(dataset: &Dataset) -> Vec<DerivedColumn> {
    let filter = RowFilter::all();
    DerivedMetric::ALL
        .iter()
        .map(|m| derive(dataset, Metric::Derived(*m), &filter))
        .collect()
}
