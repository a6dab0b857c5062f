use crate::charts::ChartBundle;
use crate::loader::LoadReport;
use crate::metrics::{DerivedMetric, Metric};
use crate::normalize::FillReport;
use crate::ranking::{compare_to, national_reference, rank, Comparison, Direction, RankEntry};
use crate::types::{BaseMetric, Dataset, NarrativeRow, SummaryStats};
use crate::util::format_number;
use tracing::debug;

/// Metrics the prose compares against the national value.
pub const HEADLINE_METRICS: [Metric; 6] = [
    Metric::Derived(DerivedMetric::Gdi),
    Metric::Base(BaseMetric::Gem),
    Metric::Base(BaseMetric::FemaleSi),
    Metric::Base(BaseMetric::FemaleIp),
    Metric::Base(BaseMetric::FemalePp),
    Metric::Derived(DerivedMetric::AsyGap),
];

/// National comparison facts for one metric and year.
///
/// A metric without a national value still gets a row: the counts stay at
/// zero and the national column reads `n/a`, so the gap is visible instead
/// of being dropped.
pub fn narrative_row(dataset: &Dataset, metric: Metric, year: i32) -> NarrativeRow {
    let (national, cmp) = match national_reference(dataset, metric, year) {
        Ok(v) => (format_number(v, 2), compare_to(dataset, metric, year, v)),
        Err(e) => {
            debug!(metric = metric.name(), error = %e, "no national reference");
            ("n/a".to_string(), Comparison::default())
        }
    };
    let ranking = rank(dataset, metric, year, Direction::Descending);
    let label = |e: Option<&RankEntry>| match e {
        Some(e) => format!("{} ({})", e.province, format_number(e.value, 2)),
        None => "n/a".to_string(),
    };
    NarrativeRow {
        metric: metric.name().to_string(),
        year,
        national,
        above: cmp.above,
        below: cmp.below,
        equal: cmp.equal,
        missing: cmp.missing,
        highest: label(ranking.first()),
        lowest: label(ranking.last()),
    }
}

pub fn generate_narrative(dataset: &Dataset, year: i32) -> Vec<NarrativeRow> {
    HEADLINE_METRICS
        .iter()
        .map(|m| narrative_row(dataset, *m, year))
        .collect()
}

pub fn generate_summary(
    dataset: &Dataset,
    load: &LoadReport,
    fill: &FillReport,
    bundle: &ChartBundle,
) -> SummaryStats {
    let mut warnings: Vec<String> = load
        .missing_keys
        .iter()
        .map(|(p, y)| format!("no observation for {} in {}", p, y))
        .collect();
    warnings.extend(
        fill.unresolved
            .iter()
            .map(|(p, y)| format!("{} still missing for {} in {}", fill.column, p, y)),
    );
    warnings.extend(bundle.warnings.iter().cloned());
    let years = dataset.years();
    SummaryStats {
        total_rows: dataset.len(),
        total_provinces: dataset.regional_provinces().len(),
        first_year: years.first().copied(),
        latest_year: years.last().copied(),
        population_filled: fill.filled,
        population_unresolved: fill.unresolved.len(),
        total_charts: bundle.charts.len(),
        warnings,
    }
}

/// Sentence form of a narrative row, e.g. for the GEM section.
pub fn describe(row: &NarrativeRow) -> String {
    let measured = row.above + row.below + row.equal;
    if measured == 0 {
        return format!("{} ({}): no provincial comparison available.", row.metric, row.year);
    }
    format!(
        "{} ({}): national value {}; {} of {} provinces above, {} below{}.",
        row.metric,
        row.year,
        row.national,
        row.above,
        measured,
        row.below,
        if row.equal > 0 {
            format!(", {} equal", row.equal)
        } else {
            String::new()
        }
    )
}
