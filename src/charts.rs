//! Chart data assembler.
//!
//! Shapes the dataset into one [`ChartSpec`] per dashboard visualization.
//! Nothing here touches the filesystem or a renderer; every map is ordered
//! so the same dataset always serializes to the same bytes.

use crate::error::{Error, Result};
use crate::filter::RowFilter;
use crate::loader::BoundaryIndex;
use crate::metrics::{DerivedMetric, Measure, Metric};
use crate::palette::{ColorAssignment, FEMALE_COLOR, INDEX_COLOR, MALE_COLOR};
use crate::ranking::{national_reference, rank, Direction};
use crate::types::{BaseMetric, ChartRow, Dataset, Observation, NATIONAL};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    HdiGdiTrend,
    GdiMap,
    GdiRanked,
    LifeExpectancyBubble,
    SchoolingBars,
    AsyGapTrend,
    AsyGapRanked,
    ExpenditureTrend,
    ExpenditureBubble,
    GemTrend,
    GemMap,
    GemRanked,
    IncomeShareStacked,
    IncomeShareRanked,
    ParliamentStacked,
    ParliamentRanked,
    ProfessionalStacked,
    ProfessionalRanked,
}

impl ChartId {
    pub fn slug(self) -> &'static str {
        match self {
            ChartId::HdiGdiTrend => "hdi-gdi-trend",
            ChartId::GdiMap => "gdi-map",
            ChartId::GdiRanked => "gdi-ranked",
            ChartId::LifeExpectancyBubble => "life-expectancy-bubble",
            ChartId::SchoolingBars => "schooling-bars",
            ChartId::AsyGapTrend => "asy-gap-trend",
            ChartId::AsyGapRanked => "asy-gap-ranked",
            ChartId::ExpenditureTrend => "expenditure-trend",
            ChartId::ExpenditureBubble => "expenditure-bubble",
            ChartId::GemTrend => "gem-trend",
            ChartId::GemMap => "gem-map",
            ChartId::GemRanked => "gem-ranked",
            ChartId::IncomeShareStacked => "income-share-stacked",
            ChartId::IncomeShareRanked => "income-share-ranked",
            ChartId::ParliamentStacked => "parliament-stacked",
            ChartId::ParliamentRanked => "parliament-ranked",
            ChartId::ProfessionalStacked => "professional-stacked",
            ChartId::ProfessionalRanked => "professional-ranked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    BarLineCombo,
    GroupedBar,
    Line,
    Bubble,
    Choropleth,
    RankedBar,
    StackedBar,
}

/// How the renderer should print values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatHint {
    /// Index value, two decimals.
    Index,
    Percent,
    Years,
    /// Already divided down to millions of rupiah.
    Millions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub province: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Measure>,
    pub y: Measure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Measure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub format: FormatHint,
    pub animated: bool,
    /// Row selection the series were built from.
    pub provenance: String,
    /// Color scale for maps, y axis for everything else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<[f64; 2]>,
    /// Dotted `y = x` line marking equal female and male values.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub parity_line: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    pub colors: BTreeMap<String, String>,
    pub series: Vec<Series>,
}

impl ChartSpec {
    /// One-line overview for console previews.
    pub fn summary_row(&self) -> ChartRow {
        let points = || self.series.iter().flat_map(|s| &s.points);
        ChartRow {
            id: self.id.slug().to_string(),
            kind: format!("{:?}", self.kind),
            series: self.series.len(),
            points: points().count(),
            gaps: points().filter(|p| !p.y.is_present()).count(),
            provenance: self.provenance.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBundle {
    pub year: i32,
    pub charts: Vec<ChartSpec>,
    pub warnings: Vec<String>,
}

impl ChartBundle {
    pub fn get(&self, id: ChartId) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReport {
    pub matched: usize,
    pub unmatched: Vec<String>,
}

/// Every regional province must resolve to a boundary key.
///
/// The national row has no polygon and is not checked. Nothing resolving at
/// all is fatal; a partial mismatch comes back as the unmatched list.
pub fn check_boundaries(dataset: &Dataset, boundaries: &BoundaryIndex) -> Result<KeyReport> {
    let provinces = dataset.regional_provinces();
    let (matched, unmatched): (Vec<&str>, Vec<&str>) =
        provinces.iter().copied().partition(|p| boundaries.contains(p));
    if !provinces.is_empty() && matched.is_empty() {
        return Err(Error::KeyMismatch(format!(
            "none of {} provinces has a boundary",
            provinces.len()
        )));
    }
    let mut unmatched: Vec<String> = unmatched.into_iter().map(String::from).collect();
    unmatched.sort();
    for p in &unmatched {
        warn!(province = %p, "no boundary for province");
    }
    Ok(KeyReport {
        matched: matched.len(),
        unmatched,
    })
}

/// Build every chart for the dashboard; ranked charts use `year`.
pub fn assemble(
    dataset: &Dataset,
    colors: &ColorAssignment,
    boundaries: &BoundaryIndex,
    year: i32,
) -> Result<ChartBundle> {
    let keys = check_boundaries(dataset, boundaries)?;
    let mut asm = Assembler {
        ds: dataset,
        colors,
        boundaries,
        year,
        warnings: keys
            .unmatched
            .iter()
            .map(|p| format!("{} has no boundary and is left off the maps", p))
            .collect(),
    };
    let charts = asm.all();
    info!(charts = charts.len(), year, warnings = asm.warnings.len(), "charts assembled");
    Ok(ChartBundle {
        year,
        charts,
        warnings: asm.warnings,
    })
}

struct Assembler<'a> {
    ds: &'a Dataset,
    colors: &'a ColorAssignment,
    boundaries: &'a BoundaryIndex,
    year: i32,
    warnings: Vec<String>,
}

fn base(m: BaseMetric) -> Metric {
    Metric::Base(m)
}

fn derived(m: DerivedMetric) -> Metric {
    Metric::Derived(m)
}

fn point(row: &Observation, y: Measure) -> Point {
    Point {
        province: row.province.clone(),
        year: row.year,
        x: None,
        y,
        size: None,
    }
}

impl<'a> Assembler<'a> {
    fn all(&mut self) -> Vec<ChartSpec> {
        use BaseMetric::*;
        use DerivedMetric::*;
        vec![
            self.hdi_gdi_trend(),
            self.map(
                ChartId::GdiMap,
                "Gender Development Index by Province",
                derived(Gdi),
                "Gender Development Index",
                [75.0, 95.0],
            ),
            self.ranked(
                ChartId::GdiRanked,
                "Gender Development Index by Province",
                derived(Gdi),
                Direction::Descending,
                "Gender Development Index",
                FormatHint::Index,
            ),
            self.bubble(
                ChartId::LifeExpectancyBubble,
                "Female vs Male Life Expectancy by Province",
                (base(MaleLe), "Male Life Expectancy (Years)", [60.5, 75.0]),
                (base(FemaleLe), "Female Life Expectancy (Years)", [60.5, 77.5]),
                FormatHint::Years,
            ),
            self.schooling_bars(),
            self.trend(
                ChartId::AsyGapTrend,
                "Difference Between Male and Female Average Schooling Years in Indonesia",
                ChartKind::Line,
                "Difference in Years (Male ASY - Female ASY)",
                FormatHint::Years,
                &[(derived(AsyGap), "ASY_diff", INDEX_COLOR)],
            ),
            self.ranked(
                ChartId::AsyGapRanked,
                "Difference Between Male and Female Average Schooling Years by Province",
                derived(AsyGap),
                Direction::Ascending,
                "Difference in Years (Male ASY - Female ASY)",
                FormatHint::Years,
            ),
            self.trend(
                ChartId::ExpenditureTrend,
                "Male & Female Expenditure per Capita in Indonesia",
                ChartKind::Line,
                "Expenditure Per Capita in Million IDR",
                FormatHint::Millions,
                &[
                    (derived(MaleEpcMillions), "MaleEPC", MALE_COLOR),
                    (derived(FemaleEpcMillions), "FemaleEPC", FEMALE_COLOR),
                ],
            ),
            self.bubble(
                ChartId::ExpenditureBubble,
                "Female vs Male Expenditure per Capita by Province",
                (
                    derived(MaleEpcMillions),
                    "Male Expenditure Per Capita in Million IDR",
                    [2.8, 24.0],
                ),
                (
                    derived(FemaleEpcMillions),
                    "Female Expenditure Per Capita in Million IDR",
                    [2.8, 22.0],
                ),
                FormatHint::Millions,
            ),
            self.trend(
                ChartId::GemTrend,
                "Gender Empowerment Measure in Indonesia",
                ChartKind::Line,
                "Gender Empowerment Measure",
                FormatHint::Index,
                &[(base(Gem), "GEM", INDEX_COLOR)],
            ),
            self.map(
                ChartId::GemMap,
                "Gender Empowerment Measure by Province",
                base(Gem),
                "Gender Empowerment Measure",
                [50.0, 85.0],
            ),
            self.ranked(
                ChartId::GemRanked,
                "Gender Empowerment Measure by Province",
                base(Gem),
                Direction::Descending,
                "Gender Empowerment Measure",
                FormatHint::Index,
            ),
            self.trend(
                ChartId::IncomeShareStacked,
                "Male and Female Share of Income in Indonesia",
                ChartKind::StackedBar,
                "Share of Income (%)",
                FormatHint::Percent,
                &[
                    (base(FemaleSi), "FemaleSI", FEMALE_COLOR),
                    (base(MaleSi), "MaleSI", MALE_COLOR),
                ],
            ),
            self.ranked(
                ChartId::IncomeShareRanked,
                "Female Share of Income by Province",
                base(FemaleSi),
                Direction::Descending,
                "Female Share of Income",
                FormatHint::Percent,
            ),
            self.trend(
                ChartId::ParliamentStacked,
                "Male and Female Involvement in Parliament in Indonesia",
                ChartKind::StackedBar,
                "Involvement in Parliament (%)",
                FormatHint::Percent,
                &[
                    (base(FemaleIp), "FemaleIP", FEMALE_COLOR),
                    (base(MaleIp), "MaleIP", MALE_COLOR),
                ],
            ),
            self.ranked(
                ChartId::ParliamentRanked,
                "Female Involvement in Parliament by Province",
                base(FemaleIp),
                Direction::Descending,
                "Female Involvement in Parliament",
                FormatHint::Percent,
            ),
            self.trend(
                ChartId::ProfessionalStacked,
                "Male and Female Involvement in Professional Position in Indonesia",
                ChartKind::StackedBar,
                "Involvement in Professional Position (%)",
                FormatHint::Percent,
                &[
                    (base(FemalePp), "FemalePP", FEMALE_COLOR),
                    (base(MalePp), "MalePP", MALE_COLOR),
                ],
            ),
            self.ranked(
                ChartId::ProfessionalRanked,
                "Female Involvement in Professional Position by Province",
                base(FemalePp),
                Direction::Descending,
                "Female in Professional Position",
                FormatHint::Percent,
            ),
        ]
    }

    fn span(&self) -> String {
        let years = self.ds.years();
        match (years.first(), years.last()) {
            (Some(a), Some(b)) => format!("{}-{}", a, b),
            _ => String::new(),
        }
    }

    fn warn(&mut self, msg: String) {
        warn!("{}", msg);
        self.warnings.push(msg);
    }

    /// National series over time, one series per metric.
    fn trend(
        &mut self,
        id: ChartId,
        title: &str,
        kind: ChartKind,
        y_label: &str,
        format: FormatHint,
        parts: &[(Metric, &str, &str)],
    ) -> ChartSpec {
        let filter = RowFilter::national_only();
        let series: Vec<Series> = parts
            .iter()
            .map(|(metric, name, color)| Series {
                name: name.to_string(),
                color: Some(color.to_string()),
                points: self
                    .ds
                    .select(&filter)
                    .map(|row| point(row, metric.evaluate(row)))
                    .collect(),
            })
            .collect();
        if series.iter().all(|s| s.points.is_empty()) {
            self.warn(format!("{}: no {} rows", id.slug(), NATIONAL));
        }
        debug!(chart = id.slug(), series = series.len(), "trend assembled");
        ChartSpec {
            id,
            title: format!("{} ({})", title, self.span()),
            kind,
            x_label: "Year".to_string(),
            y_label: y_label.to_string(),
            format,
            animated: false,
            provenance: filter.to_string(),
            value_range: None,
            x_range: None,
            parity_line: false,
            reference: None,
            colors: self.colors.subset([NATIONAL]),
            series,
        }
    }

    fn hdi_gdi_trend(&mut self) -> ChartSpec {
        let mut spec = self.trend(
            ChartId::HdiGdiTrend,
            "Male HDI, Female HDI and GDI in Indonesia",
            ChartKind::BarLineCombo,
            "Human Development Index",
            FormatHint::Index,
            &[
                (base(BaseMetric::MaleHdi), "Male HDI", MALE_COLOR),
                (base(BaseMetric::FemaleHdi), "Female HDI", FEMALE_COLOR),
                (derived(DerivedMetric::Gdi), "GDI", INDEX_COLOR),
            ],
        );
        spec.y_label = "Human Development Index / Gender Development Index".to_string();
        spec
    }

    fn schooling_bars(&mut self) -> ChartSpec {
        use BaseMetric::*;
        self.trend(
            ChartId::SchoolingBars,
            "Expected and Average Schooling Years in Indonesia",
            ChartKind::GroupedBar,
            "Schooling Years",
            FormatHint::Years,
            &[
                (base(FemaleEsy), "FemaleESY", FEMALE_COLOR),
                (base(MaleEsy), "MaleESY", MALE_COLOR),
                (base(FemaleAsy), "FemaleASY", FEMALE_COLOR),
                (base(MaleAsy), "MaleASY", MALE_COLOR),
            ],
        )
    }

    /// Per-province values across all years, one animation frame per year.
    ///
    /// Provinces without a boundary are dropped here; `assemble` has already
    /// warned about each of them.
    fn map(&mut self, id: ChartId, title: &str, metric: Metric, label: &str, range: [f64; 2]) -> ChartSpec {
        let filter = RowFilter::exclude_national();
        let points: Vec<Point> = self
            .ds
            .select(&filter)
            .filter(|row| self.boundaries.contains(&row.province))
            .map(|row| point(row, metric.evaluate(row)))
            .collect();
        ChartSpec {
            id,
            title: format!("{} ({})", title, self.span()),
            kind: ChartKind::Choropleth,
            x_label: "Province".to_string(),
            y_label: label.to_string(),
            format: FormatHint::Index,
            animated: true,
            provenance: filter.to_string(),
            value_range: Some(range),
            x_range: None,
            parity_line: false,
            reference: None,
            colors: BTreeMap::new(),
            series: vec![Series {
                name: metric.name().to_string(),
                color: None,
                points,
            }],
        }
    }

    /// Latest-year ranking including the national bar as the reference.
    fn ranked(
        &mut self,
        id: ChartId,
        title: &str,
        metric: Metric,
        direction: Direction,
        y_label: &str,
        format: FormatHint,
    ) -> ChartSpec {
        let ranking = rank(self.ds, metric, self.year, direction);
        let reference = match national_reference(self.ds, metric, self.year) {
            Ok(value) => Some(Reference {
                label: "National Average".to_string(),
                value,
            }),
            Err(e) => {
                self.warn(format!("{}: {}", id.slug(), e));
                None
            }
        };
        if !ranking.missing.is_empty() {
            self.warn(format!(
                "{}: no {} value for {}",
                id.slug(),
                metric.name(),
                ranking.missing.join(", ")
            ));
        }
        let points: Vec<Point> = ranking
            .entries
            .iter()
            .map(|e| Point {
                province: e.province.clone(),
                year: self.year,
                x: None,
                y: Measure::Present(e.value),
                size: None,
            })
            .collect();
        let order = match direction {
            Direction::Descending => "descending",
            Direction::Ascending => "ascending",
        };
        ChartSpec {
            id,
            title: format!("{} ({})", title, self.year),
            kind: ChartKind::RankedBar,
            x_label: "Province".to_string(),
            y_label: y_label.to_string(),
            format,
            animated: false,
            provenance: format!(
                "{}; sorted {} by {}",
                RowFilter::by_year(self.year),
                order,
                metric.name()
            ),
            value_range: None,
            x_range: None,
            parity_line: false,
            reference,
            colors: self.colors.subset(ranking.entries.iter().map(|e| e.province.as_str())),
            series: vec![Series {
                name: metric.name().to_string(),
                color: None,
                points,
            }],
        }
    }

    /// Female-vs-male scatter per province sized by population, on fixed
    /// axes so frames stay comparable.
    fn bubble(
        &mut self,
        id: ChartId,
        title: &str,
        (x, x_label, x_range): (Metric, &str, [f64; 2]),
        (y, y_label, y_range): (Metric, &str, [f64; 2]),
        format: FormatHint,
    ) -> ChartSpec {
        let filter = RowFilter::exclude_national();
        let provinces = self.ds.regional_provinces();
        let series: Vec<Series> = provinces
            .iter()
            .map(|p| Series {
                name: p.to_string(),
                color: self.colors.get(p).map(String::from),
                points: self
                    .ds
                    .select(&filter)
                    .filter(|row| row.province == *p)
                    .map(|row| Point {
                        province: row.province.clone(),
                        year: row.year,
                        x: Some(x.evaluate(row)),
                        y: y.evaluate(row),
                        size: Some(Measure::from_option(row.population)),
                    })
                    .collect(),
            })
            .collect();
        let no_size = series
            .iter()
            .flat_map(|s| &s.points)
            .filter(|pt| !pt.size.is_some_and(Measure::is_present))
            .count();
        if no_size > 0 {
            self.warn(format!("{}: {} points without population", id.slug(), no_size));
        }
        ChartSpec {
            id,
            title: format!("{} ({}), bubble size based on population", title, self.span()),
            kind: ChartKind::Bubble,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            format,
            animated: true,
            provenance: filter.to_string(),
            value_range: Some(y_range),
            x_range: Some(x_range),
            parity_line: true,
            reference: None,
            colors: self.colors.subset(provinces.iter().copied()),
            series,
        }
    }
}
