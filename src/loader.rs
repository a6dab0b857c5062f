use crate::error::{Error, Result};
use crate::types::{Dataset, Observation, RawRow, FIRST_YEAR, LAST_YEAR};
use crate::util::{parse_f64_safe, parse_i32_safe};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub out_of_range: usize,
    pub parse_errors: usize,
    /// Province/year pairs absent from the table.
    pub missing_keys: Vec<(String, i32)>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::missing_input(format!("{}: {}", path.display(), e)))
}

pub fn load_observations(path: &Path) -> Result<(Dataset, LoadReport)> {
    let file = open(path)?;
    info!(path = %path.display(), "loading observations");
    read_observations(file)
}

pub fn read_observations<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut out_of_range = 0usize;
    let mut rows: Vec<Observation> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = total_rows, error = %e, "skipping unreadable row");
                parse_errors += 1;
                continue;
            }
        };
        let province = match raw.province.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        let year = match parse_i32_safe(raw.year.as_deref()) {
            Some(y) if (FIRST_YEAR..=LAST_YEAR).contains(&y) => y,
            Some(_) => {
                out_of_range += 1;
                continue;
            }
            None => {
                parse_errors += 1;
                continue;
            }
        };
        rows.push(to_observation(province, year, &raw));
    }

    if rows.is_empty() {
        return Err(Error::missing_input(format!(
            "no usable observations in {} rows",
            total_rows
        )));
    }

    let dataset = Dataset::new(rows)?;
    let missing_keys = dataset.missing_keys();
    for (province, year) in &missing_keys {
        warn!(province = %province, year, "incomplete series: no observation");
    }
    let report = LoadReport {
        total_rows,
        kept_rows: dataset.len(),
        out_of_range,
        parse_errors,
        missing_keys,
    };
    info!(
        rows = report.kept_rows,
        skipped = report.out_of_range + report.parse_errors,
        "observations loaded"
    );
    Ok((dataset, report))
}

fn to_observation(province: String, year: i32, raw: &RawRow) -> Observation {
    let num = |cell: &Option<String>| parse_f64_safe(cell.as_deref());
    Observation {
        province,
        year,
        population: num(&raw.population).filter(|p| *p >= 0.0),
        male_hdi: num(&raw.male_hdi),
        female_hdi: num(&raw.female_hdi),
        male_le: num(&raw.male_le),
        female_le: num(&raw.female_le),
        male_asy: num(&raw.male_asy),
        female_asy: num(&raw.female_asy),
        male_esy: num(&raw.male_esy),
        female_esy: num(&raw.female_esy),
        male_epc: num(&raw.male_epc),
        female_epc: num(&raw.female_epc),
        gem: num(&raw.gem),
        male_si: num(&raw.male_si),
        female_si: num(&raw.female_si),
        male_ip: num(&raw.male_ip),
        female_ip: num(&raw.female_ip),
        male_pp: num(&raw.male_pp),
        female_pp: num(&raw.female_pp),
    }
}

/// Province keys present in a GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryIndex {
    pub keys: BTreeSet<String>,
    /// Features without a string at the key path.
    pub unkeyed: usize,
}

impl BoundaryIndex {
    pub fn contains(&self, province: &str) -> bool {
        self.keys.contains(province)
    }
}

pub fn load_boundaries(path: &Path, feature_key: &str) -> Result<BoundaryIndex> {
    let mut text = String::new();
    open(path)?.read_to_string(&mut text)?;
    info!(path = %path.display(), "loading boundaries");
    parse_boundaries(&text, feature_key)
}

/// `feature_key` is a dotted path into each feature, e.g. `properties.state`.
pub fn parse_boundaries(text: &str, feature_key: &str) -> Result<BoundaryIndex> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| Error::missing_input(format!("boundary file is not JSON: {}", e)))?;
    let features = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::missing_input("boundary file has no `features` array"))?;

    let mut keys = BTreeSet::new();
    let mut unkeyed = 0usize;
    for feature in features {
        let key = feature_key
            .split('.')
            .try_fold(feature, |v, part| v.get(part))
            .and_then(Value::as_str);
        match key {
            Some(k) => {
                keys.insert(k.trim().to_string());
            }
            None => unkeyed += 1,
        }
    }
    if keys.is_empty() {
        return Err(Error::missing_input(format!(
            "no feature carries a key at `{}`",
            feature_key
        )));
    }
    if unkeyed > 0 {
        warn!(unkeyed, feature_key, "features without a province key");
    }
    Ok(BoundaryIndex { keys, unkeyed })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Province,Year,Population,MaleHDI,FemaleHDI,MaleLE,FemaleLE,MaleASY,FemaleASY,MaleESY,FemaleESY,MaleEPC,FemaleEPC,GEM,MaleSI,FemaleSI,MaleIP,FemaleIP,MalePP,FemalePP";

    #[test]
    fn reads_rows_and_blank_cells_as_missing() {
        let csv = format!(
            "{}\n\
             Aceh,2010,\"4,523,100\",72.1,66.3,67.2,71.0,8.9,8.1,12.8,13.2,\"9,800,000\",\"6,100,000\",55.2,68.1,31.9,88.0,12.0,54.0,46.0\n\
             Kalimantan Utara,2010,,70.0,,,,,,,,,,,,,,,,\n\
             Aceh,2009,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1\n\
             ,2011,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1\n",
            HEADER
        );
        let (ds, report) = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(report.parse_errors, 1);
        let aceh = ds.get("Aceh", 2010).unwrap();
        assert_eq!(aceh.population, Some(4_523_100.0));
        assert_eq!(aceh.male_epc, Some(9_800_000.0));
        assert_eq!(aceh.female_pp, Some(46.0));
        let kaltara = ds.get("Kalimantan Utara", 2010).unwrap();
        assert_eq!(kaltara.population, None);
        assert_eq!(kaltara.male_hdi, Some(70.0));
        assert_eq!(kaltara.female_hdi, None);
    }

    #[test]
    fn duplicate_rows_are_fatal() {
        let csv = format!("{}\nAceh,2010\nAceh,2010\n", HEADER);
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
    }

    #[test]
    fn empty_table_is_missing_input() {
        let err = read_observations(HEADER.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn absent_file_is_missing_input() {
        let err = load_observations(Path::new("/nonexistent/unp_pro_df.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn reports_missing_province_years() {
        let csv = format!("{}\nAceh,2010\nAceh,2011\nBali,2011\n", HEADER);
        let (_, report) = read_observations(csv.as_bytes()).unwrap();
        assert!(report.missing_keys.contains(&("Bali".to_string(), 2010)));
        assert!(report.missing_keys.contains(&("Aceh".to_string(), 2021)));
        assert!(!report.missing_keys.contains(&("Aceh".to_string(), 2011)));
        // Ten absent years for Aceh, eleven for Bali.
        assert_eq!(report.missing_keys.len(), 21);
    }

    #[test]
    fn boundary_keys_follow_the_feature_path() {
        let geo = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"state":"Aceh"},"geometry":null},
            {"type":"Feature","properties":{"state":"Bali"},"geometry":null},
            {"type":"Feature","properties":{"name":"X"},"geometry":null}
        ]}"#;
        let idx = parse_boundaries(geo, "properties.state").unwrap();
        assert!(idx.contains("Aceh"));
        assert!(idx.contains("Bali"));
        assert_eq!(idx.unkeyed, 1);
        let err = parse_boundaries(geo, "properties.province").unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn malformed_boundaries_are_missing_input() {
        assert!(matches!(
            parse_boundaries("not json", "properties.state"),
            Err(Error::MissingInput(_))
        ));
        assert!(matches!(
            parse_boundaries(r#"{"type":"FeatureCollection"}"#, "properties.state"),
            Err(Error::MissingInput(_))
        ));
    }
}
