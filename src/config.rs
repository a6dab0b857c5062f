// Command-line configuration.
use clap::{Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Gender equality dashboard data preparation", long_about = None)]
pub struct Config {
    /// Province/year observation table
    #[arg(long, default_value = "unp_pro_df.csv", value_hint = ValueHint::FilePath)]
    pub data: PathBuf,

    /// GeoJSON province boundaries
    #[arg(long, default_value = "indonesia.geojson", value_hint = ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Dotted path to the province name inside each feature
    #[arg(long, default_value = "properties.state")]
    pub feature_key: String,

    /// Directory for charts.json, derived.json, narrative.csv and summary.json
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Year for ranked charts and narrative counts (defaults to the latest)
    #[arg(long)]
    pub year: Option<i32>,

    /// Rows shown in console previews
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Menu-driven session: [1] load, [2] generate
    #[arg(long)]
    pub interactive: bool,
}

impl Config {
    pub fn out_path(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_files() {
        let cfg = Config::parse_from(["gender_dashboard"]);
        assert_eq!(cfg.data, PathBuf::from("unp_pro_df.csv"));
        assert_eq!(cfg.feature_key, "properties.state");
        assert_eq!(cfg.year, None);
        assert!(!cfg.interactive);
        assert_eq!(cfg.out_path("charts.json"), PathBuf::from("./charts.json"));
    }

    #[test]
    fn overrides_parse() {
        let cfg = Config::parse_from([
            "gender_dashboard",
            "--data",
            "in.csv",
            "--year",
            "2019",
            "--out-dir",
            "out",
            "--interactive",
        ]);
        assert_eq!(cfg.year, Some(2019));
        assert!(cfg.interactive);
        assert_eq!(cfg.out_path("summary.json"), PathBuf::from("out/summary.json"));
    }
}
