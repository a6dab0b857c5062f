// Province color assignment.
//
// Colors come from the Dark24 qualitative sequence followed by Vivid, handed
// out in first-seen province order. The mapping is one-to-one: running out
// of colors is an error rather than a silent reuse.
use crate::error::{Error, Result};
use crate::types::Dataset;
use std::collections::BTreeMap;

pub const DARK24: [&str; 24] = [
    "#2E91E5", "#E15F99", "#1CA71C", "#FB0D0D", "#DA16FF", "#222A2A", "#B68100", "#750D86",
    "#EB663B", "#511CFB", "#00A08B", "#FB00D1", "#FC0080", "#B2828D", "#6C7C32", "#778AAE",
    "#862A16", "#A777F1", "#620042", "#1616A7", "#DA60CA", "#6C4516", "#0D2A63", "#AF0038",
];

pub const VIVID: [&str; 11] = [
    "rgb(229, 134, 6)",
    "rgb(93, 105, 177)",
    "rgb(82, 188, 163)",
    "rgb(153, 201, 69)",
    "rgb(204, 97, 176)",
    "rgb(36, 121, 108)",
    "rgb(218, 165, 27)",
    "rgb(47, 138, 196)",
    "rgb(118, 78, 159)",
    "rgb(237, 100, 90)",
    "rgb(165, 170, 153)",
];

// Series colors for gender splits and index lines.
pub const MALE_COLOR: &str = "dodgerblue";
pub const FEMALE_COLOR: &str = "indianred";
pub const INDEX_COLOR: &str = "limegreen";

pub fn default_palette() -> Vec<&'static str> {
    DARK24.iter().chain(VIVID.iter()).copied().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorAssignment {
    colors: BTreeMap<String, String>,
}

impl ColorAssignment {
    pub fn get(&self, province: &str) -> Option<&str> {
        self.colors.get(province).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Mapping restricted to `provinces`, for embedding in one chart.
    pub fn subset<'a>(&self, provinces: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
        provinces
            .into_iter()
            .filter_map(|p| self.colors.get(p).map(|c| (p.to_string(), c.clone())))
            .collect()
    }
}

pub fn assign_colors(provinces: &[&str], palette: &[&str]) -> Result<ColorAssignment> {
    if provinces.len() > palette.len() {
        return Err(Error::PaletteExhausted {
            needed: provinces.len(),
            available: palette.len(),
        });
    }
    let colors = provinces
        .iter()
        .zip(palette)
        .map(|(p, c)| (p.to_string(), c.to_string()))
        .collect();
    Ok(ColorAssignment { colors })
}

/// Colors for every province of the dataset, national row included.
pub fn assign_for(dataset: &Dataset) -> Result<ColorAssignment> {
    assign_colors(&dataset.provinces(), &default_palette())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_follows_first_seen_order() {
        let a = assign_colors(&["Bali", "Aceh", "Papua"], &default_palette()).unwrap();
        assert_eq!(a.get("Bali"), Some("#2E91E5"));
        assert_eq!(a.get("Aceh"), Some("#E15F99"));
        assert_eq!(a.get("Papua"), Some("#1CA71C"));
        assert_eq!(a.get("Jambi"), None);
    }

    #[test]
    fn palette_covers_thirty_five_provinces() {
        let names: Vec<String> = (0..35).map(|i| format!("P{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let a = assign_colors(&refs, &default_palette()).unwrap();
        assert_eq!(a.len(), 35);
        assert_eq!(a.get("P34"), Some("rgb(165, 170, 153)"));
        let distinct: std::collections::BTreeSet<&str> =
            refs.iter().filter_map(|p| a.get(p)).collect();
        assert_eq!(distinct.len(), 35);
    }

    #[test]
    fn exhausted_palette_is_an_error() {
        let err = assign_colors(&["A", "B", "C"], &["red", "blue"]).unwrap_err();
        assert!(matches!(err, Error::PaletteExhausted { needed: 3, available: 2 }));
    }

    #[test]
    fn same_input_same_assignment() {
        let provinces = ["Riau", "Aceh", "Bali"];
        assert_eq!(
            assign_colors(&provinces, &default_palette()).unwrap(),
            assign_colors(&provinces, &default_palette()).unwrap()
        );
    }

    #[test]
    fn subset_keeps_only_requested_provinces() {
        let a = assign_colors(&["Bali", "Aceh"], &default_palette()).unwrap();
        let s = a.subset(["Aceh", "Nowhere"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("Aceh").map(String::as_str), Some("#E15F99"));
    }
}
