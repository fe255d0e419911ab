//! Discovery of the per-year classification rasters in a directory tree of the form `<base>/<year>/<file>`.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

const YEAR_PLACEHOLDER: &str = "{year}";

/// File name of the classification raster inside a year directory, `{year}` is substituted by the year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearPattern(Cow<'static, str>);

impl YearPattern {
    /// The per-year mosaics used as input for the ever forest summary
    pub const VRT: YearPattern = YearPattern(Cow::Borrowed(".vrt"));
    /// The Annual NLCD land cover rasters
    pub const ANNUAL_NLCD: YearPattern = YearPattern(Cow::Borrowed("Annual_NLCD_LndCov_{year}_CU_C1V1.tif"));

    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() || pattern.contains(['/', '\\']) {
            return Err(Error::Configuration(format!("Invalid year file pattern: '{pattern}'")));
        }

        Ok(YearPattern(Cow::Owned(pattern)))
    }

    pub fn file_name(&self, year: u32) -> String {
        self.0.replace(YEAR_PLACEHOLDER, &year.to_string())
    }
}

impl std::fmt::Display for YearPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSource {
    pub year: u32,
    pub path: PathBuf,
}

/// Non empty list of classification rasters ordered by ascending year, every year occurs once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSeries {
    sources: Vec<YearSource>,
}

impl SourceSeries {
    pub fn from_pairs<P: Into<PathBuf>>(pairs: impl IntoIterator<Item = (u32, P)>) -> Result<Self> {
        let mut sources: Vec<YearSource> = pairs
            .into_iter()
            .map(|(year, path)| YearSource { year, path: path.into() })
            .collect();

        if sources.is_empty() {
            return Err(Error::Configuration("No yearly sources provided".to_string()));
        }

        sources.sort_by_key(|src| src.year);
        if let Some(dup) = sources.windows(2).find(|pair| pair[0].year == pair[1].year) {
            return Err(Error::Configuration(format!(
                "Year {} occurs more than once ('{}' and '{}')",
                dup[0].year,
                dup[0].path.display(),
                dup[1].path.display()
            )));
        }

        Ok(SourceSeries { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, YearSource> {
        self.sources.iter()
    }

    pub fn years(&self) -> Vec<u32> {
        self.sources.iter().map(|src| src.year).collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|src| src.path.clone()).collect()
    }

    pub fn get(&self, year: u32) -> Option<&Path> {
        self.sources
            .binary_search_by_key(&year, |src| src.year)
            .ok()
            .map(|index| self.sources[index].path.as_path())
    }
}

impl<'a> IntoIterator for &'a SourceSeries {
    type Item = &'a YearSource;
    type IntoIter = std::slice::Iter<'a, YearSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// Collect the year directories of `base_dir` that are named after a year later than `min_year_exclusive`
/// and contain the file described by the pattern.
/// Other entries are ignored, finding no year at all is a [`Error::Configuration`] error.
pub fn discover_years(base_dir: impl AsRef<Path>, pattern: &YearPattern, min_year_exclusive: u32) -> Result<SourceSeries> {
    let base_dir = base_dir.as_ref();
    let entries = std::fs::read_dir(base_dir)
        .map_err(|err| Error::Configuration(format!("Failed to list input directory '{}' ({err})", base_dir.display())))?;

    let mut pairs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Some(year) = parse_year_directory_name(&entry.file_name().to_string_lossy()) else {
            continue;
        };

        if year <= min_year_exclusive || !entry.path().is_dir() {
            continue;
        }

        let path = entry.path().join(pattern.file_name(year));
        if path.is_file() {
            log::debug!("Found {year} source: {}", path.display());
            pairs.push((year, path));
        } else {
            log::debug!("Skipping year directory '{}': no '{}'", entry.path().display(), pattern.file_name(year));
        }
    }

    if pairs.is_empty() {
        return Err(Error::Configuration(format!(
            "No valid '{pattern}' sources in '{}' for years > {min_year_exclusive}",
            base_dir.display()
        )));
    }

    let series = SourceSeries::from_pairs(pairs)?;
    log::info!("Discovered {} yearly sources in '{}'", series.len(), base_dir.display());
    Ok(series)
}

/// Year directories are named by the canonical decimal year, `02001` is not a year directory
fn parse_year_directory_name(name: &str) -> Option<u32> {
    if name.is_empty() || name.starts_with('0') || !name.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }

    name.parse().ok()
}
