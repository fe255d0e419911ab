//! The two passes: the ever forest summary over all years and the yearly composites derived from it.

use std::path::{Path, PathBuf};

use inf::progressinfo::ProgressNotification;

use crate::{
    Error, OutputWriter, ProcessingOptions, RasterCreateOptions, RasterSourceSet, Reduction, Result, SourceSeries, gdalio,
    pipeline::reduce_tiles, writer::prepare_output_location,
};

/// Location of the composite of `year` in the output directory: `<out_dir>/<year>/ever_forest_<year>.tif`
pub fn yearly_output_path(out_dir: &Path, year: u32) -> PathBuf {
    out_dir.join(year.to_string()).join(format!("ever_forest_{year}.tif"))
}

/// Mark every pixel that is forest in any year of the series.
///
/// The output contains the forest code of the latest year in which the pixel was forest,
/// or nodata when the pixel was never forest. An existing output file is removed before any source is opened.
pub fn build_ever_forest(
    series: &SourceSeries,
    output: &Path,
    create_opts: &RasterCreateOptions,
    opts: &ProcessingOptions,
    progress: impl ProgressNotification,
) -> Result<PathBuf> {
    log::info!(
        "Building ever forest from {} years ({}-{})",
        series.len(),
        series.iter().next().map_or(0, |src| src.year),
        series.iter().last().map_or(0, |src| src.year),
    );

    // a failed run must not leave the summary of a previous run behind
    prepare_output_location(output)?;

    // ascending year order, the latest forest year determines the stored forest code
    let sources = RasterSourceSet::open(&series.paths())?;
    log::debug!("Input grid: {}", sources.grid());

    let mut writer = OutputWriter::create(output, sources.grid(), create_opts)?;
    reduce_tiles(&sources, &mut writer, Reduction::ever_forest(), opts, progress)?;
    let path = writer.finalize()?;

    log::info!("Wrote ever forest raster '{}'", path.display());
    Ok(path)
}

/// For every year of the series write a composite that takes the ever forest value where the pixel was ever forest
/// and the classification of that year everywhere else.
///
/// The ever forest raster is the reference grid, every yearly source has to be aligned with it.
/// Returns the paths of the written composites in ascending year order.
pub fn build_yearly_composites(
    series: &SourceSeries,
    ever_forest: &Path,
    out_dir: &Path,
    create_opts: &RasterCreateOptions,
    opts: &ProcessingOptions,
    progress: impl ProgressNotification,
) -> Result<Vec<PathBuf>> {
    if !ever_forest.exists() && !gdalio::is_virtual_path(ever_forest) {
        return Err(Error::Configuration(format!(
            "Ever forest raster '{}' does not exist",
            ever_forest.display()
        )));
    }

    std::fs::create_dir_all(out_dir)
        .map_err(|err| Error::Configuration(format!("Failed to create output directory '{}' ({err})", out_dir.display())))?;

    let ever_grid = RasterSourceSet::open(&[ever_forest])?.grid().clone();

    let mut written = Vec::with_capacity(series.len());
    for source in series {
        let sources = RasterSourceSet::open_with_reference(&[ever_forest, source.path.as_path()], &ever_grid)?;
        let output = yearly_output_path(out_dir, source.year);

        let mut writer = OutputWriter::create(&output, &ever_grid, create_opts)?;
        reduce_tiles(&sources, &mut writer, Reduction::forest_overlay(), opts, &progress)?;
        let path = writer.finalize()?;

        log::info!("Wrote {} composite '{}'", source.year, path.display());
        written.push(path);
    }

    Ok(written)
}
