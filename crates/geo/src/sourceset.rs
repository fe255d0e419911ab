use std::path::{Path, PathBuf};

use gdal::raster::GdalDataType;

use crate::{BlockSpec, Error, GeoGrid, PixelBlock, Result, gdalio};

/// An opened single band raster input
struct RasterSource {
    path: PathBuf,
    dataset: gdal::Dataset,
}

impl RasterSource {
    fn open(path: &Path) -> Result<Self> {
        let source_open_error = |reason: String| Error::SourceOpen {
            path: path.to_path_buf(),
            reason,
        };

        let dataset = gdalio::open_dataset_read_only(path).map_err(|err| match err {
            Error::GdalError(_) if !path.exists() && !gdalio::is_virtual_path(path) => source_open_error("file does not exist".to_string()),
            err => source_open_error(err.to_string()),
        })?;

        let band = dataset
            .rasterband(1)
            .map_err(|err| source_open_error(format!("no readable band: {err}")))?;

        let band_type = band.band_type();
        if band_type != GdalDataType::UInt8 {
            log::warn!(
                "Raster '{}' has data type {band_type}, values will be converted to 8-bit category codes",
                path.display()
            );
        }

        drop(band);
        Ok(RasterSource {
            path: path.to_path_buf(),
            dataset,
        })
    }

    fn grid(&self) -> Result<GeoGrid> {
        GeoGrid::from_dataset(&self.dataset).map_err(|err| Error::SourceOpen {
            path: self.path.clone(),
            reason: format!("failed to read the raster grid: {err}"),
        })
    }

    fn read_block(&self, block: &BlockSpec) -> Result<PixelBlock> {
        let mut result = PixelBlock::filled_with(*block, 0);
        let band = self.dataset.rasterband(1)?;
        gdalio::read_block(&band, block, result.as_mut_slice()).map_err(|err| Error::Runtime(format!(
            "Failed to read block {block} from '{}' ({err})",
            self.path.display()
        )))?;

        Ok(result)
    }
}

/// Read-only handles to a set of aligned single band rasters.
///
/// All handles stay open for the lifetime of the set and are closed when it is dropped,
/// the sources are never closed while block reads can still happen.
/// Every source is validated against the reference grid when the set is opened.
pub struct RasterSourceSet {
    grid: GeoGrid,
    sources: Vec<RasterSource>,
}

impl RasterSourceSet {
    /// Open the sources, the grid of the first source is the reference grid
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let first = paths
            .first()
            .ok_or_else(|| Error::Configuration("No raster sources provided".to_string()))?;

        let first = RasterSource::open(first.as_ref())?;
        let grid = first.grid()?;
        Self::open_remaining(grid, first, &paths[1..])
    }

    /// Open the sources and validate them against an externally provided reference grid
    pub fn open_with_reference<P: AsRef<Path>>(paths: &[P], reference: &GeoGrid) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::Configuration("No raster sources provided".to_string()));
        }

        let mut set = RasterSourceSet {
            grid: reference.clone(),
            sources: Vec::with_capacity(paths.len()),
        };

        for path in paths {
            set.add_source(path.as_ref())?;
        }

        Ok(set)
    }

    fn open_remaining<P: AsRef<Path>>(grid: GeoGrid, first: RasterSource, paths: &[P]) -> Result<Self> {
        log::debug!("Reference grid '{}': {grid}", first.path.display());

        let mut set = RasterSourceSet {
            grid,
            sources: Vec::with_capacity(paths.len() + 1),
        };
        set.sources.push(first);

        for path in paths {
            set.add_source(path.as_ref())?;
        }

        Ok(set)
    }

    fn add_source(&mut self, path: &Path) -> Result {
        let source = RasterSource::open(path)?;
        self.grid.check_aligned_with(&source.grid()?, path)?;
        log::debug!("Opened raster source '{}'", path.display());
        self.sources.push(source);
        Ok(())
    }

    /// The reference grid all sources are aligned with
    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.sources.get(index).map(|src| src.path.as_path())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|src| src.path.clone()).collect()
    }

    /// Read a block of a single source
    pub fn read_block(&self, index: usize, block: &BlockSpec) -> Result<PixelBlock> {
        self.check_block(block)?;
        let source = self
            .sources
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid source index {index} ({} sources)", self.len())))?;

        source.read_block(block)
    }

    /// Read a block of every source, in source order, all blocks have the same shape
    pub fn read_blocks(&self, block: &BlockSpec) -> Result<Vec<PixelBlock>> {
        self.check_block(block)?;
        self.sources.iter().map(|src| src.read_block(block)).collect()
    }

    fn check_block(&self, block: &BlockSpec) -> Result {
        if !block.fits_in(self.grid.raster_size()) {
            return Err(Error::InvalidArgument(format!(
                "Block {block} is outside of the raster extent {}",
                self.grid.raster_size()
            )));
        }

        Ok(())
    }
}
