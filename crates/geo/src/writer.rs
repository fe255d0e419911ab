//! Creation of the single band 8-bit output rasters and block wise writing of their content.

use std::{
    ffi::CString,
    path::{Path, PathBuf},
};

use gdal::{Metadata as _, raster::GdalType};
use inf::gdalinterop::{self, check_pointer};

use crate::{
    BlockSpec, ColorTablePalette, Error, GeoGrid, NODATA, PixelBlock, PixelCode, Result, Tiling,
    gdalio::{self, to_c_int},
};

const GTIFF_DRIVER: &str = "GTiff";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Lzw,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Predictor {
    /// Horizontal differencing (TIFF predictor 2), the only predictor applicable to 8-bit integer bands
    Horizontal,
}

impl Predictor {
    pub fn tiff_value(&self) -> u8 {
        match self {
            Predictor::Horizontal => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterCreateOptions {
    /// The nodata value tagged on the band
    pub nodata: Option<PixelCode>,
    /// data layout of the raster (in tiles or strips)
    pub tiled: bool,
    pub compression: Compression,
    /// The predictor selection to use for writing the raster (only relevant when compression is used)
    pub predictor: Option<Predictor>,
    /// Force the BigTIFF file layout, otherwise the driver decides
    pub big_tiff: bool,
    pub color_table: Option<ColorTablePalette>,
    /// Explicit internal tile size (width, height), multiples of 16 for tiled output
    pub block_size: Option<(usize, usize)>,
    /// Block size used for processing when the driver reports no native block size
    pub fallback_block_size: (usize, usize),
}

impl Default for RasterCreateOptions {
    fn default() -> Self {
        RasterCreateOptions {
            nodata: None,
            tiled: true,
            compression: Compression::None,
            predictor: None,
            big_tiff: false,
            color_table: None,
            block_size: None,
            fallback_block_size: (256, 256),
        }
    }
}

impl RasterCreateOptions {
    /// Layout of the ever forest summary raster
    pub fn ever_forest() -> Self {
        RasterCreateOptions {
            nodata: Some(NODATA),
            tiled: true,
            compression: Compression::Lzw,
            ..Default::default()
        }
    }

    /// Layout of the yearly composite rasters: compressed with a predictor, BigTIFF and the NLCD palette
    pub fn yearly_composite() -> Self {
        RasterCreateOptions {
            nodata: Some(NODATA),
            tiled: true,
            compression: Compression::Lzw,
            predictor: Some(Predictor::Horizontal),
            big_tiff: true,
            color_table: Some(ColorTablePalette::nlcd()),
            block_size: None,
            fallback_block_size: (512, 512),
        }
    }

    pub fn with_block_size(mut self, width: usize, height: usize) -> Self {
        self.block_size = Some((width, height));
        self
    }

    fn driver_options(&self) -> Vec<String> {
        let mut opts = Vec::default();
        opts.push(format!("TILED={}", if self.tiled { "YES" } else { "NO" }));
        opts.push(format!(
            "COMPRESS={}",
            match self.compression {
                Compression::None => "NONE",
                Compression::Lzw => "LZW",
            }
        ));

        if let Some(predictor) = self.predictor
            && self.compression != Compression::None
        {
            opts.push(format!("PREDICTOR={}", predictor.tiff_value()));
        }

        if self.big_tiff {
            opts.push("BIGTIFF=YES".to_string());
        }

        if let Some((width, height)) = self.block_size {
            if self.tiled {
                opts.push(format!("BLOCKXSIZE={width}"));
                opts.push(format!("BLOCKYSIZE={height}"));
            } else {
                opts.push(format!("BLOCKYSIZE={height}"));
            }
        }

        opts
    }
}

/// Owns a newly created single band 8-bit raster and accepts block writes until it is finalized.
/// Dropping the writer without finalizing closes the file, a partially written file is not usable.
pub struct OutputWriter {
    path: PathBuf,
    dataset: gdal::Dataset,
    grid: GeoGrid,
    block_size: (usize, usize),
    blocks_written: usize,
}

impl OutputWriter {
    /// Create the raster at `path`, an existing file is removed first and missing parent directories are created
    pub fn create(path: impl AsRef<Path>, grid: &GeoGrid, opts: &RasterCreateOptions) -> Result<Self> {
        let path = path.as_ref();
        prepare_output_location(path)?;

        let write_error = |reason: String| Error::Write {
            path: path.to_path_buf(),
            reason,
        };

        let driver = gdal::DriverManager::get_driver_by_name(GTIFF_DRIVER)?;
        let driver_options = opts.driver_options();
        log::debug!("Creating '{}' ({})", path.display(), driver_options.join(" "));
        let c_opts = gdalinterop::create_string_list(&driver_options)?;
        let c_path = CString::new(path.to_string_lossy().to_string())?;
        let cols = to_c_int(grid.width())?;
        let rows = to_c_int(grid.height())?;

        let ds_handle = check_pointer(
            unsafe {
                gdal_sys::GDALCreate(
                    driver.c_driver(),
                    c_path.as_ptr(),
                    cols,
                    rows,
                    1,
                    <PixelCode as GdalType>::gdal_ordinal(),
                    c_opts.as_ptr(),
                )
            },
            "GDALCreate",
        )
        .map_err(|err| write_error(format!("failed to create raster: {err}")))?;

        let mut dataset = unsafe { gdal::Dataset::from_c_dataset(ds_handle) };
        grid.apply_to_dataset(&mut dataset)
            .map_err(|err| write_error(format!("failed to set the raster grid: {err}")))?;

        let block_size = {
            let mut band = dataset.rasterband(1)?;
            band.set_no_data_value(opts.nodata.map(f64::from))
                .map_err(|err| write_error(format!("failed to set the nodata value: {err}")))?;

            if let Some(palette) = &opts.color_table {
                palette
                    .apply_to_band(&band)
                    .map_err(|err| write_error(format!("failed to set the color table: {err}")))?;
            }

            native_block_size(band.block_size(), opts.fallback_block_size)
        };

        log::debug!("Block size of '{}': {}x{}", path.display(), block_size.0, block_size.1);

        Ok(OutputWriter {
            path: path.to_path_buf(),
            dataset,
            grid: grid.clone(),
            block_size,
            blocks_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    /// The block size (width, height) the raster is processed with
    pub fn block_size(&self) -> (usize, usize) {
        self.block_size
    }

    /// The block layout of the output raster
    pub fn tiling(&self) -> Result<Tiling> {
        Tiling::new(self.grid.raster_size(), self.block_size.0, self.block_size.1)
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Write the pixels of a block, blocks can be written in any order
    pub fn write_block(&mut self, block: &BlockSpec, data: &[PixelCode]) -> Result {
        if !block.fits_in(self.grid.raster_size()) {
            return Err(Error::InvalidArgument(format!(
                "Block {block} is outside of the raster extent {}",
                self.grid.raster_size()
            )));
        }

        let band = self.dataset.rasterband(1)?;
        gdalio::write_block(&band, block, data).map_err(|err| Error::Write {
            path: self.path.clone(),
            reason: format!("failed to write block {block}: {err}"),
        })?;

        self.blocks_written += 1;
        Ok(())
    }

    pub fn write_pixel_block(&mut self, block: &PixelBlock) -> Result {
        self.write_block(block.spec(), block.as_slice())
    }

    /// Flush all pending writes and close the raster
    pub fn finalize(mut self) -> Result<PathBuf> {
        self.dataset.flush_cache().map_err(|err| Error::Write {
            path: self.path.clone(),
            reason: format!("failed to flush the raster: {err}"),
        })?;

        log::debug!("Finalized '{}' ({} blocks)", self.path.display(), self.blocks_written);
        let OutputWriter { path, dataset, .. } = self;
        drop(dataset);
        Ok(path)
    }
}

fn native_block_size(reported: (usize, usize), fallback: (usize, usize)) -> (usize, usize) {
    if reported.0 == 0 || reported.1 == 0 {
        log::warn!(
            "Raster driver reports no native block size, using {}x{}",
            fallback.0,
            fallback.1
        );
        return fallback;
    }

    reported
}

/// Create the parent directories of an output and remove a previous output at the same location.
/// Failures are configuration errors: nothing has been processed yet.
pub(crate) fn prepare_output_location(path: &Path) -> Result {
    if gdalio::is_virtual_path(path) {
        return Ok(());
    }

    inf::fs::create_directory_for_file(path).map_err(|err| Error::Configuration(err.to_string()))?;
    inf::fs::remove_file_if_exists(path).map_err(|err| Error::Configuration(err.to_string()))?;
    Ok(())
}

/// Layout and metadata of an existing raster, used to verify written outputs
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub grid: GeoGrid,
    pub block_size: (usize, usize),
    pub nodata: Option<f64>,
    /// Compression as reported by the driver (e.g. "LZW"), `None` for uncompressed rasters
    pub compression: Option<String>,
    pub predictor: Option<String>,
    pub color_table: Option<ColorTablePalette>,
    /// `None` when the file layout can not be inspected (GDAL virtual filesystem paths)
    pub big_tiff: Option<bool>,
}

pub fn read_raster_info(path: impl AsRef<Path>) -> Result<RasterInfo> {
    let path = path.as_ref();
    let ds = gdalio::open_dataset_read_only(path)?;
    let band = ds.rasterband(1)?;

    Ok(RasterInfo {
        grid: GeoGrid::from_dataset(&ds)?,
        block_size: band.block_size(),
        nodata: band.no_data_value(),
        compression: ds.metadata_item("COMPRESSION", "IMAGE_STRUCTURE"),
        predictor: ds.metadata_item("PREDICTOR", "IMAGE_STRUCTURE"),
        color_table: ColorTablePalette::from_band(&band),
        big_tiff: is_big_tiff(path)?,
    })
}

/// BigTIFF files carry version 43 in the header, classic TIFF files version 42.
/// Only local files are inspected.
fn is_big_tiff(path: &Path) -> Result<Option<bool>> {
    use std::io::Read as _;

    if gdalio::is_virtual_path(path) {
        return Ok(None);
    }

    let mut header = [0u8; 4];
    std::fs::File::open(path)?.read_exact(&mut header)?;
    let version = match &header[0..2] {
        b"II" => u16::from_le_bytes([header[2], header[3]]),
        b"MM" => u16::from_be_bytes([header[2], header[3]]),
        _ => return Ok(Some(false)),
    };

    Ok(Some(version == 43))
}
