use std::{
    path::{Path, PathBuf},
    sync::Once,
};

use rand::distr::{Distribution, Uniform};

use crate::{BlockSpec, Compression, GeoGrid, GeoTransform, NODATA, OutputWriter, PixelCode, RasterCreateOptions, RasterSize, RasterSourceSet};

static GDAL_CONFIG: Once = Once::new();

/// Route the GDAL diagnostics to the log, the projection database is not needed for the test grids
pub fn configure_gdal() {
    GDAL_CONFIG.call_once(|| {
        let gdal_config = inf::gdalinterop::Config {
            debug_logging: false,
            proj_db_search_location: None,
            config_options: Vec::default(),
        };

        gdal_config.apply().expect("Failed to configure GDAL");
    });
}

/// A north up grid with 30m cells without projection
pub fn test_grid(rows: usize, cols: usize) -> GeoGrid {
    GeoGrid::new(
        "",
        RasterSize::with_rows_cols(rows, cols),
        GeoTransform::new([1_500_000.0, 30.0, 0.0, 2_100_000.0, 0.0, -30.0]),
    )
}

/// Write an uncompressed, striped raster with the provided pixels in row major order
pub fn write_test_raster(path: &Path, grid: &GeoGrid, data: &[PixelCode]) -> PathBuf {
    configure_gdal();

    let opts = RasterCreateOptions {
        nodata: Some(NODATA),
        tiled: false,
        compression: Compression::None,
        ..Default::default()
    };

    let mut writer = OutputWriter::create(path, grid, &opts).expect("Failed to create test raster");
    writer
        .write_block(&BlockSpec::new(0, 0, grid.width(), grid.height()), data)
        .expect("Failed to write test raster");
    writer.finalize().expect("Failed to finalize test raster")
}

/// Read the full content of the first band of a raster
pub fn read_test_raster(path: &Path) -> (GeoGrid, Vec<PixelCode>) {
    configure_gdal();

    let set = RasterSourceSet::open(&[path]).expect("Failed to open test raster");
    let grid = set.grid().clone();
    let data = set
        .read_block(0, &BlockSpec::new(0, 0, grid.width(), grid.height()))
        .expect("Failed to read test raster");
    (grid, data.into_vec())
}

/// Random pixels drawn from the provided codes
pub fn create_random_codes(len: usize, codes: &[PixelCode]) -> Vec<PixelCode> {
    let mut rng = rand::rng();
    let uniform = Uniform::new(0, codes.len()).expect("Failed to create uniform distribution");
    (0..len).map(|_| codes[uniform.sample(&mut rng)]).collect()
}
