use std::path::Path;

use approx::relative_eq;

use crate::{Error, GeoTransform, Point, RasterSize, Result};

/// Relative tolerance used when comparing the geotransforms of rasters that should share a grid
const GEOTRANSFORM_EPSILON: f64 = 1e-9;

/// The spatial grid of a raster: projection, size in pixels and the affine transformation.
/// Read once from a reference raster and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct GeoGrid {
    /// The projection in WKT format (can be empty)
    projection: String,
    size: RasterSize,
    geo_transform: GeoTransform,
}

impl GeoGrid {
    pub fn new<S: Into<String>>(projection: S, size: RasterSize, geo_transform: GeoTransform) -> Self {
        GeoGrid {
            projection: projection.into(),
            size,
            geo_transform,
        }
    }

    /// Read the grid of an opened dataset
    pub fn from_dataset(ds: &gdal::Dataset) -> Result<Self> {
        let (width, height) = ds.raster_size();
        Ok(GeoGrid::new(
            ds.projection(),
            RasterSize::with_rows_cols(height, width),
            GeoTransform::from(ds.geo_transform()?),
        ))
    }

    /// Stamp the geotransform and projection of this grid on a dataset
    pub fn apply_to_dataset(&self, ds: &mut gdal::Dataset) -> Result {
        let (width, height) = ds.raster_size();
        if width != self.width() || height != self.height() {
            return Err(Error::SizeMismatch {
                size1: (self.width(), self.height()),
                size2: (width, height),
            });
        }

        ds.set_geo_transform(&self.geo_transform.coefficients())?;
        if !self.projection.is_empty() {
            ds.set_projection(&self.projection)?;
        }

        Ok(())
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn raster_size(&self) -> RasterSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.cols
    }

    pub fn height(&self) -> usize {
        self.size.rows
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    pub fn top_left(&self) -> Point {
        self.geo_transform.top_left()
    }

    pub fn bottom_right(&self) -> Point {
        self.geo_transform.apply(self.width() as f64, self.height() as f64)
    }

    /// Two grids are aligned when they have the same pixel dimensions and the same geotransform
    pub fn is_aligned_with(&self, other: &GeoGrid) -> bool {
        self.size == other.size
            && relative_eq!(
                self.geo_transform,
                other.geo_transform,
                epsilon = GEOTRANSFORM_EPSILON,
                max_relative = GEOTRANSFORM_EPSILON
            )
    }

    /// Verify that the grid of the raster at `path` (`other`) is aligned with this reference grid.
    /// Projections are compared textually and only logged: equivalent definitions can be written differently.
    pub fn check_aligned_with(&self, other: &GeoGrid, path: &Path) -> Result {
        if !self.is_aligned_with(other) {
            return Err(Error::GridMismatch {
                path: path.to_path_buf(),
                expected: self.to_string(),
                actual: other.to_string(),
            });
        }

        if self.projection != other.projection {
            log::warn!(
                "Projection of '{}' differs from the reference projection, assuming equivalence",
                path.display()
            );
        }

        Ok(())
    }
}

impl std::fmt::Display for GeoGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (top_left, bottom_right) = (self.top_left(), self.bottom_right());
        write!(
            f,
            "{}x{} pixels, extent ({}, {}) - ({}, {}), cell size {}x{}",
            self.width(),
            self.height(),
            top_left.x(),
            top_left.y(),
            bottom_right.x(),
            bottom_right.y(),
            self.geo_transform.cell_size_x(),
            self.geo_transform.cell_size_y()
        )
    }
}
