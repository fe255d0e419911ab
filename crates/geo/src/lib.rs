#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Tiled reduction and compositing of aligned categorical rasters.
//!
//! A [`RasterSourceSet`] holds the opened input bands, a [`Tiling`] walks the output raster block by block,
//! a [`Reduction`] turns the input blocks into one output block and the [`OutputWriter`] streams it to disk.
//! Memory use is bounded by the block size and the number of sources, never by the raster extent.

pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod categories;
pub mod discovery;
mod error;
pub mod everforest;
mod gdalio;
mod geogrid;
mod geotransform;
pub mod kernel;
pub mod palette;
mod pixelblock;
pub mod pipeline;
mod rastersize;
mod runtimeconfiguration;
mod sourceset;
pub mod tiling;
pub mod writer;

#[cfg(test)]
mod testutils;

#[doc(inline)]
pub use categories::{CategorySet, EVER_FOREST, NODATA, PixelCode};
#[doc(inline)]
pub use discovery::{SourceSeries, YearPattern, YearSource, discover_years};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use everforest::{build_ever_forest, build_yearly_composites, yearly_output_path};
#[doc(inline)]
pub use geogrid::GeoGrid;
#[doc(inline)]
pub use geotransform::GeoTransform;
#[doc(inline)]
pub use kernel::Reduction;
#[doc(inline)]
pub use palette::ColorTablePalette;
#[doc(inline)]
pub use pipeline::{NumThreads, ProcessingOptions};
#[doc(inline)]
pub use pixelblock::PixelBlock;
#[doc(inline)]
pub use rastersize::RasterSize;
#[doc(inline)]
pub use runtimeconfiguration::RuntimeConfiguration;
#[doc(inline)]
pub use sourceset::RasterSourceSet;
#[doc(inline)]
pub use tiling::{BlockSpec, TileIterator, Tiling};
#[doc(inline)]
pub use writer::{Compression, OutputWriter, Predictor, RasterCreateOptions, RasterInfo, read_raster_info};

pub type Point<T = f64> = geo_types::Point<T>;
