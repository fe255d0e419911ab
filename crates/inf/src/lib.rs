#![warn(clippy::unwrap_used)]

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod color;
mod error;
pub mod fs;
#[cfg(feature = "gdal")]
pub mod gdalinterop;
pub mod progressinfo;

#[doc(inline)]
pub use color::Color;
