//! Ever forest summaries and yearly forest composites from annual land cover rasters.

#[doc(inline)]
pub use geo;
#[doc(inline)]
pub use inf;
