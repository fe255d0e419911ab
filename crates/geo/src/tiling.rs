//! Division of a raster into non overlapping rectangular blocks.
//! The blocks are produced in row-major order, the last block of every row and column
//! is clipped to the remaining extent of the raster.

use std::iter::FusedIterator;

use crate::{Error, RasterSize, Result};

/// Rectangular region of a raster in pixel coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockSpec {
    pub x_offset: usize,
    pub y_offset: usize,
    pub width: usize,
    pub height: usize,
}

impl BlockSpec {
    pub const fn new(x_offset: usize, y_offset: usize, width: usize, height: usize) -> Self {
        BlockSpec {
            x_offset,
            y_offset,
            width,
            height,
        }
    }

    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the block lies completely within a raster of the given size
    pub const fn fits_in(&self, size: RasterSize) -> bool {
        self.x_offset + self.width <= size.cols && self.y_offset + self.height <= size.rows
    }
}

impl std::fmt::Display for BlockSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[x: {}, y: {}, {}x{}]", self.x_offset, self.y_offset, self.width, self.height)
    }
}

/// Block layout of a raster, the blocks are obtained lazily through [`Tiling::iter`] or [`Tiling::block`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tiling {
    raster_size: RasterSize,
    block_width: usize,
    block_height: usize,
}

impl Tiling {
    pub fn new(raster_size: RasterSize, block_width: usize, block_height: usize) -> Result<Self> {
        if block_width == 0 || block_height == 0 {
            return Err(Error::InvalidArgument(format!(
                "Invalid block size {block_width}x{block_height}, both dimensions must be positive"
            )));
        }

        Ok(Tiling {
            raster_size,
            block_width,
            block_height,
        })
    }

    pub fn raster_size(&self) -> RasterSize {
        self.raster_size
    }

    pub fn block_size(&self) -> (usize, usize) {
        (self.block_width, self.block_height)
    }

    /// Number of blocks in a row of blocks
    pub fn blocks_per_row(&self) -> usize {
        self.raster_size.cols.div_ceil(self.block_width)
    }

    /// Number of rows of blocks
    pub fn block_rows(&self) -> usize {
        self.raster_size.rows.div_ceil(self.block_height)
    }

    pub fn block_count(&self) -> usize {
        self.blocks_per_row() * self.block_rows()
    }

    /// The block at the given position in the row-major sequence
    pub fn block(&self, index: usize) -> Option<BlockSpec> {
        if index >= self.block_count() {
            return None;
        }

        let x_offset = (index % self.blocks_per_row()) * self.block_width;
        let y_offset = (index / self.blocks_per_row()) * self.block_height;

        Some(BlockSpec {
            x_offset,
            y_offset,
            width: self.block_width.min(self.raster_size.cols - x_offset),
            height: self.block_height.min(self.raster_size.rows - y_offset),
        })
    }

    /// Start a new pass over the blocks, every call yields the same sequence
    pub fn iter(&self) -> TileIterator {
        TileIterator { tiling: *self, next: 0 }
    }
}

impl IntoIterator for &Tiling {
    type Item = BlockSpec;
    type IntoIter = TileIterator;

    fn into_iter(self) -> TileIterator {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct TileIterator {
    tiling: Tiling,
    next: usize,
}

impl Iterator for TileIterator {
    type Item = BlockSpec;

    fn next(&mut self) -> Option<BlockSpec> {
        let block = self.tiling.block(self.next)?;
        self.next += 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tiling.block_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileIterator {}
impl FusedIterator for TileIterator {}
