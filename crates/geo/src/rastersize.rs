/// Raster size represented by rows and columns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterSize {
    pub rows: usize,
    pub cols: usize,
}

impl RasterSize {
    pub const fn with_rows_cols(rows: usize, cols: usize) -> Self {
        RasterSize { rows, cols }
    }

    pub const fn square(size: usize) -> Self {
        RasterSize { rows: size, cols: size }
    }

    pub const fn empty() -> Self {
        Self::with_rows_cols(0, 0)
    }

    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Width in pixels
    pub const fn width(&self) -> usize {
        self.cols
    }

    /// Height in pixels
    pub const fn height(&self) -> usize {
        self.rows
    }
}

impl std::fmt::Display for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(rows: {}, cols: {})", self.rows, self.cols)
    }
}

impl std::fmt::Debug for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}
