use crate::{BlockSpec, Error, PixelCode, Result};

/// Pixel codes of one block of a raster, stored row by row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBlock {
    spec: BlockSpec,
    data: Vec<PixelCode>,
}

impl PixelBlock {
    pub fn filled_with(spec: BlockSpec, value: PixelCode) -> Self {
        PixelBlock {
            spec,
            data: vec![value; spec.cell_count()],
        }
    }

    pub fn from_vec(spec: BlockSpec, data: Vec<PixelCode>) -> Result<Self> {
        if data.len() != spec.cell_count() {
            return Err(Error::InvalidArgument(format!(
                "Pixel buffer of {} values does not match block {spec}",
                data.len()
            )));
        }

        Ok(PixelBlock { spec, data })
    }

    pub fn spec(&self) -> &BlockSpec {
        &self.spec
    }

    /// Shape as (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.spec.width, self.spec.height)
    }

    pub fn as_slice(&self) -> &[PixelCode] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [PixelCode] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<PixelCode> {
        self.data
    }
}
