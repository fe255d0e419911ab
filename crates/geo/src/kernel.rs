//! Pixel wise reduction of aligned blocks into one output block.
//!
//! Both reductions are pure: the output of a block only depends on the input pixels of that block.
//! A nodata input pixel is never a member of the category set, so it never overwrites the base value.

use crate::{CategorySet, EVER_FOREST, Error, NODATA, PixelBlock, PixelCode, Result};

/// Ever membership reduction.
///
/// The output starts as `nodata` everywhere, then every source is applied in slice order and each
/// pixel that is a member of `set` overwrites the output. A pixel that is a member in any source ends
/// up as a member in the output, whatever the order of the sources. Which member code is stored when
/// the sources disagree depends on the order: the last source with a member code wins.
pub fn ever_membership(sources: &[&[PixelCode]], set: &CategorySet, nodata: PixelCode, output: &mut [PixelCode]) -> Result {
    for src in sources {
        check_length(src.len(), output.len())?;
    }

    output.fill(nodata);
    for src in sources {
        for (out, &value) in output.iter_mut().zip(src.iter()) {
            if set.contains(value) {
                *out = value;
            }
        }
    }

    Ok(())
}

/// Overlay reduction.
///
/// Output pixels take the `ever` value when it is a member of `set`, the `year` value otherwise.
pub fn overlay(ever: &[PixelCode], year: &[PixelCode], set: &CategorySet, output: &mut [PixelCode]) -> Result {
    check_length(ever.len(), output.len())?;
    check_length(year.len(), output.len())?;

    for ((out, &ever_value), &year_value) in output.iter_mut().zip(ever.iter()).zip(year.iter()) {
        *out = if set.contains(ever_value) { ever_value } else { year_value };
    }

    Ok(())
}

fn check_length(input: usize, output: usize) -> Result {
    if input != output {
        return Err(Error::InvalidArgument(format!(
            "Input block contains {input} pixels, output block contains {output} pixels"
        )));
    }

    Ok(())
}

/// The reduction policy applied to every block of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reduction {
    /// Any number of sources reduced with [`ever_membership`]
    EverMembership { set: CategorySet, nodata: PixelCode },
    /// Exactly two sources (ever raster first, year raster second) reduced with [`overlay`]
    Overlay { set: CategorySet },
}

impl Reduction {
    pub const fn ever_forest() -> Self {
        Reduction::EverMembership {
            set: EVER_FOREST,
            nodata: NODATA,
        }
    }

    pub const fn forest_overlay() -> Self {
        Reduction::Overlay { set: EVER_FOREST }
    }

    /// The number of sources the reduction requires, `None` for any non zero amount
    pub const fn source_count(&self) -> Option<usize> {
        match self {
            Reduction::EverMembership { .. } => None,
            Reduction::Overlay { .. } => Some(2),
        }
    }

    /// Reduce the input blocks into the output block, all blocks must have the same shape
    pub fn apply(&self, inputs: &[PixelBlock], output: &mut PixelBlock) -> Result {
        self.check_source_count(inputs.len())?;
        for input in inputs {
            if input.shape() != output.shape() {
                return Err(Error::SizeMismatch {
                    size1: input.shape(),
                    size2: output.shape(),
                });
            }
        }

        match self {
            Reduction::EverMembership { set, nodata } => {
                let sources: Vec<&[PixelCode]> = inputs.iter().map(PixelBlock::as_slice).collect();
                ever_membership(&sources, set, *nodata, output.as_mut_slice())
            }
            Reduction::Overlay { set } => overlay(inputs[0].as_slice(), inputs[1].as_slice(), set, output.as_mut_slice()),
        }
    }

    pub fn check_source_count(&self, count: usize) -> Result {
        match self.source_count() {
            Some(expected) if expected != count => Err(Error::InvalidArgument(format!(
                "{self} requires {expected} sources, got {count}"
            ))),
            None if count == 0 => Err(Error::InvalidArgument(format!("{self} requires at least one source"))),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for Reduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reduction::EverMembership { .. } => write!(f, "ever membership reduction"),
            Reduction::Overlay { .. } => write!(f, "overlay reduction"),
        }
    }
}
