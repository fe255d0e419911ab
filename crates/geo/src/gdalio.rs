//! Low level block access on GDAL raster bands.

use std::{
    ffi::{c_int, c_void},
    path::Path,
};

use gdal::raster::{GdalType, RasterBand};
use inf::gdalinterop::check_rc;

use crate::{BlockSpec, Error, PixelCode, Result};

/// Open a GDAL raster dataset for reading
pub fn open_dataset_read_only(path: &Path) -> Result<gdal::Dataset> {
    let options = gdal::DatasetOptions {
        open_flags: gdal::GdalOpenFlags::GDAL_OF_READONLY | gdal::GdalOpenFlags::GDAL_OF_RASTER,
        ..Default::default()
    };

    Ok(gdal::Dataset::open_ex(path, options)?)
}

/// Paths on a GDAL virtual filesystem (`/vsimem/`, `/vsicurl/`, ...) do not exist on the local filesystem
pub fn is_virtual_path(path: &Path) -> bool {
    path.to_string_lossy().starts_with("/vsi")
}

pub fn to_c_int(value: usize) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| Error::InvalidArgument(format!("Raster dimension {value} is too large")))
}

/// Read a block of the band into the provided buffer, the buffer must contain exactly one value per block pixel
pub fn read_block(band: &RasterBand, block: &BlockSpec, data: &mut [PixelCode]) -> Result {
    check_buffer_size(block, data.len())?;
    raster_io(band, gdal_sys::GDALRWFlag::GF_Read, block, data.as_mut_ptr().cast::<c_void>())
}

/// Write the buffer to a block of the band, the buffer must contain exactly one value per block pixel
pub fn write_block(band: &RasterBand, block: &BlockSpec, data: &[PixelCode]) -> Result {
    check_buffer_size(block, data.len())?;
    // GDAL does not modify the buffer on write
    raster_io(band, gdal_sys::GDALRWFlag::GF_Write, block, data.as_ptr().cast_mut().cast::<c_void>())
}

fn check_buffer_size(block: &BlockSpec, len: usize) -> Result {
    if len != block.cell_count() {
        return Err(Error::InvalidArgument(format!(
            "Invalid data buffer provided: {len} pixels for block {block}"
        )));
    }

    Ok(())
}

fn raster_io(band: &RasterBand, flag: gdal_sys::GDALRWFlag::Type, block: &BlockSpec, data_ptr: *mut c_void) -> Result {
    let x_offset = to_c_int(block.x_offset)?;
    let y_offset = to_c_int(block.y_offset)?;
    let width = to_c_int(block.width)?;
    let height = to_c_int(block.height)?;

    unsafe {
        check_rc(gdal_sys::GDALRasterIOEx(
            band.c_rasterband(),
            flag,
            x_offset,
            y_offset,
            width,
            height,
            data_ptr,
            width,
            height,
            <PixelCode as GdalType>::gdal_ordinal(),
            0,
            block.width as gdal_sys::GSpacing * std::mem::size_of::<PixelCode>() as gdal_sys::GSpacing,
            core::ptr::null_mut(),
        ))?;
    }

    Ok(())
}
