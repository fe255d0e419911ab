//! Color table attached to the yearly composite rasters.

use gdal::raster::RasterBand;
use inf::{
    Color,
    color::TRANSPARENT,
    gdalinterop::{check_pointer, check_rc},
};

use crate::{PixelCode, Result};

/// The NLCD land cover legend colors
pub const NLCD_COLORS: [(PixelCode, Color); 15] = [
    (11, Color::rgb(70, 107, 159)),
    (12, Color::rgb(209, 222, 248)),
    (21, Color::rgb(222, 197, 197)),
    (22, Color::rgb(217, 146, 130)),
    (23, Color::rgb(235, 0, 0)),
    (24, Color::rgb(171, 0, 0)),
    (31, Color::rgb(179, 172, 159)),
    (41, Color::rgb(104, 171, 95)),
    (42, Color::rgb(28, 95, 44)),
    (43, Color::rgb(181, 197, 143)),
    (52, Color::rgb(204, 184, 121)),
    (71, Color::rgb(223, 223, 194)),
    (82, Color::rgb(171, 108, 40)),
    (90, Color::rgb(184, 217, 235)),
    (95, Color::rgb(108, 159, 184)),
];

/// Mapping of every 8-bit category code to an RGBA color, codes without a color are transparent
#[derive(Clone, PartialEq, Eq)]
pub struct ColorTablePalette {
    entries: [Color; 256],
}

impl Default for ColorTablePalette {
    fn default() -> Self {
        ColorTablePalette {
            entries: [TRANSPARENT; 256],
        }
    }
}

impl ColorTablePalette {
    pub fn with_entries(entries: &[(PixelCode, Color)]) -> Self {
        let mut palette = ColorTablePalette::default();
        for &(code, color) in entries {
            palette.set(code, color);
        }
        palette
    }

    /// NLCD legend, all other codes (including nodata) are transparent
    pub fn nlcd() -> Self {
        Self::with_entries(&NLCD_COLORS)
    }

    pub fn set(&mut self, code: PixelCode, color: Color) {
        self.entries[code as usize] = color;
    }

    pub fn color(&self, code: PixelCode) -> Color {
        self.entries[code as usize]
    }

    pub fn entries(&self) -> &[Color; 256] {
        &self.entries
    }

    /// Compare the colors ignoring the alpha channel, TIFF color maps do not store transparency
    pub fn rgb_matches(&self, other: &ColorTablePalette) -> bool {
        self.entries
            .iter()
            .zip(other.entries.iter())
            .all(|(a, b)| (a.r, a.g, a.b) == (b.r, b.g, b.b))
    }

    /// Attach the palette as color table to the band
    pub(crate) fn apply_to_band(&self, band: &RasterBand) -> Result {
        unsafe {
            let color_table = check_pointer(
                gdal_sys::GDALCreateColorTable(gdal_sys::GDALPaletteInterp::GPI_RGB),
                "GDALCreateColorTable",
            )?;

            for (index, color) in self.entries.iter().enumerate() {
                let entry = gdal_sys::GDALColorEntry {
                    c1: color.r as i16,
                    c2: color.g as i16,
                    c3: color.b as i16,
                    c4: color.a as i16,
                };
                gdal_sys::GDALSetColorEntry(color_table, index as i32, &entry);
            }

            // The band keeps a copy of the table
            let rc = gdal_sys::GDALSetRasterColorTable(band.c_rasterband(), color_table);
            gdal_sys::GDALDestroyColorTable(color_table);
            check_rc(rc)?;
        }

        Ok(())
    }

    /// Read the color table of a band, `None` when the band has no color table
    pub(crate) fn from_band(band: &RasterBand) -> Option<Self> {
        let mut palette = ColorTablePalette::default();

        unsafe {
            let color_table = gdal_sys::GDALGetRasterColorTable(band.c_rasterband());
            if color_table.is_null() {
                return None;
            }

            let count = gdal_sys::GDALGetColorEntryCount(color_table).clamp(0, 256);
            for index in 0..count {
                let entry = gdal_sys::GDALGetColorEntry(color_table, index);
                if let Some(entry) = entry.as_ref() {
                    palette.entries[index as usize] = Color::rgba(
                        color_component(entry.c1),
                        color_component(entry.c2),
                        color_component(entry.c3),
                        color_component(entry.c4),
                    );
                }
            }
        }

        Some(palette)
    }
}

fn color_component(value: i16) -> u8 {
    value.clamp(0, 255) as u8
}

impl std::fmt::Debug for ColorTablePalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .enumerate()
                    .filter(|(_, color)| !color.is_transparent())
                    .map(|(code, color)| (code, color.to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EVER_FOREST, NODATA};

    #[test]
    fn nlcd_palette() {
        let palette = ColorTablePalette::nlcd();
        assert_eq!(palette.color(41), Color::rgb(104, 171, 95));
        assert_eq!(palette.color(95), Color::rgb(108, 159, 184));
        assert!(palette.color(NODATA).is_transparent());
        assert!(palette.color(0).is_transparent());
        assert!(EVER_FOREST.codes().all(|code| palette.color(code).a == 255));

        let opaque = palette.entries().iter().filter(|c| !c.is_transparent()).count();
        assert_eq!(opaque, NLCD_COLORS.len());
    }

    #[test]
    fn set_entry() {
        let mut palette = ColorTablePalette::default();
        palette.set(7, Color::rgb(1, 2, 3));
        assert_eq!(palette.color(7), Color::rgb(1, 2, 3));
        assert_eq!(format!("{palette:?}"), "{7: \"#010203ff\"}");
    }

    #[test]
    fn rgb_comparison_ignores_alpha() {
        let mut opaque = ColorTablePalette::nlcd();
        opaque.set(NODATA, Color::rgb(0, 0, 0));
        assert_ne!(opaque, ColorTablePalette::nlcd());
        assert!(opaque.rgb_matches(&ColorTablePalette::nlcd()));

        opaque.set(NODATA, Color::rgb(0, 0, 1));
        assert!(!opaque.rgb_matches(&ColorTablePalette::nlcd()));
    }
}
