//! Categorical pixel codes of land cover classification rasters.

/// An 8-bit land cover category code
pub type PixelCode = u8;

/// Reserved value for pixels without a valid classification, or that were never part of the ever-set
pub const NODATA: PixelCode = 250;

/// The forest categories: deciduous (41), evergreen (42) and mixed (43)
pub const EVER_FOREST: CategorySet = CategorySet::from_codes(&[41, 42, 43]);

/// Fixed set of category codes with constant time membership tests
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CategorySet {
    members: [bool; 256],
}

impl CategorySet {
    pub const fn empty() -> Self {
        CategorySet { members: [false; 256] }
    }

    pub const fn from_codes(codes: &[PixelCode]) -> Self {
        let mut members = [false; 256];
        let mut i = 0;
        while i < codes.len() {
            members[codes[i] as usize] = true;
            i += 1;
        }

        CategorySet { members }
    }

    #[inline]
    pub const fn contains(&self, code: PixelCode) -> bool {
        self.members[code as usize]
    }

    pub fn codes(&self) -> impl Iterator<Item = PixelCode> + '_ {
        (0..=PixelCode::MAX).filter(|&code| self.contains(code))
    }

    pub fn len(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        CategorySet::empty()
    }
}

impl std::fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codes()).finish()
    }
}
