/// RGBA color, each component in the [0, 255] range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Fully opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::rgba(r, g, b, 255)
    }

    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub const fn to_bits(&self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bits() {
        assert_eq!(Color::rgba(0x11, 0x22, 0x33, 0x44).to_bits(), 0x11223344);
        assert_eq!(TRANSPARENT.to_bits(), 0);
    }

    #[test]
    fn color_display() {
        assert_eq!(Color::rgb(104, 171, 95).to_string(), "#68ab5fff");
        assert!(TRANSPARENT.is_transparent());
    }
}
