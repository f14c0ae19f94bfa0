pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Logical pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
        }
    }
}

/// Straight-alpha RGBA8 color. Serializes as the hex-string wire form
/// (`"#RRGGBB"`, or `"#RRGGBBAA"` when translucent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{s}'")))
    }
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RGB`, `#RRGGBB`, or `#RRGGBBAA`. Returns `None` on anything
    /// else; callers fall back to a palette default instead of erroring.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).unwrap_or(0) as u8);
                let (r, g, b) = (it.next()?, it.next()?, it.next()?);
                Some(Self::opaque(r * 17, g * 17, b * 17))
            }
            6 | 8 => {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                let (r, g, b) = (byte(0)?, byte(2)?, byte(4)?);
                let a = if hex.len() == 8 { byte(6)? } else { 255 };
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hex_string(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// First palette entry; the fill used whenever a step omits a color.
    pub const fn default_fill() -> Self {
        PALETTE[0]
    }
}

/// The fixed scheme cycle used by upstream step generators.
pub const PALETTE: [Rgba8; 4] = [
    Rgba8::opaque(0x3B, 0x82, 0xF6),
    Rgba8::opaque(0xEF, 0x44, 0x44),
    Rgba8::opaque(0x10, 0xB9, 0x81),
    Rgba8::opaque(0xF5, 0x9E, 0x0B),
];

/// Shape outline and caption ink.
pub const COLOR_INK: Rgba8 = Rgba8::opaque(0x1E, 0x29, 0x3B);
/// Connection lines and arrowheads.
pub const COLOR_CONNECTION: Rgba8 = Rgba8::opaque(0x64, 0x74, 0x8B);
/// Surface background.
pub const COLOR_BACKGROUND: Rgba8 = Rgba8::opaque(0xFF, 0xFF, 0xFF);
/// Cosmetic grid lines.
pub const COLOR_GRID: Rgba8 = Rgba8::opaque(0xF1, 0xF5, 0xF9);
/// Element label text.
pub const COLOR_LABEL: Rgba8 = Rgba8::opaque(0xFF, 0xFF, 0xFF);
/// Emphasis ring for the highlighted element.
pub const COLOR_HIGHLIGHT: Rgba8 = PALETTE[1];

/// Fallback coordinate for `create` steps with an absent or malformed
/// position.
pub const DEFAULT_POSITION: Point = Point::new(300.0, 150.0);
