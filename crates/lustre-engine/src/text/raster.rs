/// Script-facing font selector.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FontFace {
    /// Monospace.
    #[default]
    Fixed,
    /// Proportional.
    Var,
    /// Proportional, bold.
    VarBold,
}

impl FontFace {
    pub const ALL: [FontFace; 3] = [FontFace::Fixed, FontFace::Var, FontFace::VarBold];

    /// Parses `"FIXED"`, `"VAR"` or `"VAR BOLD"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FIXED" => Some(Self::Fixed),
            "VAR" => Some(Self::Var),
            "VAR BOLD" => Some(Self::VarBold),
            _ => None,
        }
    }
}

/// Laid-out text bounds in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Single-channel coverage mask, row-major, `width * height` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageBitmap {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

/// Turns strings into coverage masks.
///
/// Input text is already stripped of style escapes. Lines are separated by
/// `\n` and stacked top to bottom. Implementations must combine overlapping
/// glyph coverage with `max`, never by summing.
pub trait TextRasterizer {
    /// Height of one line at `px`.
    fn line_height(&self, face: FontFace, px: f32) -> f32;

    fn measure(&self, face: FontFace, px: f32, text: &str) -> TextExtent;

    /// Renders `text`; `None` when nothing is visible or no font is available.
    fn rasterize(&self, face: FontFace, px: f32, text: &str) -> Option<CoverageBitmap>;
}
