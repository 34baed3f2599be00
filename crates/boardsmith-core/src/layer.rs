use serde::{Deserialize, Serialize};

/// Physical layer a placed element lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Top copper.
    Top,
    /// Bottom copper.
    Bottom,
    /// Spans the board (plated through-holes).
    Board,
    /// The board slab itself.
    Substrate,
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Top => "top",
            Layer::Bottom => "bottom",
            Layer::Board => "board",
            Layer::Substrate => "substrate",
        }
    }

    pub fn is_copper(&self) -> bool {
        matches!(self, Layer::Top | Layer::Bottom)
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// RGB colour used by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LayerColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn to_f32_array(&self, opacity: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            opacity,
        ]
    }
}

impl Default for LayerColor {
    fn default() -> Self {
        Self::rgb(128, 128, 128)
    }
}

pub const COPPER: LayerColor = LayerColor::from_hex(0xD4AF37);
pub const SOLDER_MASK_GREEN: LayerColor = LayerColor::from_hex(0x008C4A);
pub const DRILL_BLACK: LayerColor = LayerColor::from_hex(0x111111);
