//! Page geometry and palette shared by the composer and the PDF writer.
//!
//! All layout coordinates are millimetres measured from the top-left corner
//! of the page; the writer flips them into PDF user space.

use serde::{Deserialize, Serialize};

/// Printable page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    /// ISO A4 portrait with a uniform 20 mm margin.
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 20.0,
        }
    }

    pub fn top(&self) -> f32 {
        self.margin_mm
    }

    /// Lowest y any drawing may reach.
    pub fn bottom(&self) -> f32 {
        self.height_mm - self.margin_mm
    }

    pub fn left(&self) -> f32 {
        self.margin_mm
    }

    pub fn right(&self) -> f32 {
        self.width_mm - self.margin_mm
    }

    pub fn content_width(&self) -> f32 {
        self.right() - self.left()
    }

    pub fn content_height(&self) -> f32 {
        self.bottom() - self.top()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to 0.0..=1.0 for PDF colour operators.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

pub mod palette {
    use super::Color;

    pub const ACCENT: Color = Color::rgb(0x00, 0xd4, 0xff);
    pub const SECONDARY: Color = Color::rgb(0x7c, 0x3a, 0xed);
    pub const INK: Color = Color::rgb(0x0a, 0x0e, 0x27);
    pub const BODY: Color = Color::rgb(0x1a, 0x1a, 0x1a);
    pub const MUTED: Color = Color::rgb(0x66, 0x66, 0x66);
    pub const RULE: Color = Color::rgb(0xe0, 0xe0, 0xe0);
    pub const PLACEHOLDER: Color = Color::rgb(0xf0, 0xf0, 0xff);
}
