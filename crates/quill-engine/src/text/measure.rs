use glam::Vec2;

/// Text-measurement collaborator.
///
/// Path layout depends on every tile's rendered footprint, but rendering is
/// a host concern, so the engine asks through this seam.
pub trait TileMeasure {
    /// Rendered size (width, height) of one tile's boxed text.
    fn measure(&self, text: &str) -> Vec2;
}

/// Fixed-cell font metrics: each glyph occupies one cell, the boxed tile
/// adds padding and never shrinks below the box art's minimum size.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub glyph_w: f32,
    pub glyph_h: f32,
    /// Horizontal and vertical padding around the text.
    pub pad: Vec2,
    /// Minimum tile size imposed by the box artwork.
    pub min_size: Vec2,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            glyph_w: 14.0,
            glyph_h: 24.0,
            pad: Vec2::new(40.0, 25.0),
            min_size: Vec2::new(55.0, 29.0),
        }
    }
}

impl TileMeasure for FontMetrics {
    fn measure(&self, text: &str) -> Vec2 {
        let chars = text.chars().count() as f32;
        Vec2::new(
            (chars * self.glyph_w + self.pad.x).max(self.min_size.x),
            (self.glyph_h + self.pad.y).max(self.min_size.y),
        )
    }
}
