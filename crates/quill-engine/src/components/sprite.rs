/// Sprite component — the render-facing state of an entity.
///
/// The engine is headless: it never rasterizes anything. A host renderer
/// reads these values each frame after the animation pump has run.
#[derive(Debug, Clone)]
pub struct SpriteVisual {
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// Rotation in degrees, clockwise in screen space.
    pub angle: f32,
    /// White-overlay intensity in [0, 1], multiplied by the sprite's own
    /// per-pixel transparency when composited.
    pub flash: f32,
}

impl Default for SpriteVisual {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            angle: 0.0,
            flash: 0.0,
        }
    }
}

impl SpriteVisual {
    /// Fully opaque, unrotated, no overlay.
    pub fn opaque() -> Self {
        Self::default()
    }
}
