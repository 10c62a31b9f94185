use crate::api::types::EntityId;
use crate::components::sprite::SpriteVisual;
use crate::core::rect::Rect;
use glam::Vec2;

/// Fat Entity — a single struct with optional components.
/// Designed for simplicity and rapid prototyping over ECS purity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding entities by name.
    pub tag: String,
    /// Whether this entity is active (inactive entities are swept by the game).
    pub active: bool,
    /// Screen-space bounding rect (top-left + size).
    pub rect: Rect,
    /// Straight-line velocity in px/sec. Applied by the kinematics system.
    pub vel: Vec2,
    /// Sprite component (optional — entities without sprites are invisible).
    pub sprite: Option<SpriteVisual>,
}

impl Entity {
    /// Create a new entity with the given ID, zero-sized at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            rect: Rect::default(),
            vel: Vec2::ZERO,
            sprite: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_sprite(mut self, sprite: SpriteVisual) -> Self {
        self.sprite = Some(sprite);
        self
    }
}
