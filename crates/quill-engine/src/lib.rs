pub mod anim;
pub mod api;
pub mod components;
pub mod core;
pub mod input;
pub mod motion;
pub mod systems;
pub mod text;

// Re-export key types at crate root for convenience
pub use crate::anim::{AnimScheduler, AnimSprite, ChainId, ChainRef, Easing, Pose, SpriteHandle};
pub use crate::api::game::{EngineContext, Game, GameConfig};
pub use crate::api::runner::GameRunner;
pub use crate::api::types::{EntityId, GameEvent, SoundEvent};
pub use crate::components::entity::Entity;
pub use crate::components::sprite::SpriteVisual;
pub use crate::core::rect::Rect;
pub use crate::core::rng::Rng;
pub use crate::core::scene::Scene;
pub use crate::core::time::{FixedTimestep, GameClock};
pub use crate::input::queue::{InputEvent, InputQueue};
pub use crate::motion::{stanza_speed, PathLayout, WordPaths, LANES};
pub use crate::systems::kinematics::step_kinematics;
pub use crate::text::{split_into_tiles, FontMetrics, PoemManifest, TileMeasure};
