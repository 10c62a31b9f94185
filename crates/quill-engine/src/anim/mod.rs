// anim/mod.rs
//
// Time-driven animation: chained per-sprite steps, easing math, and the
// scheduler that pumps every live chain once per frame.

pub mod chain;
pub mod easing;
pub mod scheduler;

pub use chain::{AnimSprite, ChainId, ChainRef, Pose, StepStatus};
pub use easing::{ease, lerp, lerp_vec2, Easing};
pub use scheduler::{AnimScheduler, SpriteHandle};
