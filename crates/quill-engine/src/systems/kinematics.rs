//! Straight-line kinematics — integrates entity velocity into position.

use crate::core::scene::Scene;

/// Move every active entity by its velocity for one `dt` step.
///
/// Call once per fixed update. Entities whose motion is authored elsewhere
/// (path-driven tiles, animation-driven effects) simply keep a zero
/// velocity.
pub fn step_kinematics(scene: &mut Scene, dt: f32) {
    for entity in scene.iter_mut() {
        if entity.active && entity.vel != glam::Vec2::ZERO {
            entity.rect.min += entity.vel * dt;
        }
    }
}
