//! Scripted input source so headless runs actually play the game.

use quill_engine::{EngineContext, InputEvent};

use crate::game::{
    BlasterMini, GamePhase, AXIS_LEFT_X, BULLET_SPEED, KEY_CONTINUE, KEY_FIRE, MUZZLE_OFFSET_X,
};

/// Aim tolerance before firing, px.
const FIRE_WINDOW: f32 = 25.0;
/// Steering stops inside this band to avoid jitter, px.
const SETTLE_BAND: f32 = 6.0;
/// Frames between shots.
const FIRE_COOLDOWN: u32 = 15;

pub struct Autopilot {
    cooldown: u32,
}

impl Autopilot {
    pub fn new() -> Self {
        Self { cooldown: 0 }
    }

    /// Produce this frame's inputs: chase the flashing tile's predicted
    /// position, fire when lined up, and press continue between stanzas.
    pub fn drive(&mut self, game: &BlasterMini, ctx: &EngineContext) -> Vec<InputEvent> {
        let mut out = Vec::new();
        self.cooldown = self.cooldown.saturating_sub(1);

        match game.phase() {
            GamePhase::BetweenStanzas => {
                out.push(InputEvent::Axis {
                    axis: AXIS_LEFT_X,
                    value: 0.0,
                });
                if game.continue_ready() {
                    out.push(InputEvent::KeyDown {
                        key_code: KEY_CONTINUE,
                    });
                }
            }
            GamePhase::Playing => {
                let Some(player) = game.player_id().and_then(|id| ctx.scene.get(id)) else {
                    return out;
                };
                let Some(target_idx) = game.next_tile_idx() else {
                    return out;
                };
                let now = ctx.now_ms();
                let Some(target_now) = game.predict_tile_center(target_idx, now, 0) else {
                    return out;
                };

                // Lead the shot by the bullet's flight time to the tile's row.
                let muzzle_x = player.rect.center().x + MUZZLE_OFFSET_X;
                let flight = (player.rect.top() - target_now.y).max(0.0) / BULLET_SPEED;
                let aim = game
                    .predict_tile_center(target_idx, now, (flight * 1000.0) as u64)
                    .unwrap_or(target_now);

                let dx = aim.x - muzzle_x;
                let steer = if dx.abs() < SETTLE_BAND {
                    0.0
                } else {
                    dx.signum()
                };
                out.push(InputEvent::Axis {
                    axis: AXIS_LEFT_X,
                    value: steer,
                });
                if dx.abs() < FIRE_WINDOW && self.cooldown == 0 {
                    out.push(InputEvent::KeyDown { key_code: KEY_FIRE });
                    self.cooldown = FIRE_COOLDOWN;
                }
            }
        }
        out
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}
