use log::debug;

use crate::api::game::{EngineContext, Game, GameConfig};
use crate::api::types::{GameEvent, SoundEvent};
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputEvent, InputQueue};

/// Headless game runner that wires up the engine loop.
///
/// The host calls `tick(frame_dt)` once per rendered frame. The runner
/// advances the clock, pumps the animation scheduler exactly once, then
/// runs however many fixed game steps the frame owes.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        Self {
            game,
            ctx: EngineContext::new(),
            input: InputQueue::new(),
            timestep,
            config,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.game.init(&mut self.ctx);
        self.initialized = true;
        debug!("game runner initialized");
    }

    /// Queue an input event for the next update.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Advance one rendered frame of `frame_dt` seconds.
    pub fn tick(&mut self, frame_dt: f32) {
        if !self.initialized {
            self.init();
        }

        self.ctx.clear_frame_data();
        self.ctx.clock.advance(frame_dt);

        // Once per frame: drain due delayed calls, advance every live
        // animation chain.
        let now = self.ctx.clock.now_ms();
        self.ctx.scheduler.tick(now);

        // Events are seen by the first step only; a slow frame that owes
        // several steps must not replay key presses.
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            self.input.drain();
        }

        self.ctx.sounds.truncate(self.config.max_sounds);
        self.ctx.events.truncate(self.config.max_events);
    }

    /// Sound events emitted during the most recent tick.
    pub fn sounds(&self) -> &[SoundEvent] {
        &self.ctx.sounds
    }

    /// Game events emitted during the most recent tick.
    pub fn events(&self) -> &[GameEvent] {
        &self.ctx.events
    }

    /// The engine context, for host-side inspection (scene, clock).
    pub fn ctx(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn game(&self) -> &G {
        &self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::SoundEvent;

    struct CountingGame {
        inits: u32,
        updates: u32,
    }

    impl Game for CountingGame {
        fn init(&mut self, _ctx: &mut EngineContext) {
            self.inits += 1;
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.updates += 1;
            if !input.is_empty() {
                ctx.emit_sound(SoundEvent(9));
            }
        }
    }

    #[test]
    fn runner_inits_once_and_steps_fixed() {
        let mut runner = GameRunner::new(CountingGame {
            inits: 0,
            updates: 0,
        });
        runner.tick(1.0 / 60.0);
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game().inits, 1);
        assert_eq!(runner.game().updates, 2);
    }

    #[test]
    fn inputs_reach_the_update_then_drain() {
        let mut runner = GameRunner::new(CountingGame {
            inits: 0,
            updates: 0,
        });
        runner.push_input(InputEvent::KeyDown { key_code: 32 });
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.sounds(), &[SoundEvent(9)]);
        runner.tick(1.0 / 60.0);
        assert!(runner.sounds().is_empty());
    }

    #[test]
    fn clock_tracks_frames() {
        let mut runner = GameRunner::new(CountingGame {
            inits: 0,
            updates: 0,
        });
        for _ in 0..30 {
            runner.tick(1.0 / 60.0);
        }
        let now = runner.ctx().now_ms();
        assert!((499..=501).contains(&now), "half a second, got {now}");
    }
}
