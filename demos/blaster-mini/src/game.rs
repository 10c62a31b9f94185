use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec2;
use log::{debug, info};

use quill_engine::{
    split_into_tiles, stanza_speed, step_kinematics, Easing, Entity, EngineContext, EntityId,
    FontMetrics, Game, GameConfig, GameEvent, InputEvent, InputQueue, PathLayout, PoemManifest,
    Rect, Rng, SoundEvent, SpriteHandle, SpriteVisual, TileMeasure, WordPaths,
};

/// The bundled poem manifest.
pub const POEM_JSON: &str = include_str!("../assets/poem.json");

// Screen layout
pub const SCREEN_W: f32 = 800.0;
pub const SCREEN_H: f32 = 600.0;
const TOP_MARGIN: f32 = 35.0;

// Player (a quill pen; the nib sits right of the sprite's center)
const PLAYER_SIZE: Vec2 = Vec2::new(50.0, 40.0);
const PLAYER_SPEED: f32 = 420.0;
// The player may drift slightly offscreen.
const PLAYER_MIN_X: f32 = -70.0;
const PLAYER_MAX_X: f32 = SCREEN_W + 10.0;
pub const MUZZLE_OFFSET_X: f32 = 60.0;

pub const BULLET_SIZE: Vec2 = Vec2::new(9.0, 13.0);
pub const BULLET_SPEED: f32 = 600.0;

const DEADZONE: f32 = 0.2;

const HIT_EFFECT_DURATION: f32 = 0.8;
const HIT_EFFECT_RISE: f32 = 80.0;
const PLUS_FIVE_SIZE: Vec2 = Vec2::new(42.0, 26.0);
const BLOTCH_SIZE: Vec2 = Vec2::new(48.0, 48.0);
const BLOTCH_DURATION: f32 = 0.5;
const BLOTCH_DROP: f32 = 30.0;

/// Seconds between clearing a stanza and the continue prompt unlocking.
const CONTINUE_DELAY: f32 = 2.0;

const FIXED_DT: f32 = 1.0 / 60.0;

// Host key codes
pub const KEY_LEFT: u32 = 37;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_FIRE: u32 = 32;
pub const KEY_CONTINUE: u32 = 13;
pub const AXIS_LEFT_X: u32 = 0;

// Sound events (engine -> host audio)
pub const SOUND_SPLAT: u32 = 1;

// Game event kinds (engine -> host)
pub const EVENT_SCORE: f32 = 1.0;
pub const EVENT_STANZA_COMPLETE: f32 = 2.0;

/// Game state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    BetweenStanzas,
}

/// What a transient effect sprite depicts, for the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    PlusFive,
    InkBlotch,
}

/// A fire-and-forget visual effect. The animation chains run it; the game
/// only keeps the handle alive until the closing continuation fires.
pub struct Effect {
    pub kind: EffectKind,
    pub sprite: SpriteHandle,
    /// Static rotation applied on top of the animated pose (ink splats
    /// land at a random tilt).
    pub angle_jitter: f32,
    done: Rc<Cell<bool>>,
}

/// One live word tile.
struct TileSlot {
    entity: EntityId,
    text: String,
    /// Carries the flash overlay for the "next word" highlight.
    flashy: SpriteHandle,
    is_next: bool,
}

pub struct BlasterMini {
    poem: PoemManifest,
    metrics: FontMetrics,
    rng: Rng,
    phase: GamePhase,
    /// 1-based; drives the per-stanza speed factor.
    stanza_number: u32,
    stanza_started_ms: u64,
    word_paths: Option<WordPaths>,
    tiles: BTreeMap<usize, TileSlot>,
    effects: Vec<Effect>,
    player_id: Option<EntityId>,
    score: u32,
    left_held: bool,
    right_held: bool,
    axis_x: f32,
    /// Set by a delayed call two seconds into the between-stanzas screen.
    continue_ready: Rc<Cell<bool>>,
}

impl BlasterMini {
    pub fn new(poem: PoemManifest, seed: u64) -> Self {
        Self {
            poem,
            metrics: FontMetrics::default(),
            rng: Rng::new(seed),
            phase: GamePhase::Playing,
            stanza_number: 1,
            stanza_started_ms: 0,
            word_paths: None,
            tiles: BTreeMap::new(),
            effects: Vec::new(),
            player_id: None,
            score: 0,
            left_held: false,
            right_held: false,
            axis_x: 0.0,
            continue_ready: Rc::new(Cell::new(false)),
        }
    }

    // -- Host-facing state --

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn stanza_number(&self) -> u32 {
        self.stanza_number
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    pub fn live_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn continue_ready(&self) -> bool {
        self.continue_ready.get()
    }

    /// Index of the flashing "next word" tile, if any are left.
    pub fn next_tile_idx(&self) -> Option<usize> {
        self.tiles
            .iter()
            .find(|(_, slot)| slot.is_next)
            .map(|(&idx, _)| idx)
    }

    pub fn tile_entity(&self, tile_idx: usize) -> Option<EntityId> {
        self.tiles.get(&tile_idx).map(|slot| slot.entity)
    }

    /// Where a tile's center will be `lead_ms` from `now_ms`. Lets an aim
    /// assist lead the target; returns None once the tile will be gone.
    pub fn predict_tile_center(&self, tile_idx: usize, now_ms: u64, lead_ms: u64) -> Option<Vec2> {
        let wp = self.word_paths.as_ref()?;
        let slot = self.tiles.get(&tile_idx)?;
        let elapsed = now_ms.saturating_sub(self.stanza_started_ms) + lead_ms;
        let (top_left, done) = wp.tile_pos(tile_idx, elapsed);
        if done {
            return None;
        }
        Some(top_left + self.metrics.measure(&slot.text) * 0.5)
    }

    // -- Stanza lifecycle --

    fn start_stanza(&mut self, ctx: &mut EngineContext) {
        let idx = (self.stanza_number as usize - 1) % self.poem.stanzas.len();
        let tile_texts = split_into_tiles(&self.poem.stanzas[idx]);
        let layout = PathLayout {
            screen_w: SCREEN_W,
            screen_h: SCREEN_H,
            top_margin: TOP_MARGIN,
            bottom_margin: PLAYER_SIZE.y,
        };
        let speed = stanza_speed(self.poem.base_speed, self.stanza_number);
        let paths = WordPaths::for_tiles(&tile_texts, &self.metrics, &layout, speed);
        let now = ctx.now_ms();

        self.tiles.clear();
        for (i, text) in tile_texts.iter().enumerate() {
            let (pos, _) = paths.tile_pos(i, 0);
            let size = self.metrics.measure(text);
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag("tile")
                    .with_rect(Rect::new(pos, size))
                    .with_sprite(SpriteVisual::opaque()),
            );
            let flashy = ctx.scheduler.spawn_sprite(Rect::new(pos, size));
            self.tiles.insert(
                i,
                TileSlot {
                    entity: id,
                    text: text.clone(),
                    flashy,
                    is_next: false,
                },
            );
        }

        info!(
            "stanza {} begins: {} tiles at {:.0} px/s",
            self.stanza_number,
            self.tiles.len(),
            speed
        );
        self.word_paths = Some(paths);
        self.stanza_started_ms = now;
        self.phase = GamePhase::Playing;
        self.promote_next_tile(now);
    }

    fn finish_stanza(&mut self, ctx: &mut EngineContext) {
        self.phase = GamePhase::BetweenStanzas;
        self.word_paths = None;
        self.continue_ready.set(false);
        let ready = Rc::clone(&self.continue_ready);
        ctx.scheduler
            .call_after(ctx.now_ms(), CONTINUE_DELAY, move |_| ready.set(true));
        ctx.emit_event(GameEvent::new(EVENT_STANZA_COMPLETE).with_a(self.stanza_number as f32));
        info!(
            "stanza {} complete, score {}",
            self.stanza_number, self.score
        );
    }

    /// Mark the lowest-index live tile as the flashing target.
    fn promote_next_tile(&mut self, now_ms: u64) {
        if let Some((_, slot)) = self.tiles.iter_mut().next() {
            if !slot.is_next {
                slot.is_next = true;
                slot.flashy.borrow_mut().start_flashing(now_ms);
            }
        }
    }

    // -- Per-tick work --

    fn steer_player(&mut self, ctx: &mut EngineContext) {
        // Joystick overrides the keyboard when it is out of its deadzone.
        let speed_x = if self.axis_x != 0.0 {
            self.axis_x * PLAYER_SPEED
        } else {
            let mut v = 0.0;
            if self.left_held {
                v -= PLAYER_SPEED;
            }
            if self.right_held {
                v += PLAYER_SPEED;
            }
            v
        };
        if let Some(id) = self.player_id {
            if let Some(player) = ctx.scene.get_mut(id) {
                player.vel.x = speed_x;
            }
        }
    }

    fn clamp_player(&self, ctx: &mut EngineContext) {
        if let Some(id) = self.player_id {
            if let Some(player) = ctx.scene.get_mut(id) {
                if player.rect.left() < PLAYER_MIN_X {
                    player.rect.min.x = PLAYER_MIN_X;
                }
                if player.rect.right() > PLAYER_MAX_X {
                    player.rect.min.x = PLAYER_MAX_X - player.rect.size.x;
                }
            }
        }
    }

    fn shoot(&mut self, ctx: &mut EngineContext) {
        let Some(player_rect) = self
            .player_id
            .and_then(|id| ctx.scene.get(id))
            .map(|p| p.rect)
        else {
            return;
        };
        let mut rect = Rect::centered(
            Vec2::new(player_rect.center().x + MUZZLE_OFFSET_X, 0.0),
            BULLET_SIZE,
        );
        rect.min.y = player_rect.top() - BULLET_SIZE.y;
        let id = ctx.next_id();
        ctx.scene.spawn(
            Entity::new(id)
                .with_tag("bullet")
                .with_rect(rect)
                .with_vel(Vec2::new(0.0, -BULLET_SPEED))
                .with_sprite(SpriteVisual::opaque()),
        );
    }

    /// Reposition every tile from the path engine, mirror the flash pose
    /// onto its entity, and despawn tiles that ran off the lane's end.
    fn advance_tiles(&mut self, ctx: &mut EngineContext) {
        let Some(paths) = &self.word_paths else {
            return;
        };
        let elapsed = ctx.now_ms().saturating_sub(self.stanza_started_ms);

        let mut walked_off = Vec::new();
        for (&idx, slot) in &self.tiles {
            let (pos, done) = paths.tile_pos(idx, elapsed);
            if done {
                walked_off.push(idx);
                continue;
            }
            if let Some(entity) = ctx.scene.get_mut(slot.entity) {
                entity.rect.min = pos;
                if let Some(sprite) = &mut entity.sprite {
                    let pose = slot.flashy.borrow().pose;
                    sprite.flash = pose.flash;
                    sprite.alpha = pose.alpha;
                }
            }
        }

        let mut lost_next = false;
        for idx in walked_off {
            if let Some(slot) = self.tiles.remove(&idx) {
                ctx.scene.despawn(slot.entity);
                lost_next |= slot.is_next;
                debug!("tile {} '{}' escaped", idx, slot.text);
            }
        }
        if lost_next {
            self.promote_next_tile(ctx.now_ms());
        }
    }

    fn resolve_hits(&mut self, ctx: &mut EngineContext) {
        let bullets: Vec<(EntityId, Rect)> = ctx
            .scene
            .iter()
            .filter(|e| e.tag == "bullet")
            .map(|e| (e.id, e.rect))
            .collect();
        if bullets.is_empty() {
            return;
        }
        let tile_rects: Vec<(usize, Rect)> = self
            .tiles
            .iter()
            .filter_map(|(&i, slot)| ctx.scene.get(slot.entity).map(|e| (i, e.rect)))
            .collect();

        // Each bullet claims at most one tile and vice versa.
        let mut claimed: Vec<usize> = Vec::new();
        let mut hits: Vec<(usize, EntityId, Rect)> = Vec::new();
        for (bullet_id, bullet_rect) in bullets {
            if let Some(&(idx, tile_rect)) = tile_rects
                .iter()
                .find(|(i, r)| !claimed.contains(i) && r.intersects(&bullet_rect))
            {
                claimed.push(idx);
                hits.push((idx, bullet_id, tile_rect));
            }
        }
        if hits.is_empty() {
            return;
        }

        ctx.emit_sound(SoundEvent(SOUND_SPLAT));
        let mut next_was_hit = false;
        for (idx, bullet_id, tile_rect) in hits {
            let Some(bullet) = ctx.scene.despawn(bullet_id) else {
                continue;
            };
            let Some(slot) = self.tiles.remove(&idx) else {
                continue;
            };
            ctx.scene.despawn(slot.entity);

            let points = if slot.is_next { 5 } else { 1 };
            next_was_hit |= slot.is_next;
            self.score += points;
            if slot.is_next {
                self.spawn_plus_five(ctx, tile_rect.center());
            }
            self.spawn_blotch(ctx, bullet.rect.center());
            ctx.emit_event(
                GameEvent::new(EVENT_SCORE).with_ab(self.score as f32, points as f32),
            );
            debug!("hit tile {} '{}' (+{})", idx, slot.text, points);
        }
        if next_was_hit {
            self.promote_next_tile(ctx.now_ms());
        }
    }

    fn spawn_plus_five(&mut self, ctx: &mut EngineContext, center: Vec2) {
        let now = ctx.now_ms();
        let sprite = ctx
            .scheduler
            .spawn_sprite(Rect::centered(center, PLUS_FIVE_SIZE));
        let done = Rc::new(Cell::new(false));
        {
            let mut s = sprite.borrow_mut();
            s.fade_out(now, HIT_EFFECT_DURATION);
            s.rotate(now, HIT_EFFECT_DURATION * 5.0, HIT_EFFECT_DURATION);
            let flag = Rc::clone(&done);
            s.slide(now, Vec2::new(0.0, -HIT_EFFECT_RISE), HIT_EFFECT_DURATION)
                .then(move || flag.set(true));
        }
        self.effects.push(Effect {
            kind: EffectKind::PlusFive,
            sprite,
            angle_jitter: 0.0,
            done,
        });
    }

    fn spawn_blotch(&mut self, ctx: &mut EngineContext, center: Vec2) {
        let now = ctx.now_ms();
        let sprite = ctx
            .scheduler
            .spawn_sprite(Rect::centered(center, BLOTCH_SIZE));
        let done = Rc::new(Cell::new(false));
        {
            let mut s = sprite.borrow_mut();
            s.slide(now, Vec2::new(0.0, BLOTCH_DROP), BLOTCH_DURATION)
                .eased(Easing::QuadIn);
            let flag = Rc::clone(&done);
            s.fade_out(now, BLOTCH_DURATION).then(move || flag.set(true));
        }
        self.effects.push(Effect {
            kind: EffectKind::InkBlotch,
            sprite,
            angle_jitter: self.rng.next_range(-50, 50) as f32,
            done,
        });
    }

    fn update_playing(&mut self, ctx: &mut EngineContext, fire: bool) {
        self.steer_player(ctx);
        if fire {
            self.shoot(ctx);
        }

        step_kinematics(&mut ctx.scene, FIXED_DT);
        self.clamp_player(ctx);

        // Bullets that left the top of the screen are spent.
        for e in ctx.scene.iter_mut() {
            if e.tag == "bullet" && e.rect.bottom() < 0.0 {
                e.active = false;
            }
        }
        ctx.scene.retain(|e| e.active);

        self.advance_tiles(ctx);
        self.resolve_hits(ctx);

        if self.tiles.is_empty() {
            self.finish_stanza(ctx);
        }
    }
}

impl Game for BlasterMini {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            screen_w: SCREEN_W,
            screen_h: SCREEN_H,
            ..Default::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        let id = ctx.next_id();
        let mut rect = Rect::centered(Vec2::new(SCREEN_W / 2.0, 0.0), PLAYER_SIZE);
        rect.min.y = SCREEN_H - PLAYER_SIZE.y;
        ctx.scene.spawn(
            Entity::new(id)
                .with_tag("player")
                .with_rect(rect)
                .with_sprite(SpriteVisual::opaque()),
        );
        self.player_id = Some(id);
        self.stanza_number = 1;
        self.start_stanza(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        let mut fire = false;
        let mut continue_pressed = false;
        for event in input.iter() {
            match *event {
                InputEvent::KeyDown { key_code } => match key_code {
                    KEY_LEFT => self.left_held = true,
                    KEY_RIGHT => self.right_held = true,
                    KEY_FIRE => fire = true,
                    KEY_CONTINUE => continue_pressed = true,
                    _ => {}
                },
                InputEvent::KeyUp { key_code } => match key_code {
                    KEY_LEFT => self.left_held = false,
                    KEY_RIGHT => self.right_held = false,
                    _ => {}
                },
                InputEvent::Axis { axis, value } if axis == AXIS_LEFT_X => {
                    self.axis_x = if value.abs() < DEADZONE { 0.0 } else { value };
                }
                _ => {}
            }
        }

        // Finished effects drop their handles here; the scheduler's weak
        // registry forgets them on its own.
        self.effects.retain(|fx| !fx.done.get());

        match self.phase {
            GamePhase::Playing => self.update_playing(ctx, fire),
            GamePhase::BetweenStanzas => {
                if continue_pressed && self.continue_ready.get() {
                    self.stanza_number += 1;
                    self.start_stanza(ctx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autopilot::Autopilot;
    use quill_engine::GameRunner;

    fn tiny_poem(base_speed: f32) -> PoemManifest {
        PoemManifest::from_json(&format!(
            r#"{{ "title": "tiny", "stanzas": ["Hi yo"], "base_speed": {base_speed} }}"#
        ))
        .unwrap()
    }

    fn runner_with(poem: PoemManifest) -> GameRunner<BlasterMini> {
        let mut runner = GameRunner::new(BlasterMini::new(poem, 7));
        runner.init();
        runner
    }

    #[test]
    fn bundled_poem_parses_and_merges_short_words() {
        let poem = PoemManifest::from_json(POEM_JSON).unwrap();
        assert_eq!(poem.stanzas.len(), 2);
        let tiles = split_into_tiles(&poem.stanzas[0]);
        // "I" rides with "Because"; the dash rides with "Death".
        assert_eq!(tiles[0], "Because I");
        assert!(tiles.contains(&"Death -".to_string()));
    }

    #[test]
    fn firing_spawns_a_bullet_that_flies_offscreen() {
        let mut runner = runner_with(tiny_poem(100.0));
        runner.push_input(InputEvent::KeyDown { key_code: KEY_FIRE });
        runner.tick(FIXED_DT);
        assert_eq!(runner.ctx().scene.count_by_tag("bullet"), 1);

        // 600 px/s upward clears the 600 px screen in well under 2 s.
        for _ in 0..120 {
            runner.tick(FIXED_DT);
        }
        assert_eq!(runner.ctx().scene.count_by_tag("bullet"), 0);
    }

    #[test]
    fn first_tile_flashes_as_next() {
        let runner = runner_with(tiny_poem(100.0));
        let game = runner.game();
        assert_eq!(game.next_tile_idx(), Some(0));
        assert_eq!(game.live_tiles(), 2);
    }

    #[test]
    fn escaped_tiles_end_the_stanza_and_gate_continue() {
        // Fast tiles clear both lanes in a few seconds.
        let mut runner = runner_with(tiny_poem(2000.0));

        let mut frames = 0;
        while runner.game().phase() == GamePhase::Playing {
            runner.tick(FIXED_DT);
            frames += 1;
            assert!(frames < 600, "tiles never escaped");
        }
        assert_eq!(runner.game().stanza_number(), 1);
        assert_eq!(runner.game().live_tiles(), 0);

        // The continue prompt is still locked; pressing does nothing.
        runner.push_input(InputEvent::KeyDown {
            key_code: KEY_CONTINUE,
        });
        runner.tick(FIXED_DT);
        assert_eq!(runner.game().phase(), GamePhase::BetweenStanzas);

        // Two seconds later the delayed call unlocks it.
        for _ in 0..130 {
            runner.tick(FIXED_DT);
        }
        assert!(runner.game().continue_ready());
        runner.push_input(InputEvent::KeyDown {
            key_code: KEY_CONTINUE,
        });
        runner.tick(FIXED_DT);
        assert_eq!(runner.game().phase(), GamePhase::Playing);
        assert_eq!(runner.game().stanza_number(), 2);
    }

    #[test]
    fn axis_within_deadzone_is_ignored() {
        let mut runner = runner_with(tiny_poem(100.0));
        let player = runner.game().player_id().unwrap();
        let x0 = runner.ctx().scene.get(player).unwrap().rect.min.x;

        runner.push_input(InputEvent::Axis {
            axis: AXIS_LEFT_X,
            value: 0.1,
        });
        for _ in 0..30 {
            runner.tick(FIXED_DT);
        }
        let x1 = runner.ctx().scene.get(player).unwrap().rect.min.x;
        assert_eq!(x0, x1);

        runner.push_input(InputEvent::Axis {
            axis: AXIS_LEFT_X,
            value: -1.0,
        });
        for _ in 0..30 {
            runner.tick(FIXED_DT);
        }
        let x2 = runner.ctx().scene.get(player).unwrap().rect.min.x;
        assert!(x2 < x1, "full deflection should move the player");
    }

    #[test]
    fn autopilot_scores_against_the_real_poem() {
        let poem = PoemManifest::from_json(POEM_JSON).unwrap();
        let mut runner = runner_with(poem);
        let mut pilot = Autopilot::new();
        let mut heard_splat = false;

        for _ in 0..7200 {
            for event in pilot.drive(runner.game(), runner.ctx()) {
                runner.push_input(event);
            }
            runner.tick(FIXED_DT);
            heard_splat |= runner
                .sounds()
                .iter()
                .any(|s| *s == SoundEvent(SOUND_SPLAT));
            if runner.game().score() >= 5 {
                break;
            }
        }
        assert!(
            runner.game().score() > 0,
            "two minutes of autopilot should land a hit"
        );
        assert!(heard_splat);
    }

    #[test]
    fn hit_effect_rises_then_reports_done() {
        let mut runner = runner_with(tiny_poem(100.0));

        let ctx = runner.ctx_mut();
        let sprite = ctx
            .scheduler
            .spawn_sprite(Rect::centered(Vec2::new(400.0, 300.0), PLUS_FIVE_SIZE));
        let now = ctx.now_ms();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        sprite
            .borrow_mut()
            .slide(now, Vec2::new(0.0, -HIT_EFFECT_RISE), HIT_EFFECT_DURATION)
            .then(move || flag.set(true));

        // Halfway through the 0.8 s rise the sprite sits 40 px higher.
        for _ in 0..24 {
            runner.tick(FIXED_DT);
        }
        let mid_y = sprite.borrow().pose.rect.center().y;
        assert!((mid_y - 260.0).abs() < 3.0, "mid-rise y was {mid_y}");
        assert!(!done.get());

        for _ in 0..36 {
            runner.tick(FIXED_DT);
        }
        assert!(done.get(), "continuation fires when the slide lands");
    }
}
