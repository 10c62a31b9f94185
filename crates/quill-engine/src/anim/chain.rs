// anim/chain.rs
//
// Chained sprite animation — each sprite owns any number of independent
// chains; a chain is a queue of steps advanced once per frame.
//
// Usage:
//   let mut fx = AnimSprite::new(rect);
//   fx.fade_out(now, 0.8);
//   fx.slide(now, Vec2::new(0.0, -80.0), 0.8).then(|| { /* cleanup */ });
//   fx.update(now);  // normally driven by the AnimScheduler pump

use std::collections::VecDeque;

use glam::Vec2;

use crate::anim::easing::Easing;
use crate::core::rect::Rect;

/// Handle to one animation chain on one sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(u32);

/// Whether a step wants to keep running next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Done,
}

/// The derived visual state of a sprite, rebuilt from its base every frame
/// before the chains run. A host renderer reads this after the pump.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    /// Screen rect (top-left + size). Rotation swells it to the rotated
    /// bounding box.
    pub rect: Rect,
    /// Opacity in [0, 1].
    pub alpha: f32,
    /// Rotation in degrees.
    pub angle: f32,
    /// White-overlay intensity in [0, 1], composited against the sprite's
    /// own per-pixel transparency.
    pub flash: f32,
}

impl Pose {
    fn from_base(base: Rect) -> Self {
        Self {
            rect: base,
            alpha: 1.0,
            angle: 0.0,
            flash: 0.0,
        }
    }
}

/// One animation step in a chain. Every variant goes through the same
/// `advance` dispatch.
enum Step {
    Slide {
        start: Vec2,
        delta: Vec2,
        start_ms: u64,
        end_ms: u64,
        easing: Easing,
    },
    Fade {
        start_ms: u64,
        end_ms: u64,
        easing: Easing,
    },
    Rotate {
        start_ms: u64,
        end_ms: u64,
        cycle_ms: f32,
        center: Option<Vec2>,
    },
    Flash {
        start_ms: u64,
    },
    Then {
        callback: Option<Box<dyn FnOnce()>>,
    },
}

/// Normalized progress through a [start, end] window at `now`, plus whether
/// the window is still open. Zero-length windows resolve immediately.
fn window_frac(now: u64, start_ms: u64, end_ms: u64) -> (f32, bool) {
    let now = now.min(end_ms);
    let ongoing = now < end_ms;
    let frac = if end_ms > start_ms {
        now.saturating_sub(start_ms) as f32 / (end_ms - start_ms) as f32
    } else {
        1.0
    };
    (frac, ongoing)
}

/// Bounding box of a `size` rect rotated by `angle` degrees.
fn rotated_bounds(size: Vec2, angle_deg: f32) -> Vec2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Vec2::new(
        (size.x * cos).abs() + (size.y * sin).abs(),
        (size.x * sin).abs() + (size.y * cos).abs(),
    )
}

impl Step {
    fn advance(&mut self, now: u64, pose: &mut Pose, base: &Rect) -> StepStatus {
        match self {
            Step::Slide {
                start,
                delta,
                start_ms,
                end_ms,
                easing,
            } => {
                let (frac, ongoing) = window_frac(now, *start_ms, *end_ms);
                pose.rect.min = *start + *delta * easing.apply(frac);
                if ongoing {
                    StepStatus::Running
                } else {
                    StepStatus::Done
                }
            }
            Step::Fade {
                start_ms,
                end_ms,
                easing,
            } => {
                let (frac, ongoing) = window_frac(now, *start_ms, *end_ms);
                pose.alpha = 1.0 - easing.apply(frac);
                if ongoing {
                    StepStatus::Running
                } else {
                    StepStatus::Done
                }
            }
            Step::Rotate {
                start_ms,
                end_ms,
                cycle_ms,
                center,
            } => {
                let clamped = now.min(*end_ms);
                let ongoing = clamped < *end_ms;
                let elapsed = clamped.saturating_sub(*start_ms) as f32;
                let turns = if *cycle_ms > 0.0 {
                    elapsed / *cycle_ms
                } else {
                    0.0
                };
                pose.angle = 360.0 * turns;
                let bounds = rotated_bounds(base.size, pose.angle);
                match center {
                    // Keep the world center the sprite currently has; the
                    // rect grows to the rotated bounding box around it.
                    None => {
                        let c = pose.rect.center();
                        pose.rect = Rect::centered(c, bounds);
                    }
                    Some(c) => pose.rect = Rect::centered(*c, bounds),
                }
                if ongoing {
                    StepStatus::Running
                } else {
                    StepStatus::Done
                }
            }
            Step::Flash { start_ms } => {
                const CYCLE_MS: u64 = 1000;
                const PEAK: f32 = 0.8;
                let elapsed = (now.saturating_sub(*start_ms) % CYCLE_MS) as f32;
                let half = CYCLE_MS as f32 / 2.0;
                pose.flash = if elapsed <= half {
                    PEAK * (elapsed / half)
                } else {
                    PEAK * (1.0 - (elapsed - half) / half)
                };
                // Never finishes on its own; stop_flashing removes it.
                StepStatus::Running
            }
            Step::Then { callback } => {
                if let Some(f) = callback.take() {
                    f();
                }
                StepStatus::Done
            }
        }
    }
}

struct Chain {
    id: ChainId,
    steps: VecDeque<Step>,
}

/// An animated sprite: a base rect plus any number of concurrently running
/// animation chains that rebuild its `pose` every frame.
pub struct AnimSprite {
    base_rect: Rect,
    /// Derived visual state, valid after the most recent `update`.
    pub pose: Pose,
    chains: Vec<Chain>,
    next_chain_id: u32,
    flash_chain: Option<ChainId>,
}

/// Borrowed handle to the chain a behavior call just created (or extended).
/// Makes the target of `.then` explicit.
pub struct ChainRef<'a> {
    sprite: &'a mut AnimSprite,
    id: ChainId,
}

impl<'a> ChainRef<'a> {
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Append a one-shot continuation that fires exactly once when every
    /// earlier step in this chain has finished.
    ///
    /// The callback runs inside the sprite's `update`, so it must not
    /// re-borrow the sprite it rides on; capture a flag or channel instead.
    pub fn then(self, f: impl FnOnce() + 'static) -> ChainRef<'a> {
        self.sprite.push_step(
            self.id,
            Step::Then {
                callback: Some(Box::new(f)),
            },
        );
        self
    }

    /// Replace the easing of the step that created this handle.
    pub fn eased(self, easing: Easing) -> ChainRef<'a> {
        self.sprite.set_head_easing(self.id, easing);
        self
    }
}

impl AnimSprite {
    pub fn new(base_rect: Rect) -> Self {
        Self {
            base_rect,
            pose: Pose::from_base(base_rect),
            chains: Vec::new(),
            next_chain_id: 0,
            flash_chain: None,
        }
    }

    pub fn base_rect(&self) -> Rect {
        self.base_rect
    }

    /// Reposition the unanimated base rect (effects are usually placed by
    /// centering them on their trigger point before any chain starts).
    pub fn set_base_rect(&mut self, rect: Rect) {
        self.base_rect = rect;
        self.pose.rect = rect;
    }

    pub fn set_base_center(&mut self, center: Vec2) {
        self.base_rect.recenter(center);
        self.pose.rect = self.base_rect;
    }

    /// Number of live chains (the flash chain counts).
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn is_idle(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_chain.is_some()
    }

    // -- Behaviors. Each starts one new chain and hands back its handle. --

    /// Slide by `delta` from the current top-left over `duration` seconds,
    /// finalizing exactly at the target.
    pub fn slide(&mut self, now_ms: u64, delta: Vec2, duration: f32) -> ChainRef<'_> {
        let step = Step::Slide {
            start: self.pose.rect.min,
            delta,
            start_ms: now_ms,
            end_ms: end_of(now_ms, duration),
            easing: Easing::Linear,
        };
        self.start_chain(step)
    }

    /// Fade to transparent over `duration` seconds.
    pub fn fade_out(&mut self, now_ms: u64, duration: f32) -> ChainRef<'_> {
        let step = Step::Fade {
            start_ms: now_ms,
            end_ms: end_of(now_ms, duration),
            easing: Easing::Linear,
        };
        self.start_chain(step)
    }

    /// Rotate one full turn every `cycle` seconds, freezing at whatever
    /// angle has been reached once `stop_after` seconds elapse.
    pub fn rotate(&mut self, now_ms: u64, cycle: f32, stop_after: f32) -> ChainRef<'_> {
        self.rotate_step(now_ms, cycle, stop_after, None)
    }

    /// Like `rotate`, but the rotated bounding box stays centered on a
    /// fixed point instead of the sprite's own center.
    pub fn rotate_around(
        &mut self,
        now_ms: u64,
        cycle: f32,
        stop_after: f32,
        center: Vec2,
    ) -> ChainRef<'_> {
        self.rotate_step(now_ms, cycle, stop_after, Some(center))
    }

    fn rotate_step(
        &mut self,
        now_ms: u64,
        cycle: f32,
        stop_after: f32,
        center: Option<Vec2>,
    ) -> ChainRef<'_> {
        let step = Step::Rotate {
            start_ms: now_ms,
            end_ms: end_of(now_ms, stop_after),
            cycle_ms: cycle * 1000.0,
            center,
        };
        self.start_chain(step)
    }

    /// Begin indefinite flashing, if not already active. At most one flash
    /// chain exists per sprite; calling this again is a no-op.
    pub fn start_flashing(&mut self, now_ms: u64) {
        if self.flash_chain.is_some() {
            return;
        }
        let id = self.start_chain(Step::Flash { start_ms: now_ms }).id;
        self.flash_chain = Some(id);
    }

    /// Stop indefinite flashing, if active; otherwise a no-op.
    pub fn stop_flashing(&mut self) {
        if let Some(id) = self.flash_chain.take() {
            self.chains.retain(|c| c.id != id);
        }
    }

    fn start_chain(&mut self, step: Step) -> ChainRef<'_> {
        let id = ChainId(self.next_chain_id);
        self.next_chain_id += 1;
        let mut steps = VecDeque::with_capacity(2);
        steps.push_back(step);
        self.chains.push(Chain { id, steps });
        ChainRef { sprite: self, id }
    }

    fn push_step(&mut self, id: ChainId, step: Step) {
        if let Some(chain) = self.chains.iter_mut().find(|c| c.id == id) {
            chain.steps.push_back(step);
        }
    }

    fn set_head_easing(&mut self, id: ChainId, easing: Easing) {
        if let Some(chain) = self.chains.iter_mut().find(|c| c.id == id) {
            match chain.steps.front_mut() {
                Some(Step::Slide { easing: e, .. }) | Some(Step::Fade { easing: e, .. }) => {
                    *e = easing;
                }
                _ => {}
            }
        }
    }

    /// Advance all chains to `now_ms`.
    ///
    /// The pose is rebuilt from the base rect first, then chains apply
    /// their mutations in list order, so later chains see earlier chains'
    /// work. A finished head step is popped and the next step in the same
    /// chain runs in the same frame (its own clock started when it was
    /// queued); emptied chains are dropped in place.
    pub fn update(&mut self, now_ms: u64) {
        self.pose = Pose::from_base(self.base_rect);
        let base = self.base_rect;

        let mut i = 0;
        while i < self.chains.len() {
            while let Some(step) = self.chains[i].steps.front_mut() {
                match step.advance(now_ms, &mut self.pose, &base) {
                    StepStatus::Running => break,
                    StepStatus::Done => {
                        self.chains[i].steps.pop_front();
                    }
                }
            }
            if self.chains[i].steps.is_empty() {
                let removed = self.chains.remove(i);
                if self.flash_chain == Some(removed.id) {
                    self.flash_chain = None;
                }
            } else {
                i += 1;
            }
        }
    }
}

fn end_of(now_ms: u64, duration: f32) -> u64 {
    if duration <= 0.0 {
        now_ms
    } else {
        now_ms + (duration * 1000.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn sprite_at(x: f32, y: f32, w: f32, h: f32) -> AnimSprite {
        AnimSprite::new(Rect::new(Vec2::new(x, y), Vec2::new(w, h)))
    }

    #[test]
    fn slide_hits_midpoint_and_target() {
        let mut s = sprite_at(10.0, 100.0, 20.0, 10.0);
        s.slide(0, Vec2::new(0.0, -80.0), 0.8);

        s.update(0);
        assert_eq!(s.pose.rect.min, Vec2::new(10.0, 100.0));

        s.update(400);
        assert!((s.pose.rect.min.y - 60.0).abs() < 1e-3);

        s.update(800);
        assert_eq!(s.pose.rect.min, Vec2::new(10.0, 20.0));
        assert!(s.is_idle(), "finished slide chain should be dropped");
    }

    #[test]
    fn slide_holds_target_after_expiry() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        s.slide(0, Vec2::new(50.0, 0.0), 0.5);
        s.update(5000);
        assert_eq!(s.pose.rect.min, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn zero_duration_slide_resolves_first_update() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        s.slide(100, Vec2::new(30.0, 0.0), 0.0);
        s.update(100);
        assert_eq!(s.pose.rect.min, Vec2::new(30.0, 0.0));
        assert!(s.is_idle());
    }

    #[test]
    fn fade_out_is_linear_and_clamped() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        s.fade_out(0, 2.0);
        s.update(1000);
        assert!((s.pose.alpha - 0.5).abs() < 1e-3);
        s.update(2000);
        assert_eq!(s.pose.alpha, 0.0);
        s.update(9000);
        // Chain is gone; pose resets to base alpha.
        assert_eq!(s.pose.alpha, 1.0);
        assert!(s.is_idle());
    }

    #[test]
    fn then_fires_once_in_the_completing_update() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        let called = Rc::new(Cell::new(0u32));
        let flag = Rc::clone(&called);
        s.fade_out(0, 0.1).then(move || flag.set(flag.get() + 1));

        s.update(50);
        assert_eq!(called.get(), 0);

        s.update(120);
        assert_eq!(called.get(), 1);
        assert!(s.is_idle(), "chain should be empty after continuation");

        s.update(200);
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn then_binds_to_its_own_chain() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        // A long slide in front; the continuation rides the short fade.
        s.slide(0, Vec2::new(0.0, -10.0), 5.0);
        s.fade_out(0, 0.1).then(move || flag.set(true));

        s.update(200);
        assert!(fired.get(), "continuation fires when its chain ends");
        assert_eq!(s.chain_count(), 1, "slide chain still running");
    }

    #[test]
    fn rotate_spins_then_freezes() {
        let mut s = sprite_at(0.0, 0.0, 40.0, 20.0);
        s.rotate(0, 4.0, 0.8);

        s.update(1000);
        // Frozen at the 0.8s mark: 0.8/4.0 of a turn.
        assert!((s.pose.angle - 72.0).abs() < 1e-2);
        assert!(s.is_idle());
    }

    #[test]
    fn rotate_keeps_center_and_grows_bounds() {
        let mut s = sprite_at(0.0, 0.0, 40.0, 20.0);
        let center = s.pose.rect.center();
        s.rotate(0, 1.0, 0.5);
        s.update(250); // quarter turn: bounds swap to 20x40
        assert!((s.pose.rect.center() - center).length() < 1e-3);
        assert!((s.pose.rect.size.x - 20.0).abs() < 1e-3);
        assert!((s.pose.rect.size.y - 40.0).abs() < 1e-3);
    }

    #[test]
    fn rotate_around_anchors_on_fixed_point() {
        let mut s = sprite_at(0.0, 0.0, 10.0, 10.0);
        let anchor = Vec2::new(200.0, 300.0);
        s.rotate_around(0, 1.0, 0.5, anchor);
        s.update(100);
        assert!((s.pose.rect.center() - anchor).length() < 1e-3);
    }

    #[test]
    fn flashing_is_idempotent_and_stoppable() {
        let mut s = sprite_at(0.0, 0.0, 4.0, 4.0);
        s.stop_flashing(); // no-op before any start
        assert_eq!(s.chain_count(), 0);

        s.start_flashing(0);
        s.start_flashing(0);
        assert_eq!(s.chain_count(), 1);
        assert!(s.is_flashing());

        s.update(250);
        assert!((s.pose.flash - 0.4).abs() < 1e-3);
        s.update(500);
        assert!((s.pose.flash - 0.8).abs() < 1e-3);
        s.update(750);
        assert!((s.pose.flash - 0.4).abs() < 1e-3);

        s.stop_flashing();
        assert!(!s.is_flashing());
        s.update(1000);
        assert_eq!(s.pose.flash, 0.0);
        assert!(s.is_idle());
    }

    #[test]
    fn chains_compose_in_list_order() {
        let mut s = sprite_at(0.0, 100.0, 20.0, 10.0);
        s.fade_out(0, 0.8);
        s.rotate(0, 4.0, 0.8);
        s.slide(0, Vec2::new(0.0, -80.0), 0.8);

        s.update(400);
        assert!((s.pose.alpha - 0.5).abs() < 1e-3);
        assert!(s.pose.angle > 0.0);
        // The slide ran after the rotate and owns the final top-left.
        assert!((s.pose.rect.min.y - 60.0).abs() < 1e-3);
        assert_eq!(s.chain_count(), 3);

        s.update(800);
        assert!(s.is_idle());
    }
}
