// anim/scheduler.rs
//
// The once-per-frame animation pump: a deadline-ordered queue of one-shot
// callbacks plus a weakly-held registry of live AnimSprites.
//
// The scheduler is owned by the host (it lives in EngineContext); nothing
// here is a process-wide global, so two game sessions never share state.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::anim::chain::AnimSprite;
use crate::core::rect::Rect;

/// A scheduled one-shot. Callbacks get the scheduler back so they can
/// queue follow-up work; panics inside a callback propagate to the host.
type Callback = Box<dyn FnOnce(&mut AnimScheduler)>;

struct DelayedCall {
    deadline_ms: u64,
    callback: Callback,
}

/// Shared handle to an animated sprite. The holder owns the sprite; the
/// scheduler only keeps a weak observer.
pub type SpriteHandle = Rc<RefCell<AnimSprite>>;

#[derive(Default)]
pub struct AnimScheduler {
    /// Kept sorted by deadline after every insert; the sort is stable, so
    /// calls sharing a deadline fire in insertion order.
    actions: Vec<DelayedCall>,
    sprites: Vec<Weak<RefCell<AnimSprite>>>,
}

impl AnimScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `f` to run once `delay` seconds after `now_ms`.
    pub fn call_after(
        &mut self,
        now_ms: u64,
        delay: f32,
        f: impl FnOnce(&mut AnimScheduler) + 'static,
    ) {
        let deadline_ms = now_ms + (delay.max(0.0) * 1000.0) as u64;
        self.actions.push(DelayedCall {
            deadline_ms,
            callback: Box::new(f),
        });
        self.actions.sort_by_key(|a| a.deadline_ms);
    }

    /// Construct a sprite, register it, and hand ownership to the caller.
    /// The sprite stays animated exactly as long as the caller keeps the
    /// handle; no unregister call exists or is needed.
    pub fn spawn_sprite(&mut self, base_rect: Rect) -> SpriteHandle {
        let sprite = Rc::new(RefCell::new(AnimSprite::new(base_rect)));
        self.register(&sprite);
        sprite
    }

    /// Register an externally created sprite with the per-frame pump.
    pub fn register(&mut self, sprite: &SpriteHandle) {
        self.sprites.push(Rc::downgrade(sprite));
    }

    /// The frame pump. Call exactly once per rendered frame.
    ///
    /// 1) Pop and invoke every delayed call whose deadline has passed, in
    ///    ascending deadline order, re-checking the head after each call so
    ///    a callback that schedules another due-now callback also runs this
    ///    frame.
    /// 2) Advance every live sprite to `now_ms`, dropping registry entries
    ///    whose owners are gone.
    pub fn tick(&mut self, now_ms: u64) {
        while !self.actions.is_empty() && self.actions[0].deadline_ms <= now_ms {
            let call = self.actions.remove(0);
            (call.callback)(self);
        }

        self.sprites.retain(|weak| weak.strong_count() > 0);
        for weak in &self.sprites {
            if let Some(sprite) = weak.upgrade() {
                sprite.borrow_mut().update(now_ms);
            }
        }
    }

    /// Number of delayed calls still waiting.
    pub fn pending_calls(&self) -> usize {
        self.actions.len()
    }

    /// Number of registered sprites still alive.
    pub fn live_sprites(&self) -> usize {
        self.sprites
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::cell::Cell;

    fn unit_rect() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(4.0, 4.0))
    }

    #[test]
    fn delayed_call_fires_at_deadline_not_before() {
        let mut sched = AnimScheduler::new();
        let fired = Rc::new(Cell::new(0u32));
        let flag = Rc::clone(&fired);
        sched.call_after(0, 2.0, move |_| flag.set(flag.get() + 1));

        sched.tick(1999);
        assert_eq!(fired.get(), 0);

        sched.tick(2000);
        assert_eq!(fired.get(), 1);
        assert_eq!(sched.pending_calls(), 0);

        sched.tick(5000);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn same_deadline_fires_in_insertion_order() {
        let mut sched = AnimScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            sched.call_after(0, 1.0, move |_| order.borrow_mut().push(tag));
        }
        sched.tick(1000);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callbacks_drain_in_deadline_order() {
        let mut sched = AnimScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        sched.call_after(0, 1.5, move |_| o1.borrow_mut().push("late"));
        sched.call_after(0, 0.5, move |_| o2.borrow_mut().push("early"));
        sched.tick(2000);
        assert_eq!(*order.borrow(), vec!["early", "late"]);
    }

    #[test]
    fn due_now_reschedule_runs_same_frame() {
        let mut sched = AnimScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        sched.call_after(0, 0.5, move |s| {
            // Already due when it fires at 1000ms; must settle this frame.
            s.call_after(1000, 0.0, move |_| flag.set(true));
        });
        sched.tick(1000);
        assert!(fired.get());
        assert_eq!(sched.pending_calls(), 0);
    }

    #[test]
    fn not_yet_due_reschedule_waits() {
        let mut sched = AnimScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        sched.call_after(0, 0.5, move |s| {
            s.call_after(1000, 1.0, move |_| flag.set(true));
        });
        sched.tick(1000);
        assert!(!fired.get());
        assert_eq!(sched.pending_calls(), 1);
        sched.tick(2000);
        assert!(fired.get());
    }

    #[test]
    fn pump_advances_registered_sprites() {
        let mut sched = AnimScheduler::new();
        let sprite = sched.spawn_sprite(unit_rect());
        sprite.borrow_mut().fade_out(0, 1.0);

        sched.tick(500);
        assert!((sprite.borrow().pose.alpha - 0.5).abs() < 1e-3);
    }

    #[test]
    fn dropped_sprites_leave_the_registry() {
        let mut sched = AnimScheduler::new();
        let sprite = sched.spawn_sprite(unit_rect());
        let _other = sched.spawn_sprite(unit_rect());
        assert_eq!(sched.live_sprites(), 2);

        drop(sprite);
        assert_eq!(sched.live_sprites(), 1);
        sched.tick(16);
        assert_eq!(sched.live_sprites(), 1);
    }
}
