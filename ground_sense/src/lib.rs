//! Temporally-stable ground detection.
//!
//! A raw downward shape query flickers: a single noisy frame must not flip
//! the grounded flag. Becoming grounded requires two consecutive positive
//! detections; losing the ground is deferred behind a short re-check window
//! that a positive detection cancels. The probe itself is injected as a
//! closure so the caller decides how to query (and the hysteresis can be
//! exercised without a physics world).
#![forbid(unsafe_code)]

use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::timers::TimerKey;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Result of one downward probe.
#[derive(Clone, Copy, Debug)]
pub struct GroundHit {
    pub normal: Vector<Real>,
}

/// Detections needed to flip grounded from false to true.
const GROUND_DEBOUNCE: u32 = 2;

pub struct GroundSense {
    tick: u64,
    cache_valid: bool,
    last_hit: Option<GroundHit>,
    positive_streak: u32,
    pending_unground: bool,
}

impl Default for GroundSense {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundSense {
    pub fn new() -> Self {
        Self {
            tick: 0,
            cache_valid: false,
            last_hit: None,
            positive_streak: 0,
            pending_unground: false,
        }
    }

    /// Drops the cached query and the debounce streak. Called right after a
    /// jump so takeoff does not reuse a stale "still grounded" sample.
    pub fn invalidate_after_jump(&mut self, ctx: &mut LocomotionContext) {
        self.cache_valid = false;
        self.last_hit = None;
        self.positive_streak = 0;
        self.pending_unground = false;
        ctx.timers.cancel(TimerKey::GroundRecheck);
        ctx.grounded = false;
        ctx.is_on_slope = false;
        ctx.slope_normal = None;
    }

    /// One fixed tick. `probe` runs the actual shape query; it is invoked at
    /// most every other tick, with the cached result reused in between.
    pub fn fixed_update(
        &mut self,
        probe: impl FnOnce() -> Option<GroundHit>,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        fired: &[TimerKey],
    ) {
        if fired.contains(&TimerKey::GroundRecheck) && self.pending_unground {
            self.pending_unground = false;
            if self.last_hit.is_none() && ctx.grounded {
                ctx.grounded = false;
                ctx.coyote_timer = ctx.config.jump.coyote_time;
            }
        }

        let fresh = !self.cache_valid || self.tick % 2 == 0;
        self.tick = self.tick.wrapping_add(1);
        if fresh {
            self.last_hit = probe();
            self.cache_valid = true;
            match self.last_hit {
                Some(_) => self.on_positive_detection(ctx, bus),
                None => self.on_negative_detection(ctx),
            }
        }

        self.update_slope_flag(ctx);
    }

    fn on_positive_detection(&mut self, ctx: &mut LocomotionContext, bus: &mut EventBus) {
        self.positive_streak = self.positive_streak.saturating_add(1);
        if self.pending_unground {
            self.pending_unground = false;
            ctx.timers.cancel(TimerKey::GroundRecheck);
        }
        if !ctx.grounded && self.positive_streak >= GROUND_DEBOUNCE {
            ctx.grounded = true;
            if !ctx.timers.is_running(TimerKey::LandCooldown) {
                bus.emit(LocomotionEvent::Land);
                ctx.timers
                    .start(TimerKey::LandCooldown, ctx.config.ground.land_cooldown);
            }
        }
    }

    fn on_negative_detection(&mut self, ctx: &mut LocomotionContext) {
        self.positive_streak = 0;
        if ctx.grounded && !self.pending_unground {
            self.pending_unground = true;
            ctx.timers
                .start(TimerKey::GroundRecheck, ctx.config.ground.ungrounded_delay);
        }
    }

    fn update_slope_flag(&self, ctx: &mut LocomotionContext) {
        let slope = ctx.grounded.then_some(()).and(self.last_hit).and_then(|hit| {
            let up_dot = hit.normal.y.clamp(-1.0, 1.0);
            let angle = up_dot.acos();
            (angle > 1.0e-3 && angle < ctx.config.movement.max_slope_angle).then_some(hit.normal)
        });
        ctx.is_on_slope = slope.is_some();
        ctx.slope_normal = slope;
    }
}
