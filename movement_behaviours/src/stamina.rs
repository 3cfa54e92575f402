//! Stamina pool. Action costs and sprint drain pull from it, regeneration
//! refills it while moving slowly enough. Hitting zero flips both context
//! gates false in the same tick; they reopen together once the pool climbs
//! back past the minimum-to-run mark.

use locomotion_core::config::StaminaConfig;
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use rapier3d::prelude::Real;

pub struct Stamina {
    cfg: StaminaConfig,
    pool: Real,
    depleted: bool,
}

impl Stamina {
    pub fn new(cfg: StaminaConfig) -> Self {
        Self {
            cfg,
            pool: cfg.max,
            depleted: false,
        }
    }

    pub fn pool(&self) -> Real {
        self.pool
    }

    pub fn spend_jump(&mut self, ctx: &mut LocomotionContext, bus: &mut EventBus) {
        self.spend(self.cfg.jump_cost, ctx, bus);
    }

    pub fn spend_dash(&mut self, ctx: &mut LocomotionContext, bus: &mut EventBus) {
        self.spend(self.cfg.dash_cost, ctx, bus);
    }

    pub fn spend_slide(&mut self, ctx: &mut LocomotionContext, bus: &mut EventBus) {
        self.spend(self.cfg.slide_cost, ctx, bus);
    }

    fn spend(&mut self, cost: Real, ctx: &mut LocomotionContext, bus: &mut EventBus) {
        self.pool = (self.pool - cost).max(0.0);
        if self.pool <= 0.0 && !self.depleted {
            self.depleted = true;
            // Both gates close in the same tick as the depletion.
            ctx.enough_stamina_to_run = false;
            ctx.enough_stamina_to_jump = false;
            bus.emit(LocomotionEvent::StaminaDepleted);
        }
    }

    /// Continuous drain/regen. `speed` is the current planar speed; no
    /// regeneration while moving faster than the configured threshold.
    pub fn fixed_update(
        &mut self,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        sprinting: bool,
        speed: Real,
        dt: Real,
    ) {
        if sprinting && !self.depleted {
            self.spend(self.cfg.sprint_drain_per_sec * dt, ctx, bus);
        } else if self.pool < self.cfg.max && speed <= self.cfg.regen_speed_threshold {
            self.pool = (self.pool + self.cfg.regen_per_sec * dt).min(self.cfg.max);
            if self.depleted && self.pool >= self.cfg.min_to_run {
                self.depleted = false;
                ctx.enough_stamina_to_run = true;
                ctx.enough_stamina_to_jump = true;
            }
        }
    }

    pub fn reset(&mut self, ctx: &mut LocomotionContext) {
        self.pool = self.cfg.max;
        self.depleted = false;
        ctx.enough_stamina_to_run = true;
        ctx.enough_stamina_to_jump = true;
    }
}
