//! Footstep cadence. Distance-based: a step fires every stride length of
//! ground travel, with the stride stretched while sprinting and shortened
//! while crouched.

use locomotion_core::config::FootstepConfig;
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use rapier3d::prelude::Real;

const MIN_STEP_SPEED: Real = 0.5;

pub struct Footsteps {
    cfg: FootstepConfig,
    travelled: Real,
}

impl Footsteps {
    pub fn new(cfg: FootstepConfig) -> Self {
        Self { cfg, travelled: 0.0 }
    }

    fn stride(&self, ctx: &LocomotionContext, sprinting: bool) -> Real {
        if ctx.crouching {
            self.cfg.stride * self.cfg.crouch_stride_scale
        } else if sprinting {
            self.cfg.stride * self.cfg.sprint_stride_scale
        } else {
            self.cfg.stride
        }
    }

    pub fn update(
        &mut self,
        ctx: &LocomotionContext,
        bus: &mut EventBus,
        speed: Real,
        sprinting: bool,
        dt: Real,
    ) {
        if !ctx.grounded || ctx.sliding || ctx.climbing || speed < MIN_STEP_SPEED {
            self.travelled = 0.0;
            return;
        }
        self.travelled += speed * dt;
        let stride = self.stride(ctx, sprinting);
        while self.travelled >= stride {
            self.travelled -= stride;
            bus.emit(LocomotionEvent::Footstep);
        }
    }
}
