//! Jumping: count pool, cooldown gate, coyote acceptance, wall jumps, and
//! the optional jump buffer.

use locomotion_core::config::{JumpConfig, JumpDirectionMode};
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::timers::TimerKey;
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

pub struct JumpBehaviour {
    cfg: JumpConfig,
    jump_count: u32,
    buffer_time: Real,
}

impl JumpBehaviour {
    pub fn new(cfg: JumpConfig) -> Self {
        Self {
            cfg,
            jump_count: cfg.max_jumps,
            buffer_time: 0.0,
        }
    }

    pub fn jumps_remaining(&self) -> u32 {
        self.jump_count
    }

    pub fn can_execute(&self, ctx: &LocomotionContext) -> bool {
        if !self.cfg.enabled || !ctx.controllable || self.jump_count == 0 {
            return false;
        }
        if ctx.timers.is_running(TimerKey::JumpCooldown) {
            return false;
        }
        let coyote_valid = ctx.coyote_timer > 0.0 && !ctx.has_jumped;
        let air_jump = self.cfg.max_jumps > 1 && ctx.enough_stamina_to_jump;
        ctx.grounded || coyote_valid || ctx.wall_running || air_jump
    }

    /// Fires the jump. Callers check `can_execute` first; an ineligible call
    /// is a no-op.
    pub fn execute(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        axis: [Real; 2],
    ) {
        if !self.can_execute(ctx) {
            return;
        }
        body.zero_vertical_velocity(world);
        self.jump_count = self.jump_count.saturating_sub(1);
        self.buffer_time = 0.0;
        ctx.has_jumped = true;
        ctx.coyote_timer = 0.0;
        ctx.timers.start(TimerKey::JumpCooldown, self.cfg.jump_cooldown);

        let m = body.mass(world);
        let up = Vector::y();
        if ctx.wall_running {
            // Wall jump: up plus away from the wall.
            let lateral = ctx
                .wall_normal
                .map(|n| n * self.cfg.jump_force * self.cfg.wall_jump_lateral_scale)
                .unwrap_or_else(Vector::zeros);
            body.apply_impulse(world, (up * self.cfg.jump_force + lateral) * m);
        } else {
            body.apply_impulse(world, up * self.cfg.jump_force * m);
        }

        let directional = match self.cfg.direction_mode {
            JumpDirectionMode::None => Vector::zeros(),
            JumpDirectionMode::Input => ctx.orientation.wish_dir(axis),
            JumpDirectionMode::Forward => ctx.orientation.forward,
        };
        if directional.norm_squared() > 0.0 {
            body.apply_impulse(world, directional * self.cfg.direction_force * m);
        }

        bus.emit(LocomotionEvent::Jump);
    }

    /// Variable-rate bookkeeping: buffers a jump press that cannot fire yet.
    pub fn update(&mut self, ctx: &LocomotionContext, jump_pressed: bool, dt: Real) {
        if !self.cfg.buffer_enabled {
            return;
        }
        if jump_pressed && !self.can_execute(ctx) {
            self.buffer_time = self.cfg.buffer_window;
        } else if self.buffer_time > 0.0 {
            self.buffer_time = (self.buffer_time - dt).max(0.0);
        }
    }

    /// Consumes a buffered press, if any.
    pub fn take_buffered(&mut self) -> bool {
        if self.buffer_time > 0.0 {
            self.buffer_time = 0.0;
            true
        } else {
            false
        }
    }

    pub fn on_land(&mut self, ctx: &mut LocomotionContext) {
        self.jump_count = self.cfg.max_jumps;
        ctx.has_jumped = false;
    }

    pub fn on_wall_run_start(&mut self) {
        if self.cfg.reset_on_wall_run {
            self.jump_count = self.cfg.max_jumps;
        }
    }

    pub fn on_wall_bounce(&mut self) {
        if self.cfg.reset_on_wall_bounce {
            self.jump_count = self.cfg.max_jumps;
        }
    }

    pub fn on_grapple_start(&mut self) {
        if self.cfg.reset_on_grapple {
            self.jump_count = self.cfg.max_jumps;
        }
    }

    pub fn reset(&mut self) {
        self.jump_count = self.cfg.max_jumps;
        self.buffer_time = 0.0;
    }
}
