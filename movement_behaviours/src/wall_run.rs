//! Wall running: side-probe detection, tangent tracking, counter-gravity
//! and the wall-pin force. Also publishes the height-validity flag the
//! wall-bounce resolver reads.

use locomotion_core::config::{WallRunCancelMode, WallRunConfig};
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::timers::TimerKey;
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::planar_speed;

/// Travel opposing the camera beyond this dot product cancels the run.
const BACKWARD_DOT_LIMIT: Real = -0.5;
/// Lateral input beyond this counts as steering away from the wall.
const AWAY_INPUT: Real = 0.5;

pub struct WallRun {
    cfg: WallRunConfig,
    walk_speed: Real,
    running: bool,
    tangent: Vector<Real>,
}

impl WallRun {
    pub fn new(cfg: WallRunConfig, walk_speed: Real) -> Self {
        Self {
            cfg,
            walk_speed,
            running: false,
            tangent: Vector::zeros(),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Travel direction along the wall while running.
    pub fn tangent(&self) -> Vector<Real> {
        self.tangent
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        axis: [Real; 2],
        fired: &[TimerKey],
        _dt: Real,
    ) {
        if !self.cfg.enabled || !ctx.controllable {
            ctx.wall_bounce_height_ok = false;
            self.cancel(world, body, ctx, bus, true);
            return;
        }

        let pos = body.position(world);
        let right = ctx.orientation.right;
        // The detect range measures the gap from the capsule surface, so the
        // probes cast from the center carry the radius on top of it.
        let reach = self.cfg.detect_range + body.radius();
        let left_hit = world.raycast(pos, -right, reach, body.handle());
        let right_hit = world.raycast(pos, right, reach, body.handle());
        let (wall, wall_left) = match (left_hit, right_hit) {
            (Some(hit), _) => (Some(hit), true),
            (None, Some(hit)) => (Some(hit), false),
            (None, None) => (None, false),
        };
        ctx.wall_left = wall_left;
        if let Some(hit) = wall {
            ctx.wall_normal = Some(hit.normal);
        }

        // Height validity: no ground within the minimum height below the
        // feet. Owns the answer behind the wall-bounce resolver.
        let ground_below = world
            .raycast(
                pos,
                -Vector::y(),
                body.foot_offset() + self.cfg.min_height,
                body.handle(),
            )
            .is_some();
        ctx.wall_bounce_height_ok = !ground_below;

        // Eligibility reads the weight-scaled speed so a heavy loadout needs
        // proportionally more raw speed to hold the wall.
        let speed = planar_speed(body.velocity(world)) * ctx.weight_multiplier;
        let eligible = axis[1] > 0.0
            && wall.is_some()
            && !ground_below
            && speed > self.walk_speed
            && !ctx.grounded;
        if !eligible {
            self.cancel(world, body, ctx, bus, true);
            return;
        }
        let normal = match wall {
            Some(hit) => hit.normal,
            None => return,
        };

        let was_running = self.running;
        if !self.running {
            self.running = true;
            ctx.wall_running = true;
            if self.cfg.cancel_mode == WallRunCancelMode::Timer {
                ctx.timers
                    .start(TimerKey::WallRunCountdown, self.cfg.duration);
            }
            bus.emit(LocomotionEvent::WallRunStart);
        } else if self.cfg.cancel_mode == WallRunCancelMode::Timer
            && fired.contains(&TimerKey::WallRunCountdown)
        {
            self.cancel(world, body, ctx, bus, true);
            return;
        }

        let up = Vector::y();
        let mut tangent = up.cross(&normal);
        if tangent.norm_squared() < 1.0e-6 {
            self.cancel(world, body, ctx, bus, true);
            return;
        }
        tangent = tangent.normalize();
        let forward = ctx.orientation.forward;
        // Pick the direction matching the camera on entry; keep continuity
        // afterwards so turning the camera cancels instead of reversing travel.
        let reference = if was_running { self.tangent } else { forward };
        if tangent.dot(&reference) < (-tangent).dot(&reference) {
            tangent = -tangent;
        }
        self.tangent = tangent;
        if tangent.dot(&forward) < BACKWARD_DOT_LIMIT {
            self.cancel(world, body, ctx, bus, true);
            return;
        }

        let m = body.mass(world);
        // Counter a configured share of gravity.
        body.add_force(world, -world.gravity * m * self.cfg.gravity_counter);

        // Pin against the wall unless the stick steers away from it.
        let steering_away = if wall_left {
            axis[0] > AWAY_INPUT
        } else {
            axis[0] < -AWAY_INPUT
        };
        if !steering_away {
            body.add_force(world, -normal * self.cfg.push_force);
        }

        // Wall-run speed envelope.
        let mut v = body.velocity(world);
        let speed = planar_speed(v);
        if speed > self.cfg.max_speed {
            let scale = self.cfg.max_speed / speed;
            v.x *= scale;
            v.z *= scale;
            body.set_velocity(world, v);
        }
    }

    /// Stops the run. `outward_impulse` applies the configured push off the
    /// wall; a jump-driven cancel passes `false` because the wall jump
    /// already carries its own impulse.
    pub fn cancel(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        outward_impulse: bool,
    ) {
        if !self.running {
            return;
        }
        self.running = false;
        ctx.wall_running = false;
        ctx.timers.cancel(TimerKey::WallRunCountdown);
        if outward_impulse {
            if let Some(normal) = ctx.wall_normal {
                let m = body.mass(world);
                body.apply_impulse(world, normal * self.cfg.exit_impulse * m);
            }
        }
        bus.emit(LocomotionEvent::WallRunStop);
    }
}
