//! Horizontal velocity clamp. Runs after the force-applying behaviours so
//! combined forces can never push the planar speed past the weighted limit.

use locomotion_core::context::LocomotionContext;
use physics_rapier::{PhysicsWorld, PlayerBody};

use crate::planar_speed;

#[derive(Default)]
pub struct VelocityHandler;

impl VelocityHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn fixed_update(
        &self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &LocomotionContext,
    ) {
        // Dash, wall-run, climb and slide manage their own speed envelopes.
        if ctx.dashing || ctx.wall_running || ctx.climbing || ctx.sliding {
            return;
        }
        let mut v = body.velocity(world);
        let speed = planar_speed(v);
        let max = ctx.weighted_speed();
        if speed > max && speed > 0.0 {
            let scale = max / speed;
            v.x *= scale;
            v.z *= scale;
            body.set_velocity(world, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion_core::config::LocomotionConfig;
    use rapier3d::prelude::*;

    #[test]
    fn clamps_planar_speed_to_weighted_limit() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let body = PlayerBody::spawn(&mut world, vector![0.0, 1.0, 0.0], 1.8, 0.4, 80.0);
        let mut ctx = LocomotionContext::new(LocomotionConfig::default());
        ctx.current_speed = 5.0;
        ctx.weight_multiplier = 1.0;
        body.set_velocity(&mut world, vector![30.0, -3.0, 0.0]);

        VelocityHandler::new().fixed_update(&mut world, &body, &ctx);
        let v = body.velocity(&world);
        assert!((planar_speed(v) - 5.0).abs() < 1.0e-3);
        // Vertical speed is untouched.
        assert!((v.y - -3.0).abs() < 1.0e-6);
    }

    #[test]
    fn skips_clamp_while_dashing() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let body = PlayerBody::spawn(&mut world, vector![0.0, 1.0, 0.0], 1.8, 0.4, 80.0);
        let mut ctx = LocomotionContext::new(LocomotionConfig::default());
        ctx.dashing = true;
        body.set_velocity(&mut world, vector![30.0, 0.0, 0.0]);

        VelocityHandler::new().fixed_update(&mut world, &body, &ctx);
        assert!((body.velocity(&world).x - 30.0).abs() < 1.0e-6);
    }
}
