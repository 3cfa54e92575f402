//! Wall bounce: reflect the camera forward across a wall ahead and launch
//! along the reflection. Whether a bounce is allowed at the current height
//! is answered through the `can_wall_bounce` resolver, owned by whichever
//! behaviour currently tracks height validity.

use locomotion_core::config::WallBounceConfig;
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent, Resolvers};
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

pub struct WallBounce {
    cfg: WallBounceConfig,
}

impl WallBounce {
    pub fn new(cfg: WallBounceConfig) -> Self {
        Self { cfg }
    }

    /// Fresh forward probe for a bounceable wall. Run every tick the jump
    /// input is pressed, independent of the wall-run side probes.
    fn wall_ahead(
        &self,
        world: &PhysicsWorld,
        body: &PlayerBody,
        ctx: &LocomotionContext,
    ) -> Option<Vector<Real>> {
        let forward = ctx.orientation.forward;
        let hit = world.raycast(
            body.position(world),
            forward,
            self.cfg.detect_range,
            body.handle(),
        )?;
        // Only walls facing the player count.
        if hit.normal.dot(&forward) < 0.0 {
            Some(hit.normal)
        } else {
            None
        }
    }

    /// Attempts a bounce off a wall ahead. Returns whether it fired.
    pub fn try_execute(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        resolvers: &Resolvers,
    ) -> bool {
        if !self.cfg.enabled || !ctx.controllable {
            return false;
        }
        if !resolvers.can_wall_bounce.resolve(ctx) {
            return false;
        }
        let normal = match self.wall_ahead(world, body, ctx) {
            Some(normal) => normal,
            None => return false,
        };

        let forward = ctx.orientation.forward;
        let reflected = forward - normal * (2.0 * forward.dot(&normal));
        let m = body.mass(world);
        body.set_velocity(world, Vector::zeros());
        body.apply_impulse(
            world,
            (reflected * self.cfg.force + Vector::y() * self.cfg.up_force) * m,
        );
        bus.emit(LocomotionEvent::WallBounceStart);
        true
    }
}
