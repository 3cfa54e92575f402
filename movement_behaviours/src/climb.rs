//! Ladder climbing. Attach rules are directional: a grounded player walks
//! onto a ladder, an airborne player grabs it backing in, or grabs it
//! forward/strafing only while looking down. While attached the body is
//! velocity-driven along the ladder with gravity disabled.

use locomotion_core::config::{ClimbConfig, ClimbMoveMode};
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Outcome of a climbing tick, for the host state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClimbTick {
    Attached,
    /// Topped out; the exit impulse has already been applied.
    ExitedTop,
    /// Left at the bottom or lost the ladder.
    ExitedBottom,
}

pub struct ClimbLadder {
    cfg: ClimbConfig,
}

impl ClimbLadder {
    pub fn new(cfg: ClimbConfig) -> Self {
        Self { cfg }
    }

    fn ladder_ahead(
        &self,
        world: &PhysicsWorld,
        body: &PlayerBody,
        ctx: &LocomotionContext,
    ) -> bool {
        world
            .raycast_ladder(
                body.position(world),
                ctx.orientation.forward,
                self.cfg.detect_range,
            )
            .is_some()
    }

    /// Whether the current input/look situation attaches to a ladder ahead.
    pub fn detect_attach(
        &self,
        world: &PhysicsWorld,
        body: &PlayerBody,
        ctx: &LocomotionContext,
        axis: [Real; 2],
    ) -> bool {
        if !self.cfg.enabled || !ctx.controllable || ctx.climbing {
            return false;
        }
        if !self.ladder_ahead(world, body, ctx) {
            return false;
        }
        let pitch = ctx.orientation.pitch;
        if ctx.grounded {
            if axis[1] <= 0.0 {
                return false;
            }
            // Walking forward into the ladder while staring at the floor in
            // a look-driven mode would immediately climb down; refuse.
            let look_driven = self.cfg.move_mode != ClimbMoveMode::Raw;
            return !(look_driven && pitch < self.cfg.steep_look_pitch);
        }
        if axis[1] < 0.0 {
            // Backing onto the ladder mid-air always grabs.
            return true;
        }
        if axis[1] > 0.0 || axis[0].abs() > 0.0 {
            return pitch < self.cfg.look_down_pitch;
        }
        false
    }

    pub fn attach(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) {
        ctx.climbing = true;
        body.set_gravity_scale(world, 0.0);
        body.set_velocity(world, Vector::zeros());
        bus.emit(LocomotionEvent::ClimbStart {
            hide_weapon: self.cfg.hide_weapon,
        });
    }

    /// Detach without any exit impulse (bottom exit, jump-off, loss of
    /// control).
    pub fn detach(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) {
        if !ctx.climbing {
            return;
        }
        ctx.climbing = false;
        body.set_gravity_scale(world, 1.0);
        bus.emit(LocomotionEvent::ClimbStop);
    }

    fn vertical_speed(&self, ctx: &LocomotionContext, axis: [Real; 2]) -> Real {
        let raw = axis[1] * self.cfg.climb_speed;
        let look = axis[1] * self.cfg.climb_speed * ctx.orientation.look_forward.y;
        match self.cfg.move_mode {
            ClimbMoveMode::Raw => raw,
            ClimbMoveMode::Look => look,
            ClimbMoveMode::Combined => (raw + look) * 0.5,
        }
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        axis: [Real; 2],
    ) -> ClimbTick {
        if !ctx.climbing {
            return ClimbTick::ExitedBottom;
        }

        let mut v_y = self.vertical_speed(ctx, axis);

        // A ceiling just above blocks upward input.
        if v_y > 0.0 {
            let head = body.position(world) + Vector::y() * body.foot_offset();
            if world
                .raycast(head, Vector::y(), self.cfg.ceiling_clearance, body.handle())
                .is_some()
            {
                v_y = 0.0;
            }
        }
        // Standing at the foot of the ladder blocks downward input.
        if v_y < 0.0 && ctx.grounded {
            v_y = 0.0;
        }

        if !self.ladder_ahead(world, body, ctx) {
            return if v_y > 0.0 {
                // Topped out: pop up and over the edge.
                self.detach(world, body, ctx, bus);
                let m = body.mass(world);
                body.apply_impulse(
                    world,
                    (Vector::y() * self.cfg.top_exit_up_impulse
                        + ctx.orientation.forward * self.cfg.top_exit_forward_impulse)
                        * m,
                );
                ClimbTick::ExitedTop
            } else {
                self.detach(world, body, ctx, bus);
                ClimbTick::ExitedBottom
            };
        }

        body.set_velocity(world, Vector::new(0.0, v_y, 0.0));
        ClimbTick::Attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion_core::config::LocomotionConfig;
    use locomotion_core::orientation::Orientation;
    use rapier3d::prelude::*;

    fn ladder_setup(ladder_top: Real) -> (PhysicsWorld, PlayerBody, LocomotionContext, EventBus) {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let floor = ColliderBuilder::cuboid(10.0, 0.1, 10.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_static_collider(floor);
        let half = ladder_top * 0.5;
        let ladder = ColliderBuilder::cuboid(0.5, half, 0.1)
            .translation(vector![0.0, half, -0.8])
            .build();
        world.insert_ladder_collider(ladder);
        let body = PlayerBody::spawn(&mut world, vector![0.0, 1.0, 0.0], 1.8, 0.4, 80.0);
        world.step(1.0 / 60.0);

        let mut ctx = LocomotionContext::new(LocomotionConfig::default());
        // Face the ladder (-Z).
        ctx.orientation = Orientation::from_look(0.0, 0.0);
        (world, body, ctx, EventBus::new())
    }

    #[test]
    fn grounded_forward_input_attaches() {
        let (world, body, mut ctx, _) = ladder_setup(6.0);
        ctx.grounded = true;
        let climb = ClimbLadder::new(ClimbConfig::default());
        assert!(climb.detect_attach(&world, &body, &ctx, [0.0, 1.0]));
        assert!(!climb.detect_attach(&world, &body, &ctx, [0.0, 0.0]));
    }

    #[test]
    fn steep_downward_look_blocks_grounded_attach_in_look_mode() {
        let (world, body, mut ctx, _) = ladder_setup(6.0);
        ctx.grounded = true;
        ctx.orientation = Orientation::from_look(0.0, -1.2);
        let cfg = ClimbConfig {
            move_mode: ClimbMoveMode::Look,
            ..ClimbConfig::default()
        };
        let climb = ClimbLadder::new(cfg);
        assert!(!climb.detect_attach(&world, &body, &ctx, [0.0, 1.0]));

        // Raw mode does not care where the camera points.
        let raw = ClimbLadder::new(ClimbConfig::default());
        assert!(raw.detect_attach(&world, &body, &ctx, [0.0, 1.0]));
    }

    #[test]
    fn airborne_attach_rules() {
        let (world, body, mut ctx, _) = ladder_setup(6.0);
        ctx.grounded = false;
        let climb = ClimbLadder::new(ClimbConfig::default());
        // Backing in always grabs.
        assert!(climb.detect_attach(&world, &body, &ctx, [0.0, -1.0]));
        // Forward or strafe needs a downward look.
        assert!(!climb.detect_attach(&world, &body, &ctx, [0.0, 1.0]));
        ctx.orientation = Orientation::from_look(0.0, -0.6);
        assert!(climb.detect_attach(&world, &body, &ctx, [0.0, 1.0]));
        assert!(climb.detect_attach(&world, &body, &ctx, [1.0, 0.0]));
    }

    #[test]
    fn climbing_moves_vertically_and_blocks_down_at_ground() {
        let (mut world, body, mut ctx, mut bus) = ladder_setup(6.0);
        let mut climb = ClimbLadder::new(ClimbConfig::default());
        climb.attach(&mut world, &body, &mut ctx, &mut bus);
        assert!(ctx.climbing);
        match bus.drain()[0] {
            LocomotionEvent::ClimbStart { hide_weapon } => assert!(hide_weapon),
            other => panic!("unexpected event {:?}", other),
        }

        let tick = climb.fixed_update(&mut world, &body, &mut ctx, &mut bus, [0.0, 1.0]);
        assert_eq!(tick, ClimbTick::Attached);
        let cfg = ClimbConfig::default();
        assert!((body.velocity(&world).y - cfg.climb_speed).abs() < 1.0e-4);

        ctx.grounded = true;
        climb.fixed_update(&mut world, &body, &mut ctx, &mut bus, [0.0, -1.0]);
        assert_eq!(body.velocity(&world).y, 0.0);
    }

    #[test]
    fn topping_out_applies_exit_impulse() {
        // Short ladder so the ray in front of the body misses once raised.
        let (mut world, body, mut ctx, mut bus) = ladder_setup(2.0);
        let mut climb = ClimbLadder::new(ClimbConfig::default());
        climb.attach(&mut world, &body, &mut ctx, &mut bus);
        body.set_position(&mut world, vector![0.0, 3.0, 0.0]);
        world.step(1.0 / 60.0);
        bus.drain();

        let tick = climb.fixed_update(&mut world, &body, &mut ctx, &mut bus, [0.0, 1.0]);
        assert_eq!(tick, ClimbTick::ExitedTop);
        assert!(!ctx.climbing);
        let cfg = ClimbConfig::default();
        let v = body.velocity(&world);
        assert!((v.y - cfg.top_exit_up_impulse).abs() < 0.1);
        assert!(v.z < -1.0);
        assert!(bus.drain().contains(&LocomotionEvent::ClimbStop));
        assert_eq!(body.gravity_scale(&world), 1.0);
    }
}
