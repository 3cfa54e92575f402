//! Crouching and slides. Crouching from above walk speed on the ground
//! starts a slide: a captured direction, a boost spread over a short window
//! rather than one impulse, and steer input at reduced authority. Slides end
//! on the duration timer, on dropping below the stop speed, or on leaving
//! the ground, keeping a fraction of the exit speed.

use locomotion_core::config::CrouchConfig;
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent, Resolvers};
use locomotion_core::timers::TimerKey;
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::{planar, planar_speed};

const NEGLIGIBLE_SPEED: Real = 0.1;

pub struct CrouchSlide {
    cfg: CrouchConfig,
    walk_speed: Real,
    move_force: Real,
    slide_dir: Vector<Real>,
    boost_elapsed: Real,
}

impl CrouchSlide {
    pub fn new(cfg: CrouchConfig, walk_speed: Real, move_force: Real) -> Self {
        Self {
            cfg,
            walk_speed,
            move_force,
            slide_dir: Vector::zeros(),
            boost_elapsed: 0.0,
        }
    }

    /// Enters crouch, starting a slide when fast enough, grounded, and the
    /// `allow_slide` resolver agrees.
    pub fn enter_crouch(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        resolvers: &Resolvers,
    ) {
        if ctx.crouching {
            return;
        }
        ctx.crouching = true;
        ctx.current_speed = self.cfg.crouch_speed;
        bus.emit(LocomotionEvent::CrouchStart);

        let velocity = body.velocity(world);
        let speed = planar_speed(velocity);
        if ctx.grounded && speed > self.walk_speed && resolvers.allow_slide.resolve(ctx) {
            self.slide_dir = if speed > NEGLIGIBLE_SPEED {
                planar(velocity) / speed
            } else {
                ctx.orientation.forward
            };
            self.boost_elapsed = 0.0;
            ctx.sliding = true;
            ctx.timers.start(TimerKey::SlideDuration, self.cfg.slide_duration);
            bus.emit(LocomotionEvent::SlideStart);
        }
    }

    fn end_slide(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
    ) {
        if !ctx.sliding {
            return;
        }
        ctx.sliding = false;
        ctx.timers.cancel(TimerKey::SlideDuration);
        let v = body.velocity(world);
        let kept = planar(v) * self.cfg.slide_exit_retain;
        body.set_velocity(world, Vector::new(kept.x, v.y, kept.z));
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        axis: [Real; 2],
        fired: &[TimerKey],
        dt: Real,
    ) {
        if !ctx.sliding {
            return;
        }
        let speed = planar_speed(body.velocity(world));
        if fired.contains(&TimerKey::SlideDuration)
            || speed < self.cfg.slide_stop_speed
            || !ctx.grounded
        {
            self.end_slide(world, body, ctx);
            return;
        }

        let m = body.mass(world);
        if self.boost_elapsed < self.cfg.slide_boost_window {
            // The whole boost delivered as acceleration across the window.
            let accel = self.cfg.slide_boost_force / self.cfg.slide_boost_window;
            body.add_force(world, self.slide_dir * accel * m);
            self.boost_elapsed += dt;
        }
        let wish = ctx.orientation.wish_dir(axis);
        body.add_force(world, wish * self.move_force * self.cfg.slide_steer_multiplier);
    }

    /// Stands without the ceiling check. For forced exits (death, respawn)
    /// where clipping is acceptable.
    pub fn force_stand(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) {
        if !ctx.crouching {
            return;
        }
        self.end_slide(world, body, ctx);
        ctx.crouching = false;
        ctx.current_speed = self.walk_speed;
        bus.emit(LocomotionEvent::CrouchStop);
    }

    /// Attempts to stand. Refused under a low ceiling.
    pub fn try_exit_crouch(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) -> bool {
        if !ctx.crouching {
            return true;
        }
        let head = body.position(world) + Vector::y() * body.foot_offset();
        if world
            .raycast(head, Vector::y(), self.cfg.stand_clearance, body.handle())
            .is_some()
        {
            return false;
        }
        self.end_slide(world, body, ctx);
        ctx.crouching = false;
        ctx.current_speed = self.walk_speed;
        bus.emit(LocomotionEvent::CrouchStop);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion_core::config::LocomotionConfig;
    use locomotion_core::orientation::Orientation;
    use rapier3d::prelude::*;

    fn slide_setup() -> (
        PhysicsWorld,
        PlayerBody,
        LocomotionContext,
        EventBus,
        Resolvers,
        CrouchSlide,
    ) {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let floor = ColliderBuilder::cuboid(50.0, 0.1, 50.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_static_collider(floor);
        let body = PlayerBody::spawn(&mut world, vector![0.0, 1.31, 0.0], 1.8, 0.4, 80.0);
        world.step(1.0 / 60.0);

        let mut ctx = LocomotionContext::new(LocomotionConfig::default());
        ctx.orientation = Orientation::from_look(0.0, 0.0);
        ctx.grounded = true;

        let mut resolvers = Resolvers::new();
        resolvers.allow_slide.register(|_| true).unwrap();
        let cfg = ctx.config;
        let crouch = CrouchSlide::new(
            cfg.crouch,
            cfg.movement.walk_speed,
            cfg.movement.move_force,
        );
        (world, body, ctx, EventBus::new(), resolvers, crouch)
    }

    #[test]
    fn fast_crouch_starts_a_slide() {
        let (mut world, body, mut ctx, mut bus, resolvers, mut crouch) = slide_setup();
        body.set_velocity(&mut world, vector![0.0, 0.0, -8.0]);
        crouch.enter_crouch(&mut world, &body, &mut ctx, &mut bus, &resolvers);
        assert!(ctx.crouching && ctx.sliding);
        assert!(ctx.timers.is_running(TimerKey::SlideDuration));
        let events = bus.drain();
        assert!(events.contains(&LocomotionEvent::CrouchStart));
        assert!(events.contains(&LocomotionEvent::SlideStart));
        assert_eq!(ctx.current_speed, ctx.config.crouch.crouch_speed);
    }

    #[test]
    fn slow_crouch_does_not_slide() {
        let (mut world, body, mut ctx, mut bus, resolvers, mut crouch) = slide_setup();
        body.set_velocity(&mut world, vector![0.0, 0.0, -2.0]);
        crouch.enter_crouch(&mut world, &body, &mut ctx, &mut bus, &resolvers);
        assert!(ctx.crouching && !ctx.sliding);
        assert!(!bus.drain().contains(&LocomotionEvent::SlideStart));
    }

    #[test]
    fn slide_ends_on_timer_with_speed_haircut() {
        let (mut world, body, mut ctx, mut bus, resolvers, mut crouch) = slide_setup();
        body.set_velocity(&mut world, vector![0.0, 0.0, -8.0]);
        crouch.enter_crouch(&mut world, &body, &mut ctx, &mut bus, &resolvers);
        assert!(ctx.sliding);

        crouch.fixed_update(
            &mut world,
            &body,
            &mut ctx,
            [0.0, 0.0],
            &[TimerKey::SlideDuration],
            1.0 / 50.0,
        );
        assert!(!ctx.sliding);
        let retained = planar_speed(body.velocity(&world));
        assert!((retained - 8.0 * ctx.config.crouch.slide_exit_retain).abs() < 0.05);
        // Still crouched after the slide.
        assert!(ctx.crouching);
    }

    #[test]
    fn slide_ends_when_slow_or_airborne() {
        let (mut world, body, mut ctx, mut bus, resolvers, mut crouch) = slide_setup();
        body.set_velocity(&mut world, vector![0.0, 0.0, -8.0]);
        crouch.enter_crouch(&mut world, &body, &mut ctx, &mut bus, &resolvers);

        ctx.grounded = false;
        crouch.fixed_update(&mut world, &body, &mut ctx, [0.0, 0.0], &[], 1.0 / 50.0);
        assert!(!ctx.sliding);
        assert!(!ctx.timers.is_running(TimerKey::SlideDuration));
    }

    #[test]
    fn standing_blocked_under_ceiling() {
        let (mut world, body, mut ctx, mut bus, resolvers, mut crouch) = slide_setup();
        crouch.enter_crouch(&mut world, &body, &mut ctx, &mut bus, &resolvers);

        let ceiling = ColliderBuilder::cuboid(2.0, 0.1, 2.0)
            .translation(vector![0.0, 3.0, 0.0])
            .build();
        world.insert_static_collider(ceiling);
        world.step(1.0 / 60.0);

        assert!(!crouch.try_exit_crouch(&mut world, &body, &mut ctx, &mut bus));
        assert!(ctx.crouching);

        // Move clear of the ceiling and stand.
        body.set_position(&mut world, vector![10.0, 1.31, 0.0]);
        world.step(1.0 / 60.0);
        assert!(crouch.try_exit_crouch(&mut world, &body, &mut ctx, &mut bus));
        assert!(!ctx.crouching);
        assert!(bus.drain().contains(&LocomotionEvent::CrouchStop));
        assert_eq!(ctx.current_speed, ctx.config.movement.walk_speed);
    }
}
