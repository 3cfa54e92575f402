//! Dash: a resource-gated burst along a configured direction. Charges
//! regenerate through the shared timer pool; gravity is suspended for the
//! dash window so the burst stays level.

use locomotion_core::config::{DashConfig, DashDirectionMode};
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::timers::TimerKey;
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

pub struct DashBehaviour {
    cfg: DashConfig,
    charges: u32,
    dir: Vector<Real>,
    elapsed: Real,
}

impl DashBehaviour {
    pub fn new(cfg: DashConfig) -> Self {
        Self {
            cfg,
            charges: cfg.max_charges,
            dir: Vector::zeros(),
            elapsed: 0.0,
        }
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn can_execute(&self, ctx: &LocomotionContext) -> bool {
        self.cfg.enabled && ctx.controllable && (self.cfg.infinite || self.charges > 0)
    }

    pub fn enter(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        axis: [Real; 2],
    ) {
        if !self.cfg.infinite {
            self.charges = self.charges.saturating_sub(1);
            ctx.timers.start(TimerKey::DashRegen, self.cfg.regen_cooldown);
        }
        self.elapsed = 0.0;
        self.dir = match self.cfg.direction_mode {
            DashDirectionMode::Forward => ctx.orientation.forward,
            DashDirectionMode::Free => ctx.orientation.look_forward,
            DashDirectionMode::Input => {
                let wish = ctx.orientation.wish_dir(axis);
                if wish.norm_squared() > 1.0e-6 {
                    wish.normalize()
                } else {
                    ctx.orientation.forward
                }
            }
        };
        ctx.dashing = true;
        body.set_gravity_scale(world, 0.0);
        bus.emit(LocomotionEvent::DashStart);
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        _ctx: &LocomotionContext,
        dt: Real,
    ) {
        let m = body.mass(world);
        body.add_force(world, self.dir * self.cfg.force * m);
        body.zero_vertical_velocity(world);
        self.elapsed += dt;
    }

    pub fn done(&self) -> bool {
        self.elapsed >= self.cfg.duration
    }

    pub fn exit(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) {
        ctx.dashing = false;
        body.set_gravity_scale(world, 1.0);
        bus.emit(LocomotionEvent::DashStop);
    }

    /// Routes fired timers. The regen timer re-arms itself while the pool
    /// is still below the cap.
    pub fn handle_fired(&mut self, ctx: &mut LocomotionContext, fired: &[TimerKey]) {
        if self.cfg.infinite || !fired.contains(&TimerKey::DashRegen) {
            return;
        }
        if self.charges < self.cfg.max_charges {
            self.charges += 1;
        }
        if self.charges < self.cfg.max_charges {
            ctx.timers.start(TimerKey::DashRegen, self.cfg.regen_cooldown);
        }
    }

    /// External grant (pickups, scripts). May exceed the regen cap.
    pub fn grant_charge(&mut self) {
        self.charges += 1;
    }

    pub fn reset(&mut self) {
        self.charges = self.cfg.max_charges;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion_core::config::LocomotionConfig;
    use rapier3d::prelude::*;

    fn setup(cfg: DashConfig) -> (PhysicsWorld, PlayerBody, LocomotionContext, EventBus, DashBehaviour) {
        let world_gravity = vector![0.0, -9.81, 0.0];
        let mut world = PhysicsWorld::new(world_gravity);
        let body = PlayerBody::spawn(&mut world, vector![0.0, 1.0, 0.0], 1.8, 0.4, 80.0);
        let mut config = LocomotionConfig::default();
        config.dash = cfg;
        let ctx = LocomotionContext::new(config);
        (world, body, ctx, EventBus::new(), DashBehaviour::new(cfg))
    }

    #[test]
    fn charge_is_consumed_and_regenerates_after_cooldown() {
        let cfg = DashConfig {
            max_charges: 3,
            regen_cooldown: 2.0,
            ..DashConfig::default()
        };
        let (mut world, body, mut ctx, mut bus, mut dash) = setup(cfg);

        dash.enter(&mut world, &body, &mut ctx, &mut bus, [0.0, 0.0]);
        assert_eq!(dash.charges(), 2);

        let fired = ctx.timers.advance(2.05);
        dash.handle_fired(&mut ctx, &fired);
        assert_eq!(dash.charges(), 3);
        assert!(!ctx.timers.is_running(TimerKey::DashRegen));
    }

    #[test]
    fn regen_rearms_until_pool_is_full() {
        let cfg = DashConfig {
            max_charges: 3,
            regen_cooldown: 1.0,
            ..DashConfig::default()
        };
        let (mut world, body, mut ctx, mut bus, mut dash) = setup(cfg);

        dash.enter(&mut world, &body, &mut ctx, &mut bus, [0.0, 0.0]);
        dash.exit(&mut world, &body, &mut ctx, &mut bus);
        dash.enter(&mut world, &body, &mut ctx, &mut bus, [0.0, 0.0]);
        assert_eq!(dash.charges(), 1);

        let fired = ctx.timers.advance(1.05);
        dash.handle_fired(&mut ctx, &fired);
        assert_eq!(dash.charges(), 2);
        assert!(ctx.timers.is_running(TimerKey::DashRegen));

        let fired = ctx.timers.advance(1.05);
        dash.handle_fired(&mut ctx, &fired);
        assert_eq!(dash.charges(), 3);
        assert!(!ctx.timers.is_running(TimerKey::DashRegen));
    }

    #[test]
    fn zero_charges_blocks_the_dash_under_finite_mode() {
        let cfg = DashConfig {
            max_charges: 1,
            ..DashConfig::default()
        };
        let (mut world, body, mut ctx, mut bus, mut dash) = setup(cfg);
        dash.enter(&mut world, &body, &mut ctx, &mut bus, [0.0, 0.0]);
        assert_eq!(dash.charges(), 0);
        assert!(!dash.can_execute(&ctx));

        let infinite = DashConfig {
            infinite: true,
            ..cfg
        };
        let dash = DashBehaviour::new(infinite);
        assert!(dash.can_execute(&ctx));
    }

    #[test]
    fn dash_zeroes_vertical_velocity_and_suspends_gravity() {
        let (mut world, body, mut ctx, mut bus, mut dash) = setup(DashConfig::default());
        body.set_velocity(&mut world, vector![0.0, -5.0, 0.0]);
        dash.enter(&mut world, &body, &mut ctx, &mut bus, [0.0, 0.0]);
        assert_eq!(body.gravity_scale(&world), 0.0);

        dash.fixed_update(&mut world, &body, &ctx, 1.0 / 50.0);
        assert_eq!(body.velocity(&world).y, 0.0);

        dash.exit(&mut world, &body, &mut ctx, &mut bus);
        assert_eq!(body.gravity_scale(&world), 1.0);
        assert!(!ctx.dashing);
    }

    #[test]
    fn external_grant_may_exceed_the_cap() {
        let (_, _, _, _, mut dash) = setup(DashConfig {
            max_charges: 2,
            ..DashConfig::default()
        });
        dash.grant_charge();
        assert_eq!(dash.charges(), 3);
    }
}
