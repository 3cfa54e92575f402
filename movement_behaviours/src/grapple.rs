//! Grappling hook: a camera raycast attaches a spring to the hit point, an
//! active pull force reels the player in, and a cosmetic rope effect draws
//! itself out toward the anchor with a decaying wave.

use locomotion_core::config::{GrappleConfig, GrapplePullMode};
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::timers::TimerKey;
use physics_rapier::{PhysicsWorld, PlayerBody, SpringHandle};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Rope rendering state: a line that advances from the fire point to the
/// anchor over the draw duration, waving with an amplitude that decays over
/// the rope's lifetime. Pure data for the host renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct RopeFx {
    /// 0..1 fraction of the rope drawn so far.
    pub progress: Real,
    pub elapsed: Real,
    active: bool,
}

impl RopeFx {
    fn begin(&mut self) {
        self.progress = 0.0;
        self.elapsed = 0.0;
        self.active = true;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn active(&self) -> bool {
        self.active
    }

    fn advance(&mut self, dt: Real, draw_duration: Real) {
        if !self.active {
            return;
        }
        self.elapsed += dt;
        if draw_duration > 0.0 {
            self.progress = (self.progress + dt / draw_duration).min(1.0);
        } else {
            self.progress = 1.0;
        }
    }

    /// Current wave amplitude, decaying exponentially with rope age.
    pub fn amplitude(&self, cfg: &GrappleConfig) -> Real {
        if !self.active {
            return 0.0;
        }
        cfg.rope_wave_amplitude * (-cfg.rope_wave_decay * self.elapsed).exp()
    }

    /// Samples the rope polyline from `origin` toward `anchor`. The wave is
    /// applied along the world up axis and pinned at both ends.
    pub fn sample(
        &self,
        origin: Vector<Real>,
        anchor: Vector<Real>,
        cfg: &GrappleConfig,
        samples: usize,
    ) -> Vec<Vector<Real>> {
        if !self.active || samples < 2 {
            return Vec::new();
        }
        let amplitude = self.amplitude(cfg);
        let mut points = Vec::with_capacity(samples);
        for i in 0..samples {
            let t = (i as Real / (samples - 1) as Real) * self.progress;
            let along = origin + (anchor - origin) * t;
            let envelope = (t * std::f32::consts::PI).sin();
            let wave = (t * cfg.rope_wave_count * std::f32::consts::TAU).sin();
            points.push(along + Vector::y() * (wave * envelope * amplitude));
        }
        points
    }
}

struct Attachment {
    spring: SpringHandle,
    anchor: Vector<Real>,
    attach_distance: Real,
}

pub struct Grapple {
    cfg: GrappleConfig,
    attachment: Option<Attachment>,
    pub rope: RopeFx,
}

impl Grapple {
    pub fn new(cfg: GrappleConfig) -> Self {
        Self {
            cfg,
            attachment: None,
            rope: RopeFx::default(),
        }
    }

    pub fn attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn anchor(&self) -> Option<Vector<Real>> {
        self.attachment.as_ref().map(|a| a.anchor)
    }

    /// Fires along the camera look direction. Returns whether it attached.
    pub fn try_fire(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
    ) -> bool {
        if !self.cfg.enabled || !ctx.controllable || self.attached() {
            return false;
        }
        if ctx.timers.is_running(TimerKey::GrappleCooldown) {
            return false;
        }
        let origin = body.position(world);
        let hit = match world.raycast(origin, ctx.orientation.look_forward, self.cfg.range, body.handle())
        {
            Some(hit) => hit,
            None => return false,
        };
        let spring = world.attach_spring(
            body.handle(),
            hit.point,
            hit.distance * self.cfg.rest_length_factor,
            self.cfg.spring,
            self.cfg.damper,
        );
        self.attachment = Some(Attachment {
            spring,
            anchor: hit.point,
            attach_distance: hit.distance,
        });
        self.rope.begin();
        bus.emit(LocomotionEvent::GrappleStart);
        true
    }

    /// Variable-rate tick: advances the cosmetic rope only.
    pub fn update(&mut self, dt: Real) {
        self.rope.advance(dt, self.cfg.rope_draw_duration);
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
    ) {
        let (anchor, attach_distance) = match &self.attachment {
            Some(a) => (a.anchor, a.attach_distance),
            None => return,
        };
        let to_anchor = anchor - body.position(world);
        let distance = to_anchor.norm();
        if distance < self.cfg.break_distance {
            self.detach(world, ctx);
            return;
        }

        let dir = to_anchor / distance;
        let scale = (distance / attach_distance.max(1.0e-3)).min(1.0);
        let pull = match self.cfg.pull_mode {
            GrapplePullMode::Linear => dir * self.cfg.pull_force * scale,
            GrapplePullMode::Blended => {
                let blended = dir * (1.0 - self.cfg.forward_blend)
                    + ctx.orientation.look_forward * self.cfg.forward_blend;
                let norm = blended.norm();
                if norm < 1.0e-4 {
                    return;
                }
                (blended / norm) * self.cfg.pull_force * scale
            }
        };
        body.add_force(world, pull);
    }

    /// Releases the spring and starts the refire cooldown.
    pub fn detach(&mut self, world: &mut PhysicsWorld, ctx: &mut LocomotionContext) {
        if let Some(attachment) = self.attachment.take() {
            world.detach_spring(attachment.spring);
            ctx.timers.start(TimerKey::GrappleCooldown, self.cfg.cooldown);
            self.rope.reset();
        }
    }
}
