//! The per-player controller: owns the behaviour set, the shared context,
//! the event bus and the state machine, and drives them as one variable-rate
//! and one fixed-rate tick per frame. The fixed tick steps the physics world
//! and clears accumulated forces afterwards.

use ground_sense::{GroundHit, GroundSense};
use locomotion_core::config::LocomotionConfig;
use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent, Resolvers};
use locomotion_core::logging;
use locomotion_state::{LocomotionState, StateHooks, StateMachine};
use movement_behaviours::{
    BasicMovement, ClimbLadder, CrouchSlide, DashBehaviour, Footsteps, Grapple, JumpBehaviour,
    SpeedLines, Stamina, VelocityHandler, WallBounce, WallRun,
};
use movement_behaviours::climb::ClimbTick;
use physics_rapier::{PhysicsWorld, PlayerBody};
use player_camera::{CameraPose, PlayerCamera};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::input::{DirectInputAdapter, InputAdapter, InputIntent, RawInput};

fn planar_speed(v: Vector<Real>) -> Real {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Exit/enter work for every state transition. Exit cleanup is idempotent so
/// a forced transition (death) can run it on a state that already wound
/// itself down.
struct TransitionHooks<'a> {
    world: &'a mut PhysicsWorld,
    body: &'a PlayerBody,
    ctx: &'a mut LocomotionContext,
    bus: &'a mut EventBus,
    resolvers: &'a Resolvers,
    jump: &'a mut JumpBehaviour,
    dash: &'a mut DashBehaviour,
    crouch: &'a mut CrouchSlide,
    climb: &'a mut ClimbLadder,
    axis: [Real; 2],
    /// Whether entering `Jumping` should fire the jump itself (false for a
    /// wall bounce, which applied its own impulse already).
    fire_jump: bool,
}

impl StateHooks for TransitionHooks<'_> {
    fn on_exit(&mut self, state: &LocomotionState) {
        match state {
            LocomotionState::Dashing { .. } => {
                if self.ctx.dashing {
                    self.dash.exit(self.world, self.body, self.ctx, self.bus);
                }
            }
            LocomotionState::Crouching => {
                self.crouch
                    .force_stand(self.world, self.body, self.ctx, self.bus);
            }
            LocomotionState::Climbing => {
                self.climb.detach(self.world, self.body, self.ctx, self.bus);
            }
            _ => {}
        }
    }

    fn on_enter(&mut self, state: &LocomotionState) {
        match state {
            LocomotionState::Jumping => {
                if self.fire_jump {
                    self.jump
                        .execute(self.world, self.body, self.ctx, self.bus, self.axis);
                }
            }
            LocomotionState::Dashing { axis } => {
                self.dash
                    .enter(self.world, self.body, self.ctx, self.bus, *axis);
            }
            LocomotionState::Crouching => {
                self.crouch
                    .enter_crouch(self.world, self.body, self.ctx, self.bus, self.resolvers);
            }
            LocomotionState::Climbing => {
                self.climb.attach(self.world, self.body, self.ctx, self.bus);
            }
            LocomotionState::Dead => {
                self.ctx.controllable = false;
            }
            LocomotionState::Default => {}
        }
    }
}

macro_rules! transition_hooks {
    ($self:ident, $world:ident, $axis:expr, $fire_jump:expr) => {
        TransitionHooks {
            world: $world,
            body: &$self.body,
            ctx: &mut $self.ctx,
            bus: &mut $self.bus,
            resolvers: &$self.resolvers,
            jump: &mut $self.jump,
            dash: &mut $self.dash,
            crouch: &mut $self.crouch,
            climb: &mut $self.climb,
            axis: $axis,
            fire_jump: $fire_jump,
        }
    };
}

pub struct PlayerController {
    body: PlayerBody,
    spawn_position: Vector<Real>,
    ctx: LocomotionContext,
    bus: EventBus,
    resolvers: Resolvers,
    machine: StateMachine,
    camera: PlayerCamera,
    adapter: Box<dyn InputAdapter>,
    intent: InputIntent,
    buffered_jump: bool,
    sprinting: bool,

    ground: GroundSense,
    basic: BasicMovement,
    velocity: VelocityHandler,
    jump: JumpBehaviour,
    dash: DashBehaviour,
    wall_run: WallRun,
    wall_bounce: WallBounce,
    climb: ClimbLadder,
    crouch: CrouchSlide,
    grapple: Grapple,
    stamina: Stamina,
    footsteps: Footsteps,
    speed_lines: SpeedLines,
}

impl PlayerController {
    pub fn new(world: &mut PhysicsWorld, config: LocomotionConfig, spawn: Vector<Real>) -> Self {
        let body = PlayerBody::spawn(
            world,
            spawn,
            config.body.capsule_height,
            config.body.capsule_radius,
            config.body.mass,
        );

        let mut resolvers = Resolvers::new();
        if let Err(err) = resolvers
            .allow_slide
            .register(|ctx| ctx.enough_stamina_to_run)
        {
            logging::warn(format!("allow_slide registration: {}", err));
        }
        if let Err(err) = resolvers
            .can_wall_bounce
            .register(|ctx| ctx.wall_bounce_height_ok)
        {
            logging::warn(format!("can_wall_bounce registration: {}", err));
        }

        let walk_speed = config.movement.walk_speed;
        let move_force = config.movement.move_force;
        Self {
            body,
            spawn_position: spawn,
            ctx: LocomotionContext::new(config),
            bus: EventBus::new(),
            resolvers,
            machine: StateMachine::new(),
            camera: PlayerCamera::new(config.camera),
            adapter: Box::new(DirectInputAdapter::new()),
            intent: InputIntent::default(),
            buffered_jump: false,
            sprinting: false,
            ground: GroundSense::new(),
            basic: BasicMovement::new(),
            velocity: VelocityHandler::new(),
            jump: JumpBehaviour::new(config.jump),
            dash: DashBehaviour::new(config.dash),
            wall_run: WallRun::new(config.wall_run, walk_speed),
            wall_bounce: WallBounce::new(config.wall_bounce),
            climb: ClimbLadder::new(config.climb),
            crouch: CrouchSlide::new(config.crouch, walk_speed, move_force),
            grapple: Grapple::new(config.grapple),
            stamina: Stamina::new(config.stamina),
            footsteps: Footsteps::new(config.footsteps),
            speed_lines: SpeedLines::new(config.speed_lines),
        }
    }

    /// Swaps the input adapter (replays, bots, network).
    pub fn set_adapter(&mut self, adapter: impl InputAdapter + 'static) {
        self.adapter = Box::new(adapter);
    }

    pub fn state(&self) -> LocomotionState {
        self.machine.current()
    }

    pub fn context(&self) -> &LocomotionContext {
        &self.ctx
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn dash_charges(&self) -> u32 {
        self.dash.charges()
    }

    pub fn jumps_remaining(&self) -> u32 {
        self.jump.jumps_remaining()
    }

    pub fn stamina_pool(&self) -> Real {
        self.stamina.pool()
    }

    pub fn speed_lines_intensity(&self) -> Real {
        self.speed_lines.intensity()
    }

    pub fn grapple(&self) -> &Grapple {
        &self.grapple
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(LocomotionEvent) + 'static) {
        self.bus.subscribe(subscriber);
    }

    /// Variable-rate tick: input, camera, transition checks and cosmetics.
    pub fn update(&mut self, world: &mut PhysicsWorld, raw: RawInput, dt: Real) -> CameraPose {
        let intent = self.adapter.intent(raw);

        if self.ctx.controllable {
            self.camera.apply_look_delta(intent.look_delta);
        }
        self.ctx.orientation = self.camera.orientation();

        self.jump.update(&self.ctx, intent.jump_pressed, dt);

        // Sprint gating feeds both the speed clamp and the stamina drain.
        let speed = planar_speed(self.body.velocity(world));
        self.sprinting = intent.sprint_held
            && self.ctx.enough_stamina_to_run
            && self.ctx.grounded
            && !self.ctx.crouching
            && speed > 0.1;
        if !self.ctx.crouching {
            self.ctx.current_speed = if self.sprinting {
                self.ctx.config.movement.run_speed
            } else {
                self.ctx.config.movement.walk_speed
            };
        }

        if intent.interact_pressed && self.ctx.controllable {
            if self.grapple.attached() {
                self.grapple.detach(world, &mut self.ctx);
            } else {
                self.grapple.try_fire(world, &self.body, &mut self.ctx, &mut self.bus);
            }
        }

        self.machine.begin_tick();
        self.check_switch_state(world, &intent);

        self.footsteps
            .update(&self.ctx, &mut self.bus, speed, self.sprinting, dt);
        self.speed_lines.update(speed, dt);
        self.grapple.update(dt);

        self.route_events(world);
        self.intent = intent;
        self.camera.update_from_origin(self.body.position(world))
    }

    /// Fixed-rate tick: timers, ground sensing, force application, the
    /// physics step, and event routing.
    pub fn fixed_update(&mut self, world: &mut PhysicsWorld, dt: Real) {
        if self.machine.current().is_dead() {
            world.step(dt);
            self.body.clear_forces(world);
            return;
        }
        self.machine.begin_tick();

        let fired = self.ctx.timers.advance(dt);
        self.ctx.coyote_timer = (self.ctx.coyote_timer - dt).max(0.0);
        self.dash.handle_fired(&mut self.ctx, &fired);

        {
            let probe_world: &PhysicsWorld = world;
            let body = self.body;
            let detect = self.ctx.config.ground.detect_distance;
            let probe = || {
                probe_world
                    .cast_capsule_down(
                        body.position(probe_world),
                        &body.capsule(),
                        detect,
                        body.handle(),
                    )
                    .map(|hit| GroundHit { normal: hit.normal })
            };
            self.ground
                .fixed_update(probe, &mut self.ctx, &mut self.bus, &fired);
        }

        let axis = self.intent.move_axis;
        match self.machine.current() {
            LocomotionState::Default | LocomotionState::Jumping => {
                self.basic
                    .fixed_update(world, &self.body, &mut self.ctx, &mut self.bus, axis, dt);
                self.wall_run.fixed_update(
                    world,
                    &self.body,
                    &mut self.ctx,
                    &mut self.bus,
                    axis,
                    &fired,
                    dt,
                );
                self.velocity.fixed_update(world, &self.body, &self.ctx);
                self.grapple.fixed_update(world, &self.body, &mut self.ctx);
            }
            LocomotionState::Crouching => {
                self.basic
                    .fixed_update(world, &self.body, &mut self.ctx, &mut self.bus, axis, dt);
                self.velocity.fixed_update(world, &self.body, &self.ctx);
                self.crouch
                    .fixed_update(world, &self.body, &mut self.ctx, axis, &fired, dt);
                self.grapple.fixed_update(world, &self.body, &mut self.ctx);
            }
            LocomotionState::Dashing { axis: dash_axis } => {
                self.dash.fixed_update(world, &self.body, &self.ctx, dt);
                if self.dash.done() {
                    let mut hooks = transition_hooks!(self, world, dash_axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Default, &mut hooks);
                }
            }
            LocomotionState::Climbing => {
                let outcome =
                    self.climb
                        .fixed_update(world, &self.body, &mut self.ctx, &mut self.bus, axis);
                if outcome != ClimbTick::Attached {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Default, &mut hooks);
                }
            }
            LocomotionState::Dead => {}
        }

        let speed = planar_speed(self.body.velocity(world));
        self.stamina
            .fixed_update(&mut self.ctx, &mut self.bus, self.sprinting, speed, dt);

        world.step(dt);
        self.body.clear_forces(world);
        self.route_events(world);
    }

    /// Guard evaluation for the active state. Order is fixed and the first
    /// matching guard wins the (single) switch for this tick.
    fn check_switch_state(&mut self, world: &mut PhysicsWorld, intent: &InputIntent) {
        let axis = intent.move_axis;
        let jump_request = intent.jump_pressed || std::mem::take(&mut self.buffered_jump);
        match self.machine.current() {
            LocomotionState::Default => {
                if self.climb.detect_attach(world, &self.body, &self.ctx, axis) {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Climbing, &mut hooks);
                } else if intent.crouch_pressed && self.ctx.grounded {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self
                        .machine
                        .try_switch(LocomotionState::Crouching, &mut hooks);
                } else if intent.jump_pressed
                    && self.wall_bounce.try_execute(
                        world,
                        &self.body,
                        &mut self.ctx,
                        &mut self.bus,
                        &self.resolvers,
                    )
                {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Jumping, &mut hooks);
                } else if jump_request && self.jump.can_execute(&self.ctx) {
                    let mut hooks = transition_hooks!(self, world, axis, true);
                    let _ = self.machine.try_switch(LocomotionState::Jumping, &mut hooks);
                } else if intent.dash_pressed && self.dash.can_execute(&self.ctx) {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self
                        .machine
                        .try_switch(LocomotionState::Dashing { axis }, &mut hooks);
                }
            }
            LocomotionState::Jumping => {
                if self.ctx.grounded && !self.ctx.has_jumped {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Default, &mut hooks);
                } else if self.climb.detect_attach(world, &self.body, &self.ctx, axis) {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Climbing, &mut hooks);
                } else if intent.jump_pressed
                    && self.wall_bounce.try_execute(
                        world,
                        &self.body,
                        &mut self.ctx,
                        &mut self.bus,
                        &self.resolvers,
                    )
                {
                    // Bounced mid-air; stay in Jumping.
                } else if jump_request && self.jump.can_execute(&self.ctx) {
                    // Air jump or wall jump without a state change.
                    self.jump
                        .execute(world, &self.body, &mut self.ctx, &mut self.bus, axis);
                } else if intent.dash_pressed && self.dash.can_execute(&self.ctx) {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self
                        .machine
                        .try_switch(LocomotionState::Dashing { axis }, &mut hooks);
                }
            }
            LocomotionState::Crouching => {
                if jump_request
                    && self.jump.can_execute(&self.ctx)
                    && self
                        .crouch
                        .try_exit_crouch(world, &self.body, &mut self.ctx, &mut self.bus)
                {
                    let mut hooks = transition_hooks!(self, world, axis, true);
                    let _ = self.machine.try_switch(LocomotionState::Jumping, &mut hooks);
                } else if !intent.crouch_held
                    && self
                        .crouch
                        .try_exit_crouch(world, &self.body, &mut self.ctx, &mut self.bus)
                {
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Default, &mut hooks);
                }
            }
            LocomotionState::Dashing { .. } => {
                if jump_request && self.jump.can_execute(&self.ctx) {
                    let mut hooks = transition_hooks!(self, world, axis, true);
                    let _ = self.machine.try_switch(LocomotionState::Jumping, &mut hooks);
                }
            }
            LocomotionState::Climbing => {
                let bottom_exit = self.ctx.grounded && axis[1] < 0.0;
                if intent.jump_pressed || bottom_exit {
                    self.climb
                        .detach(world, &self.body, &mut self.ctx, &mut self.bus);
                    let mut hooks = transition_hooks!(self, world, axis, false);
                    let _ = self.machine.try_switch(LocomotionState::Default, &mut hooks);
                }
            }
            LocomotionState::Dead => {}
        }
    }

    /// Drains the bus and routes cross-behaviour reactions.
    fn route_events(&mut self, world: &mut PhysicsWorld) {
        for event in self.bus.drain() {
            match event {
                LocomotionEvent::Land => {
                    self.jump.on_land(&mut self.ctx);
                    if self.jump.take_buffered() {
                        self.buffered_jump = true;
                    }
                }
                LocomotionEvent::Jump => {
                    self.ground.invalidate_after_jump(&mut self.ctx);
                    self.stamina.spend_jump(&mut self.ctx, &mut self.bus);
                    if self.wall_run.running() {
                        // The wall jump carries its own outward impulse.
                        self.wall_run
                            .cancel(world, &self.body, &mut self.ctx, &mut self.bus, false);
                    }
                }
                LocomotionEvent::DashStart => {
                    self.stamina.spend_dash(&mut self.ctx, &mut self.bus);
                }
                LocomotionEvent::SlideStart => {
                    self.stamina.spend_slide(&mut self.ctx, &mut self.bus);
                }
                LocomotionEvent::WallRunStart => self.jump.on_wall_run_start(),
                LocomotionEvent::WallBounceStart => self.jump.on_wall_bounce(),
                LocomotionEvent::GrappleStart => self.jump.on_grapple_start(),
                _ => {}
            }
        }
    }

    /// Global death: reachable from every state, terminal until `respawn`.
    pub fn kill(&mut self, world: &mut PhysicsWorld) {
        if self.machine.current().is_dead() {
            return;
        }
        self.grapple.detach(world, &mut self.ctx);
        self.machine.begin_tick();
        let axis = self.intent.move_axis;
        let mut hooks = transition_hooks!(self, world, axis, false);
        let _ = self.machine.try_switch(LocomotionState::Dead, &mut hooks);
        self.bus.emit(LocomotionEvent::Died);
        self.route_events(world);
    }

    /// Resets the machine to `Default` at the spawn point with fresh pools.
    pub fn respawn(&mut self, world: &mut PhysicsWorld) {
        if !self.machine.current().is_dead() {
            return;
        }
        self.body.set_position(world, self.spawn_position);
        self.body.set_velocity(world, Vector::zeros());
        self.body.set_gravity_scale(world, 1.0);
        self.body.clear_forces(world);

        self.ctx.reset_for_respawn();
        self.jump.reset();
        self.dash.reset();
        self.stamina.reset(&mut self.ctx);
        self.speed_lines.reset();
        self.ground = GroundSense::new();
        self.buffered_jump = false;
        self.intent = InputIntent::default();

        let axis = [0.0, 0.0];
        let mut hooks = transition_hooks!(self, world, axis, false);
        self.machine.respawn(&mut hooks);
    }
}
