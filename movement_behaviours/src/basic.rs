//! Basic translation: input force, counter-movement friction, slope
//! traversal, and the idle/moving edge events.

use locomotion_core::context::LocomotionContext;
use locomotion_core::events::{EventBus, LocomotionEvent};
use locomotion_core::orientation::project_onto_plane;
use physics_rapier::{PhysicsWorld, PlayerBody};
use rapier3d::prelude::Real;

use crate::planar_speed;

/// Speed below which the player counts as idle.
const IDLE_SPEED: Real = 0.1;
/// Minimum local velocity component worth countering.
const COMPONENT_MIN: Real = 0.1;
/// Stick deadzone for the counter-movement decision.
const INPUT_DEAD: Real = 0.05;
/// Counter strength while the stick actively opposes the component.
const OPPOSE_SCALE: Real = 0.5;

/// Per-axis counter-movement response. Kept byte-for-byte with the tuned
/// thresholds; the formula is feel-tuned, not derived.
pub(crate) fn counter_axis(component: Real, input: Real) -> Real {
    if component.abs() > COMPONENT_MIN && input.abs() < INPUT_DEAD {
        -component
    } else if component > COMPONENT_MIN && input < -INPUT_DEAD {
        -component * OPPOSE_SCALE
    } else if component < -COMPONENT_MIN && input > INPUT_DEAD {
        -component * OPPOSE_SCALE
    } else {
        0.0
    }
}

pub struct BasicMovement {
    moving: bool,
}

impl Default for BasicMovement {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicMovement {
    pub fn new() -> Self {
        // Start on the moving side so a player idle from the first tick
        // still gets its idle entry edge.
        Self { moving: true }
    }

    pub fn fixed_update(
        &mut self,
        world: &mut PhysicsWorld,
        body: &PlayerBody,
        ctx: &mut LocomotionContext,
        bus: &mut EventBus,
        axis: [Real; 2],
        _dt: Real,
    ) {
        let cfg = ctx.config.movement;
        let velocity = body.velocity(world);
        let speed = planar_speed(velocity);

        let moving_now = speed > IDLE_SPEED;
        if moving_now != self.moving {
            self.moving = moving_now;
            bus.emit(if moving_now {
                LocomotionEvent::IdleToMove
            } else {
                LocomotionEvent::MovingToIdle
            });
        }

        if !ctx.controllable {
            return;
        }

        // Counter-movement: oppose velocity components the stick is not
        // asking for. Skipped airborne, while jump-transitioning, and while
        // crouch-sliding unless slide friction is on.
        let skip_counter = !ctx.grounded
            || ctx.has_jumped
            || (ctx.sliding && !ctx.config.crouch.slide_friction_enabled);
        if !skip_counter {
            let [lateral, longitudinal] = ctx.orientation.local_planar(velocity);
            let counter = ctx.orientation.right * counter_axis(lateral, axis[0])
                + ctx.orientation.forward * counter_axis(longitudinal, axis[1]);
            body.add_force(world, counter * cfg.move_force * cfg.counter_movement);
        }

        // Input force, projected along the slope plane when standing on one.
        let mut wish = ctx.orientation.wish_dir(axis);
        if ctx.is_on_slope && ctx.grounded {
            if let Some(normal) = ctx.slope_normal {
                wish = project_onto_plane(wish, normal);
            }
            if !ctx.has_jumped {
                // Traverse the slope instead of free-falling down it.
                let m = body.mass(world);
                body.add_force(world, -world.gravity * m);
            }
        }
        let control = if ctx.grounded {
            1.0
        } else {
            cfg.air_control_scale
        };
        body.add_force(world, wish * cfg.move_force * control);
    }
}
