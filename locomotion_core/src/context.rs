//! The shared per-player locomotion context.
//!
//! One instance per player, owned by the host driver; behaviours receive a
//! mutable reference during their tick. Field ownership is documented per
//! field: a behaviour writes only its own fields plus the listed
//! cross-cutting ones, and the fixed per-state tick order guarantees no two
//! behaviours write the same field in one step without the later one reading
//! the earlier value.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::config::LocomotionConfig;
use crate::orientation::Orientation;
use crate::timers::{TimerKey, TimerPool};

pub struct LocomotionContext {
    /// Read-only after construction.
    pub config: LocomotionConfig,
    /// Written by the camera behaviour, read everywhere.
    pub orientation: Orientation,
    /// Shared countdown timers, advanced once at the top of each tick.
    pub timers: TimerPool<TimerKey>,

    // -- ground detection (writer: ground_sense) --
    pub grounded: bool,
    pub is_on_slope: bool,
    pub slope_normal: Option<Vector<Real>>,

    // -- jump (writer: jump; ground_sense resets coyote on unground) --
    pub has_jumped: bool,
    pub coyote_timer: Real,

    // -- wall run (writer: wall_run) --
    pub wall_running: bool,
    pub wall_left: bool,
    pub wall_normal: Option<Vector<Real>>,
    pub wall_bounce_height_ok: bool,

    // -- crouch/slide (writer: crouch_slide) --
    pub crouching: bool,
    pub sliding: bool,

    // -- climb (writer: climb) --
    pub climbing: bool,

    // -- dash (writer: dash) --
    pub dashing: bool,

    // -- stamina gates (writer: stamina, flipped atomically) --
    pub enough_stamina_to_run: bool,
    pub enough_stamina_to_jump: bool,

    // -- host-owned control gating --
    pub controllable: bool,

    // -- speed clamp inputs (writer: state transitions / host) --
    /// Target horizontal speed for the velocity clamp.
    pub current_speed: Real,
    /// Dynamic multiplier (equipped-weight style) applied to the clamp.
    pub weight_multiplier: Real,
}

impl LocomotionContext {
    pub fn new(config: LocomotionConfig) -> Self {
        let walk_speed = config.movement.walk_speed;
        Self {
            config,
            orientation: Orientation::default(),
            timers: TimerPool::new(),
            grounded: false,
            is_on_slope: false,
            slope_normal: None,
            has_jumped: false,
            coyote_timer: 0.0,
            wall_running: false,
            wall_left: false,
            wall_normal: None,
            wall_bounce_height_ok: false,
            crouching: false,
            sliding: false,
            climbing: false,
            dashing: false,
            enough_stamina_to_run: true,
            enough_stamina_to_jump: true,
            controllable: true,
            current_speed: walk_speed,
            weight_multiplier: 1.0,
        }
    }

    /// Effective clamp speed: base speed scaled by the weight multiplier.
    pub fn weighted_speed(&self) -> Real {
        self.current_speed * self.weight_multiplier
    }

    /// Resets every runtime flag for a respawn, keeping configuration.
    pub fn reset_for_respawn(&mut self) {
        let config = self.config;
        *self = Self::new(config);
    }
}
