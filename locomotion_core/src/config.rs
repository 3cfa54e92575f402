//! Locomotion tunables.
//!
//! One record per player session, read-only once handed to the context.
//! Defaults are the tuned values; a TOML file may override any subset of
//! fields (missing fields keep their defaults).

use std::fmt;
use std::fs;
use std::path::Path;

use rapier3d::prelude::Real;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpDirectionMode {
    /// Vertical impulse only.
    #[default]
    None,
    /// Extra impulse along the current input direction.
    Input,
    /// Extra impulse along the horizontal camera forward.
    Forward,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashDirectionMode {
    /// Horizontal camera forward.
    #[default]
    Forward,
    /// Full camera forward including pitch.
    Free,
    /// Input direction, falling back to forward with no input.
    Input,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallRunCancelMode {
    /// Cancel only on height loss or opposing travel.
    #[default]
    Condition,
    /// Additionally cancel when the countdown expires.
    Timer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbMoveMode {
    /// Vertical speed straight from the input axis.
    #[default]
    Raw,
    /// Vertical speed from the camera look direction.
    Look,
    /// Average of the two.
    Combined,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrapplePullMode {
    /// Pull scaled linearly with distance to the anchor.
    #[default]
    Linear,
    /// Pull blended with camera-forward influence.
    Blended,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: Real,
    pub run_speed: Real,
    pub move_force: Real,
    pub counter_movement: Real,
    pub air_control_scale: Real,
    pub max_slope_angle: Real,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 8.0,
            move_force: 3200.0,
            counter_movement: 0.175,
            air_control_scale: 0.4,
            max_slope_angle: 50.0_f32.to_radians(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Downward probe distance below the capsule foot.
    pub detect_distance: Real,
    /// Delay before a single negative probe actually un-grounds.
    pub ungrounded_delay: Real,
    /// Window after a landing during which no second land event fires.
    pub land_cooldown: Real,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            detect_distance: 0.15,
            ungrounded_delay: 0.1,
            land_cooldown: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub enabled: bool,
    pub max_jumps: u32,
    pub jump_force: Real,
    pub jump_cooldown: Real,
    pub coyote_time: Real,
    pub direction_mode: JumpDirectionMode,
    pub direction_force: Real,
    pub buffer_enabled: bool,
    pub buffer_window: Real,
    /// Lateral scale of the wall-jump impulse along the wall normal.
    pub wall_jump_lateral_scale: Real,
    pub reset_on_wall_run: bool,
    pub reset_on_wall_bounce: bool,
    pub reset_on_grapple: bool,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_jumps: 2,
            jump_force: 5.5,
            jump_cooldown: 0.25,
            coyote_time: 0.15,
            direction_mode: JumpDirectionMode::None,
            direction_force: 2.0,
            buffer_enabled: false,
            buffer_window: 0.1,
            wall_jump_lateral_scale: 0.8,
            reset_on_wall_run: true,
            reset_on_wall_bounce: true,
            reset_on_grapple: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub enabled: bool,
    pub max_charges: u32,
    pub regen_cooldown: Real,
    pub force: Real,
    pub duration: Real,
    pub direction_mode: DashDirectionMode,
    pub infinite: bool,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_charges: 2,
            regen_cooldown: 2.0,
            force: 60.0,
            duration: 0.25,
            direction_mode: DashDirectionMode::Forward,
            infinite: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct WallRunConfig {
    pub enabled: bool,
    /// Side probe distance for wall detection.
    pub detect_range: Real,
    /// No ground may lie within this distance below the player.
    pub min_height: Real,
    pub max_speed: Real,
    /// Upward force countering gravity while running.
    pub gravity_counter: Real,
    /// Lateral force pressing into the wall.
    pub push_force: Real,
    pub cancel_mode: WallRunCancelMode,
    pub duration: Real,
    /// Outward impulse along the wall normal on any cancel.
    pub exit_impulse: Real,
}

impl Default for WallRunConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detect_range: 0.9,
            min_height: 1.6,
            max_speed: 10.0,
            gravity_counter: 0.85,
            push_force: 600.0,
            cancel_mode: WallRunCancelMode::Condition,
            duration: 1.5,
            exit_impulse: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct WallBounceConfig {
    pub enabled: bool,
    pub detect_range: Real,
    pub force: Real,
    pub up_force: Real,
}

impl Default for WallBounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detect_range: 1.2,
            force: 9.0,
            up_force: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ClimbConfig {
    pub enabled: bool,
    pub detect_range: Real,
    pub climb_speed: Real,
    pub move_mode: ClimbMoveMode,
    /// Looking further down than this pitch (radians, negative = down)
    /// blocks a grounded forward attach in look mode.
    pub steep_look_pitch: Real,
    /// Airborne forward/strafe attach requires looking at least this far
    /// down.
    pub look_down_pitch: Real,
    /// Upward clearance that zeroes climbing input near a ceiling.
    pub ceiling_clearance: Real,
    pub top_exit_up_impulse: Real,
    pub top_exit_forward_impulse: Real,
    pub hide_weapon: bool,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detect_range: 0.8,
            climb_speed: 3.0,
            move_mode: ClimbMoveMode::Raw,
            steep_look_pitch: -1.0,
            look_down_pitch: -0.35,
            ceiling_clearance: 0.4,
            top_exit_up_impulse: 4.0,
            top_exit_forward_impulse: 2.5,
            hide_weapon: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct CrouchConfig {
    pub crouch_speed: Real,
    /// Total slide boost, distributed over the boost window.
    pub slide_boost_force: Real,
    pub slide_boost_window: Real,
    pub slide_steer_multiplier: Real,
    pub slide_duration: Real,
    pub slide_stop_speed: Real,
    /// Fraction of speed retained when a slide ends.
    pub slide_exit_retain: Real,
    pub slide_friction_enabled: bool,
    /// Upward clearance required to stand back up.
    pub stand_clearance: Real,
}

impl Default for CrouchConfig {
    fn default() -> Self {
        Self {
            crouch_speed: 2.5,
            slide_boost_force: 9.0,
            slide_boost_window: 0.2,
            slide_steer_multiplier: 0.35,
            slide_duration: 1.0,
            slide_stop_speed: 1.5,
            slide_exit_retain: 0.6,
            slide_friction_enabled: false,
            stand_clearance: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GrappleConfig {
    pub enabled: bool,
    pub range: Real,
    pub spring: Real,
    pub damper: Real,
    /// Rest length as a fraction of the attach distance.
    pub rest_length_factor: Real,
    pub break_distance: Real,
    pub pull_force: Real,
    pub pull_mode: GrapplePullMode,
    /// Camera-forward blend weight in `Blended` mode.
    pub forward_blend: Real,
    pub cooldown: Real,
    pub rope_draw_duration: Real,
    pub rope_wave_amplitude: Real,
    pub rope_wave_decay: Real,
    pub rope_wave_count: Real,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            range: 25.0,
            spring: 450.0,
            damper: 70.0,
            rest_length_factor: 0.8,
            break_distance: 1.5,
            pull_force: 900.0,
            pull_mode: GrapplePullMode::Linear,
            forward_blend: 0.35,
            cooldown: 1.0,
            rope_draw_duration: 0.3,
            rope_wave_amplitude: 0.8,
            rope_wave_decay: 6.0,
            rope_wave_count: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub max: Real,
    /// Regaining this much re-enables the run/jump gates after depletion.
    pub min_to_run: Real,
    pub jump_cost: Real,
    pub dash_cost: Real,
    pub slide_cost: Real,
    pub sprint_drain_per_sec: Real,
    pub regen_per_sec: Real,
    /// No regeneration while moving faster than this.
    pub regen_speed_threshold: Real,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            min_to_run: 20.0,
            jump_cost: 10.0,
            dash_cost: 15.0,
            slide_cost: 8.0,
            sprint_drain_per_sec: 12.0,
            regen_per_sec: 18.0,
            regen_speed_threshold: 8.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct FootstepConfig {
    /// Distance between steps at walk speed.
    pub stride: Real,
    pub sprint_stride_scale: Real,
    pub crouch_stride_scale: Real,
}

impl Default for FootstepConfig {
    fn default() -> Self {
        Self {
            stride: 2.2,
            sprint_stride_scale: 1.35,
            crouch_stride_scale: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SpeedLinesConfig {
    pub min_speed: Real,
    pub max_speed: Real,
    pub smoothing: Real,
}

impl Default for SpeedLinesConfig {
    fn default() -> Self {
        Self {
            min_speed: 9.0,
            max_speed: 20.0,
            smoothing: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub sensitivity: Real,
    pub pitch_limit: Real,
    pub eye_height: Real,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            pitch_limit: 1.54,
            eye_height: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub capsule_height: Real,
    pub capsule_radius: Real,
    pub mass: Real,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            capsule_height: 1.8,
            capsule_radius: 0.4,
            mass: 80.0,
        }
    }
}

/// The full per-session configuration record.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub body: BodyConfig,
    pub movement: MovementConfig,
    pub ground: GroundConfig,
    pub jump: JumpConfig,
    pub dash: DashConfig,
    pub wall_run: WallRunConfig,
    pub wall_bounce: WallBounceConfig,
    pub climb: ClimbConfig,
    pub crouch: CrouchConfig,
    pub grapple: GrappleConfig,
    pub stamina: StaminaConfig,
    pub footsteps: FootstepConfig,
    pub speed_lines: SpeedLinesConfig,
    pub camera: CameraConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(err) => write!(f, "failed to read config: {}", err),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl LocomotionConfig {
    /// Loads a TOML override file. A missing file yields the defaults;
    /// malformed TOML is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Read(err)),
        };
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = LocomotionConfig::default();
        assert!(config.movement.run_speed > config.movement.walk_speed);
        assert!(config.jump.max_jumps >= 1);
        assert_eq!(config.crouch.slide_exit_retain, 0.6);
        assert_eq!(config.ground.ungrounded_delay, 0.1);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = LocomotionConfig::parse(
            r#"
            [dash]
            max_charges = 3
            regen_cooldown = 2.0

            [jump]
            direction_mode = "input"
            "#,
        )
        .unwrap();
        assert_eq!(config.dash.max_charges, 3);
        assert_eq!(config.jump.direction_mode, JumpDirectionMode::Input);
        // Untouched fields keep their defaults.
        assert_eq!(config.dash.force, LocomotionConfig::default().dash.force);
        assert_eq!(config.stamina.max, 100.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(LocomotionConfig::parse("[dash\nmax_charges = 3").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = LocomotionConfig::load(Path::new("/nonexistent/locomotion.toml")).unwrap();
        assert_eq!(config.jump.max_jumps, LocomotionConfig::default().jump.max_jumps);
    }
}
