//! Camera look behaviour: yaw/pitch accumulation from look deltas and the
//! orientation basis the movement behaviours consume.
#![forbid(unsafe_code)]

use locomotion_core::config::CameraConfig;
use locomotion_core::orientation::Orientation;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub eye: Vector<Real>,
    pub yaw: Real,
    pub pitch: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerCamera {
    config: CameraConfig,
    yaw: Real,
    pitch: Real,
    eye: Vector<Real>,
}

impl PlayerCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            yaw: 0.0,
            pitch: 0.0,
            eye: Vector::zeros(),
        }
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    pub fn pitch(&self) -> Real {
        self.pitch
    }

    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-self.config.pitch_limit, self.config.pitch_limit);
    }

    /// Applies a raw look delta scaled by sensitivity, clamping pitch.
    pub fn apply_look_delta(&mut self, delta: [Real; 2]) {
        self.yaw += delta[0] * self.config.sensitivity;
        self.pitch = (self.pitch + delta[1] * self.config.sensitivity)
            .clamp(-self.config.pitch_limit, self.config.pitch_limit);
    }

    /// The movement basis for the current look direction.
    pub fn orientation(&self) -> Orientation {
        Orientation::from_look(self.yaw, self.pitch)
    }

    pub fn update_from_origin(&mut self, origin: Vector<Real>) -> CameraPose {
        self.eye = origin + Vector::new(0.0, self.config.eye_height, 0.0);
        self.pose()
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_clamped_to_limit() {
        let mut camera = PlayerCamera::new(CameraConfig::default());
        camera.apply_look_delta([0.0, 10.0]);
        assert!(camera.pitch() <= CameraConfig::default().pitch_limit);
        camera.apply_look_delta([0.0, -20.0]);
        assert!(camera.pitch() >= -CameraConfig::default().pitch_limit);
    }

    #[test]
    fn sensitivity_scales_look_delta() {
        let config = CameraConfig {
            sensitivity: 2.0,
            ..CameraConfig::default()
        };
        let mut camera = PlayerCamera::new(config);
        camera.apply_look_delta([0.5, 0.0]);
        assert!((camera.yaw() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn orientation_tracks_yaw() {
        let mut camera = PlayerCamera::new(CameraConfig::default());
        camera.set_look(std::f32::consts::FRAC_PI_2, 0.0);
        let orientation = camera.orientation();
        assert!((orientation.forward.x - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn eye_sits_above_origin() {
        let mut camera = PlayerCamera::new(CameraConfig::default());
        let pose = camera.update_from_origin(Vector::new(1.0, 1.0, 1.0));
        assert!(pose.eye.y > 1.0);
    }
}
