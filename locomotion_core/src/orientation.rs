//! Movement basis derived from the camera. Recomputed once per camera
//! update; behaviours read it, only the camera writes it.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug)]
pub struct Orientation {
    pub yaw: Real,
    pub pitch: Real,
    /// Horizontal forward (yaw only).
    pub forward: Vector<Real>,
    /// Horizontal right (yaw only).
    pub right: Vector<Real>,
    /// Full camera forward including pitch.
    pub look_forward: Vector<Real>,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::from_look(0.0, 0.0)
    }
}

impl Orientation {
    pub fn from_look(yaw: Real, pitch: Real) -> Self {
        let forward = Vector::new(yaw.sin(), 0.0, -yaw.cos());
        let right = Vector::new(yaw.cos(), 0.0, yaw.sin());
        let look_forward = Vector::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        Self {
            yaw,
            pitch,
            forward,
            right,
            look_forward,
        }
    }

    /// World-space wish direction for a 2-D input axis, capped at unit
    /// length. Zero input yields a zero vector.
    pub fn wish_dir(&self, axis: [Real; 2]) -> Vector<Real> {
        let intent = self.right * axis[0] + self.forward * axis[1];
        let mag = intent.norm();
        if mag <= 1.0e-6 {
            return Vector::zeros();
        }
        if mag > 1.0 {
            intent / mag
        } else {
            intent
        }
    }

    /// Splits a world velocity into (right, forward) components.
    pub fn local_planar(&self, velocity: Vector<Real>) -> [Real; 2] {
        let planar = Vector::new(velocity.x, 0.0, velocity.z);
        [planar.dot(&self.right), planar.dot(&self.forward)]
    }
}

/// Projects `dir` onto the plane with the given normal, renormalized.
/// Returns `dir` unchanged when the projection degenerates.
pub fn project_onto_plane(dir: Vector<Real>, normal: Vector<Real>) -> Vector<Real> {
    let projected = dir - normal * dir.dot(&normal);
    if projected.norm_squared() > 1.0e-8 {
        projected.normalize() * dir.norm()
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_yaw_faces_negative_z() {
        let o = Orientation::from_look(0.0, 0.0);
        assert!((o.forward - Vector::new(0.0, 0.0, -1.0)).norm() < 1.0e-6);
        assert!((o.right - Vector::new(1.0, 0.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn look_forward_includes_pitch() {
        let o = Orientation::from_look(0.0, std::f32::consts::FRAC_PI_2);
        assert!(o.look_forward.y > 0.99);
    }

    #[test]
    fn wish_dir_caps_diagonal_input() {
        let o = Orientation::from_look(0.0, 0.0);
        let wish = o.wish_dir([1.0, 1.0]);
        assert!(wish.norm() <= 1.0 + 1.0e-6);
    }

    #[test]
    fn local_planar_round_trips_forward_motion() {
        let o = Orientation::from_look(1.3, 0.0);
        let v = o.forward * 5.0;
        let [lateral, longitudinal] = o.local_planar(v);
        assert!(lateral.abs() < 1.0e-4);
        assert!((longitudinal - 5.0).abs() < 1.0e-4);
    }

    #[test]
    fn slope_projection_preserves_magnitude() {
        let normal = Vector::new(0.0, 1.0, 0.0);
        let dir = Vector::new(0.0, 0.5, -1.0);
        let projected = project_onto_plane(dir, normal);
        assert!(projected.y.abs() < 1.0e-6);
        assert!((projected.norm() - dir.norm()).abs() < 1.0e-4);
    }
}
