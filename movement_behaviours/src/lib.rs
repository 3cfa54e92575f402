//! The movement behaviours: one module per mechanic, each owning its own
//! resources and mutating only its documented slice of the shared context.
#![forbid(unsafe_code)]

pub mod basic;
pub mod climb;
pub mod crouch_slide;
pub mod dash;
pub mod footsteps;
pub mod grapple;
pub mod jump;
pub mod speed_lines;
pub mod stamina;
pub mod velocity;
pub mod wall_bounce;
pub mod wall_run;

pub use basic::BasicMovement;
pub use climb::ClimbLadder;
pub use crouch_slide::CrouchSlide;
pub use dash::DashBehaviour;
pub use footsteps::Footsteps;
pub use grapple::Grapple;
pub use jump::JumpBehaviour;
pub use speed_lines::SpeedLines;
pub use stamina::Stamina;
pub use velocity::VelocityHandler;
pub use wall_bounce::WallBounce;
pub use wall_run::WallRun;

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Horizontal part of a velocity.
pub(crate) fn planar(v: Vector<Real>) -> Vector<Real> {
    Vector::new(v.x, 0.0, v.z)
}

pub(crate) fn planar_speed(v: Vector<Real>) -> Real {
    (v.x * v.x + v.z * v.z).sqrt()
}
