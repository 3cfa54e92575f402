//! Player controller composition: input sampling, the behaviour set, the
//! state machine and the camera, driven as one variable-rate and one
//! fixed-rate tick per frame.
#![forbid(unsafe_code)]

pub mod controller;
pub mod input;

pub use controller::PlayerController;
pub use input::{DirectInputAdapter, InputAdapter, InputIntent, RawInput};
