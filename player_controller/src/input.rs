//! Input sampling. Hosts hand over raw held state each frame; the adapter
//! normalizes the axis and derives press/release edges against the previous
//! frame.

use rapier3d::prelude::Real;

/// Raw device state for one frame, as held booleans.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub move_x: Real,
    pub move_y: Real,
    pub jump: bool,
    pub dash: bool,
    pub crouch: bool,
    pub sprint: bool,
    pub interact: bool,
    pub look_delta: [Real; 2],
}

/// Per-frame intent with edges resolved.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputIntent {
    pub move_axis: [Real; 2],
    pub look_delta: [Real; 2],
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub dash_pressed: bool,
    pub crouch_pressed: bool,
    pub crouch_held: bool,
    pub sprint_held: bool,
    pub interact_pressed: bool,
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent;
}

/// Stateful pass-through adapter: normalizes the axis and tracks edges.
#[derive(Default)]
pub struct DirectInputAdapter {
    prev: RawInput,
}

impl DirectInputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_axis(axis: [Real; 2]) -> [Real; 2] {
        let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        if len > 1.0 {
            [axis[0] / len, axis[1] / len]
        } else {
            axis
        }
    }
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent {
        let intent = InputIntent {
            move_axis: Self::normalize_axis([raw.move_x, raw.move_y]),
            look_delta: raw.look_delta,
            jump_pressed: raw.jump && !self.prev.jump,
            jump_held: raw.jump,
            dash_pressed: raw.dash && !self.prev.dash,
            crouch_pressed: raw.crouch && !self.prev.crouch,
            crouch_held: raw.crouch,
            sprint_held: raw.sprint,
            interact_pressed: raw.interact && !self.prev.interact,
        };
        self.prev = raw;
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_is_normalized_beyond_unit_length() {
        let mut adapter = DirectInputAdapter::new();
        let intent = adapter.intent(RawInput {
            move_x: 1.0,
            move_y: 1.0,
            ..RawInput::default()
        });
        let len = (intent.move_axis[0].powi(2) + intent.move_axis[1].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1.0e-6);

        let intent = adapter.intent(RawInput {
            move_y: 0.4,
            ..RawInput::default()
        });
        assert_eq!(intent.move_axis, [0.0, 0.4]);
    }

    #[test]
    fn edges_fire_once_per_press() {
        let mut adapter = DirectInputAdapter::new();
        let held = RawInput {
            jump: true,
            crouch: true,
            ..RawInput::default()
        };
        let first = adapter.intent(held);
        assert!(first.jump_pressed && first.crouch_pressed);
        let second = adapter.intent(held);
        assert!(!second.jump_pressed && !second.crouch_pressed);
        assert!(second.jump_held && second.crouch_held);

        let released = adapter.intent(RawInput::default());
        assert!(!released.crouch_held);
        assert!(!released.jump_pressed);
    }
}
