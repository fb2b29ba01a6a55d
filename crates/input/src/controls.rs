use std::collections::HashSet;

/// A held-key flight control, independent of the physical key bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightControl {
    /// Nose down (default: W)
    PitchDown,
    /// Nose up (default: S)
    PitchUp,
    /// Turn left about up (default: Q)
    YawLeft,
    /// Turn right about up (default: E)
    YawRight,
    /// Roll left (default: A)
    RollLeft,
    /// Roll right (default: D)
    RollRight,
    /// Increase speed while held (default: Left Shift)
    Accelerate,
    /// Decrease speed while held (default: Left Ctrl)
    Decelerate,
}

impl FlightControl {
    pub const ALL: [FlightControl; 8] = [
        FlightControl::PitchDown,
        FlightControl::PitchUp,
        FlightControl::YawLeft,
        FlightControl::YawRight,
        FlightControl::RollLeft,
        FlightControl::RollRight,
        FlightControl::Accelerate,
        FlightControl::Decelerate,
    ];
}

/// Set of flight controls currently held down.
#[derive(Debug, Clone, Default)]
pub struct HeldControls {
    held: HashSet<FlightControl>,
}

impl HeldControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, control: FlightControl, pressed: bool) {
        if pressed {
            self.held.insert(control);
        } else {
            self.held.remove(&control);
        }
    }

    pub fn is_held(&self, control: FlightControl) -> bool {
        self.held.contains(&control)
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// `1.0` for `positive`, `-1.0` for `negative`, summed when both are held.
    pub fn axis(&self, negative: FlightControl, positive: FlightControl) -> f32 {
        let mut value = 0.0;
        if self.is_held(negative) {
            value -= 1.0;
        }
        if self.is_held(positive) {
            value += 1.0;
        }
        value
    }
}
