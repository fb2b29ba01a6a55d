/// Raw gamepad state for one frame, in XInput axis order:
/// `[left_x, left_y, triggers, right_y, right_x]`, buttons with the
/// shoulder buttons at 4 and 5.
///
/// `left_y` and `right_y` grow downwards. `triggers` is left minus right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSample {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

pub(crate) const AXIS_COUNT: usize = 5;
pub(crate) const BUTTON_COUNT: usize = 6;
pub(crate) const LEFT_SHOULDER: usize = 4;
pub(crate) const RIGHT_SHOULDER: usize = 5;

impl GamepadSample {
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// The shoulder buttons exist only on pads reporting six or more buttons.
    pub fn has_shoulders(&self) -> bool {
        self.buttons.len() >= BUTTON_COUNT
    }
}

/// Stick and trigger values after dead-zone filtering. Signs are flipped
/// so that up and right-trigger are positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadAxes {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub triggers: f32,
}

impl GamepadAxes {
    /// Read and filter the axes, or `None` when the pad reports fewer than
    /// five of them.
    pub fn filtered(
        sample: &GamepadSample,
        stick_dead_zone: f32,
        trigger_dead_zone: f32,
    ) -> Option<Self> {
        if sample.axes.len() < AXIS_COUNT {
            tracing::trace!(axes = sample.axes.len(), "gamepad has too few axes, sticks ignored");
            return None;
        }
        let axes = &sample.axes;
        let stick = |v: f32| dead_zone(v, stick_dead_zone);
        Some(Self {
            left_x: stick(axes[0]),
            left_y: stick(axes[1]),
            right_x: stick(axes[4]),
            right_y: stick(-axes[3]),
            triggers: dead_zone(-axes[2], trigger_dead_zone),
        })
    }
}

fn dead_zone(value: f32, threshold: f32) -> f32 {
    if value.abs() < threshold { 0.0 } else { value }
}
