use gilrs::{Axis, Button, Gilrs};
use terrainview_input::GamepadSample;

/// Buttons in XInput order: face buttons, then the two shoulders.
const BUTTONS: [Button; 6] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
];

/// Open the gamepad backend. A missing backend only disables gamepad input.
pub fn open() -> Option<Gilrs> {
    match Gilrs::new() {
        Ok(gilrs) => {
            for (_, pad) in gilrs.gamepads() {
                tracing::info!("gamepad connected: {}", pad.name());
            }
            Some(gilrs)
        }
        Err(e) => {
            tracing::warn!("gamepad input unavailable: {e}");
            None
        }
    }
}

/// Sample the first connected pad into XInput axis order:
/// `[left_x, left_y, triggers, right_y, right_x]` with Y growing downwards
/// and `triggers` as left minus right.
pub fn sample(gilrs: &mut Gilrs) -> Option<GamepadSample> {
    while let Some(event) = gilrs.next_event() {
        tracing::trace!("gamepad event: {:?}", event.event);
    }

    let (_, pad) = gilrs.gamepads().next()?;
    let trigger = |button| pad.button_data(button).map_or(0.0, |data| data.value());

    Some(GamepadSample {
        axes: vec![
            pad.value(Axis::LeftStickX),
            -pad.value(Axis::LeftStickY),
            trigger(Button::LeftTrigger2) - trigger(Button::RightTrigger2),
            -pad.value(Axis::RightStickY),
            pad.value(Axis::RightStickX),
        ],
        buttons: BUTTONS.iter().map(|&b| pad.is_pressed(b)).collect(),
    })
}
