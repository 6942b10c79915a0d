//! Input relay
//!
//! Once per tick the relay polls the frontend and latches the joypad and
//! analog state of each frontend port into slot 0 of the matching console
//! port. The emulator's pad emulation reads the latched state from its own
//! thread, so the pad set sits behind a lock.

use crate::pad::{PadButtons, PadSet, PadState, MAX_PORTS};
use lr_core::{InputDevice, InputSource};
use parking_lot::Mutex;

/// Frontend joypad ids (RETRO_DEVICE_ID_JOYPAD_*) and the pad button each
/// drives. Face buttons follow position, not label.
const JOYPAD_MAP: [(u32, PadButtons); 16] = [
    (0, PadButtons::CROSS),
    (1, PadButtons::SQUARE),
    (2, PadButtons::SELECT),
    (3, PadButtons::START),
    (4, PadButtons::DPAD_UP),
    (5, PadButtons::DPAD_DOWN),
    (6, PadButtons::DPAD_LEFT),
    (7, PadButtons::DPAD_RIGHT),
    (8, PadButtons::CIRCLE),
    (9, PadButtons::TRIANGLE),
    (10, PadButtons::L1),
    (11, PadButtons::R1),
    (12, PadButtons::L2),
    (13, PadButtons::R2),
    (14, PadButtons::L3),
    (15, PadButtons::R3),
];

const ANALOG_LEFT: u32 = 0;
const ANALOG_RIGHT: u32 = 1;
const ANALOG_X: u32 = 0;
const ANALOG_Y: u32 = 1;

/// Map a signed 16-bit stick axis onto the pad's 0..=255 range
pub fn axis_to_u8(value: i16) -> u8 {
    ((value >> 8) as i32 + 128) as u8
}

/// Per-tick relay from frontend input to the emulated pads
#[derive(Debug, Default)]
pub struct InputRelay {
    pads: Mutex<PadSet>,
}

impl InputRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every button and centre every stick
    pub fn init(&self) {
        self.pads.lock().reset();
        tracing::debug!("Input relay initialized");
    }

    /// Poll the frontend and latch the state of every port
    pub fn update(&self, source: &dyn InputSource) {
        source.poll();

        let mut latched = [PadState::new(); MAX_PORTS];
        for (port, state) in latched.iter_mut().enumerate() {
            let port = port as u32;
            for &(id, button) in &JOYPAD_MAP {
                state.set_button(button, source.state(port, InputDevice::Joypad, 0, id) != 0);
            }
            state.left_x = axis_to_u8(source.state(port, InputDevice::Analog, ANALOG_LEFT, ANALOG_X));
            state.left_y = axis_to_u8(source.state(port, InputDevice::Analog, ANALOG_LEFT, ANALOG_Y));
            state.right_x = axis_to_u8(source.state(port, InputDevice::Analog, ANALOG_RIGHT, ANALOG_X));
            state.right_y = axis_to_u8(source.state(port, InputDevice::Analog, ANALOG_RIGHT, ANALOG_Y));
        }

        let mut pads = self.pads.lock();
        for (port, state) in latched.into_iter().enumerate() {
            if let Some(pad) = pads.pad_mut(port, 0) {
                *pad = state;
            }
        }
    }

    /// State the console sees on `port` (active multitap slot)
    pub fn pad_state(&self, port: usize) -> Option<PadState> {
        self.pads.lock().active(port).copied()
    }

    /// Select the active multitap slot, 1-based
    pub fn set_slot(&self, port: u8, slot: u8) -> bool {
        self.pads.lock().set_slot(port, slot)
    }
}
