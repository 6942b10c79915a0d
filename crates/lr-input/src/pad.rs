//! DualShock 2 pad model

use bitflags::bitflags;

bitflags! {
    /// DualShock 2 buttons, in the order of the controller's 16-bit
    /// button report. The report itself is active-low.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PadButtons: u16 {
        const SELECT     = 0x0001;
        const L3         = 0x0002;
        const R3         = 0x0004;
        const START      = 0x0008;
        const DPAD_UP    = 0x0010;
        const DPAD_RIGHT = 0x0020;
        const DPAD_DOWN  = 0x0040;
        const DPAD_LEFT  = 0x0080;
        const L2         = 0x0100;
        const R2         = 0x0200;
        const L1         = 0x0400;
        const R1         = 0x0800;
        const TRIANGLE   = 0x1000;
        const CIRCLE     = 0x2000;
        const CROSS      = 0x4000;
        const SQUARE     = 0x8000;
    }
}

/// Analog stick centre value
pub const ANALOG_CENTER: u8 = 0x80;

/// Controller ports on the console
pub const MAX_PORTS: usize = 2;

/// Multitap slots per port
pub const MAX_SLOTS: usize = 4;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadState {
    /// Pressed buttons
    pub buttons: PadButtons,
    /// Left analog X (0-255, 128 = center)
    pub left_x: u8,
    /// Left analog Y (0-255, 128 = center)
    pub left_y: u8,
    /// Right analog X (0-255, 128 = center)
    pub right_x: u8,
    /// Right analog Y (0-255, 128 = center)
    pub right_y: u8,
}

impl PadState {
    pub fn new() -> Self {
        Self {
            buttons: PadButtons::empty(),
            left_x: ANALOG_CENTER,
            left_y: ANALOG_CENTER,
            right_x: ANALOG_CENTER,
            right_y: ANALOG_CENTER,
        }
    }

    pub fn is_button_pressed(&self, button: PadButtons) -> bool {
        self.buttons.contains(button)
    }

    pub fn set_button(&mut self, button: PadButtons, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// Button bytes as the pad reports them (active-low, little endian)
    pub fn button_report(&self) -> [u8; 2] {
        (!self.buttons.bits()).to_le_bytes()
    }

    /// Analog bytes in report order: right X/Y, then left X/Y
    pub fn analog_report(&self) -> [u8; 4] {
        [self.right_x, self.right_y, self.left_x, self.left_y]
    }
}

impl Default for PadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads for every port and multitap slot
#[derive(Debug, Clone, Default)]
pub struct PadSet {
    pads: [[PadState; MAX_SLOTS]; MAX_PORTS],
    /// Active slot per port (0-based)
    slots: [usize; MAX_PORTS],
}

impl PadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release everything and select slot 0 on both ports
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Select the active multitap slot. `port` and `slot` are 1-based;
    /// returns `false` for a port above 2 or a slot above 4.
    pub fn set_slot(&mut self, port: u8, slot: u8) -> bool {
        let (Some(port), Some(slot)) = (
            (port as usize).checked_sub(1),
            (slot as usize).checked_sub(1),
        ) else {
            return false;
        };
        if port >= MAX_PORTS || slot >= MAX_SLOTS {
            return false;
        }

        // Recorded even if nothing is plugged into that slot
        self.slots[port] = slot;
        true
    }

    pub fn slot(&self, port: usize) -> usize {
        self.slots.get(port).copied().unwrap_or(0)
    }

    /// State of the active slot on `port`
    pub fn active(&self, port: usize) -> Option<&PadState> {
        let slot = self.slot(port);
        self.pads.get(port).map(|slots| &slots[slot])
    }

    pub fn pad(&self, port: usize, slot: usize) -> Option<&PadState> {
        self.pads.get(port)?.get(slot)
    }

    pub fn pad_mut(&mut self, port: usize, slot: usize) -> Option<&mut PadState> {
        self.pads.get_mut(port)?.get_mut(slot)
    }
}
