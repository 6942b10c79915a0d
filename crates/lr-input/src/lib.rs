//! Controller input for the PS2 libretro bridge

pub mod pad;
pub mod relay;

pub use pad::{PadButtons, PadSet, PadState};
pub use relay::InputRelay;
