//! Audio output for the PS2 libretro bridge

pub mod sink;

pub use sink::{to_s16, DeliveryMode, SampleSink, StereoOut32, BATCH_FRAMES};
