//! Core types for the PS2 libretro bridge
//!
//! This crate provides the error taxonomy, persisted configuration,
//! logging bridge, core options and the host capability interfaces
//! shared by every other crate.

pub mod config;
pub mod error;
pub mod events;
pub mod helper;
pub mod host;
pub mod logging;
pub mod options;

pub use config::EmuConfig;
pub use error::{CoreError, GsError, LoadError, Result};
pub use events::PendingEvents;
pub use helper::{CancelToken, HelperThread};
pub use host::{
    AudioSink, Environment, GameGeometry, HwContextKind, HwRenderRequest, InputDevice,
    InputSource, LogLevel, LogSink, PixelFormat, Region, SystemAvInfo, SystemTiming,
    VariableDescriptor, VideoSink,
};
pub use options::{CoreOption, CoreOptions, Renderer};
