//! libretro C ABI bindings for the PS2 bridge
//!
//! `abi` declares the C layouts and constants; `host` adapts the
//! frontend's callbacks to the capability traits in `lr-core`.

pub mod abi;
pub mod host;

pub use host::{FfiAudio, FfiEnvironment, FfiInput, FfiLog, FfiVideo, HwContextHooks, HwRenderInterface};
