//! Host capability interfaces
//!
//! The frontend hands the core a set of callbacks once and invokes the core
//! many times afterwards. Each callback family is modelled as a small trait
//! so the tick driver can be exercised against in-process fakes; `lr-ffi`
//! supplies the implementations bound to the real C function pointers.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Pixel formats the frontend can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb1555,
    Xrgb8888,
    Rgb565,
}

/// Host log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Kind of hardware rendering context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwContextKind {
    /// No hardware context; frames are produced in software
    None,
    /// Legacy (compatibility profile) OpenGL
    OpenGl,
    OpenGles2,
    /// OpenGL core profile
    OpenGlCore,
    OpenGles3,
    OpenGlesVersion,
    Vulkan,
    Direct3D,
}

impl fmt::Display for HwContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::OpenGl => "OpenGL",
            Self::OpenGles2 => "OpenGL ES 2",
            Self::OpenGlCore => "OpenGL core",
            Self::OpenGles3 => "OpenGL ES 3",
            Self::OpenGlesVersion => "OpenGL ES",
            Self::Vulkan => "Vulkan",
            Self::Direct3D => "Direct3D",
        };
        f.write_str(name)
    }
}

/// Description of the hardware context the core asks the frontend for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwRenderRequest {
    pub kind: HwContextKind,
    pub version_major: u32,
    pub version_minor: u32,
    /// A depth buffer is attached to the frontend framebuffer
    pub depth: bool,
    pub stencil: bool,
    /// Framebuffer origin is bottom-left (OpenGL convention)
    pub bottom_left_origin: bool,
    /// The context survives a `context_destroy` and may be reused
    pub cache_context: bool,
}

/// Output geometry announced to the frontend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameGeometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
}

/// Output timing announced to the frontend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

/// Geometry plus timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemAvInfo {
    pub geometry: GameGeometry,
    pub timing: SystemTiming,
}

/// Video standard of the emulated console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
}

/// A core option as announced to the frontend (`"Label; a|b|c"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub key: String,
    pub value: String,
}

/// Environment query/set channel
pub trait Environment: Send + Sync {
    fn set_pixel_format(&self, format: PixelFormat) -> bool;

    /// Host log interface, if the frontend offers one
    fn log_interface(&self) -> Option<Arc<dyn LogSink>>;

    fn system_directory(&self) -> Option<PathBuf>;

    fn save_directory(&self) -> Option<PathBuf>;

    /// Ask the frontend for a hardware context. `true` means accepted.
    fn set_hw_render(&self, request: &HwRenderRequest) -> bool;

    /// The context kind the frontend's video driver prefers
    fn preferred_hw_render(&self) -> Option<HwContextKind>;

    fn set_variables(&self, variables: &[VariableDescriptor]) -> bool;

    /// Current value of a core option
    fn get_variable(&self, key: &str) -> Option<String>;

    fn set_system_av_info(&self, info: &SystemAvInfo) -> bool;

    /// Register the disk-control extension interface
    fn set_disk_control(&self) -> bool;

    fn set_support_no_game(&self, supported: bool) -> bool;
}

/// Video delivery
pub trait VideoSink: Send + Sync {
    /// A frame was rendered into the frontend's hardware framebuffer
    fn present_hardware(&self, width: u32, height: u32);

    /// A frame was rendered in software (XRGB8888, tightly packed)
    fn present_software(&self, pixels: &[u32], width: u32, height: u32);

    /// Nothing new was drawn; the frontend repeats the previous frame
    fn duplicate(&self, width: u32, height: u32);
}

/// Audio delivery
pub trait AudioSink: Send + Sync {
    fn sample(&self, left: i16, right: i16);

    /// Deliver interleaved stereo frames; returns the frames consumed
    fn sample_batch(&self, interleaved: &[i16]) -> usize;
}

/// Input device classes queried from the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputDevice {
    Joypad,
    Analog,
}

/// Input polling
pub trait InputSource: Send + Sync {
    /// Latch controller state for this tick
    fn poll(&self);

    fn state(&self, port: u32, device: InputDevice, index: u32, id: u32) -> i16;
}

/// Host log interface
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_kind_display() {
        assert_eq!(HwContextKind::OpenGlCore.to_string(), "OpenGL core");
        assert_eq!(HwContextKind::None.to_string(), "none");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Info);
    }
}
