//! libretro C ABI
//!
//! Layouts and constants mirror `libretro.h`. Only what the bridge uses is
//! declared.

use libc::{c_char, c_int, c_uint, c_void};
use lr_core::{HwContextKind, InputDevice, LogLevel, PixelFormat, Region};

pub const RETRO_API_VERSION: c_uint = 1;

// Environment commands
pub const RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const RETRO_ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const RETRO_ENVIRONMENT_SET_DISK_CONTROL_INTERFACE: c_uint = 13;
pub const RETRO_ENVIRONMENT_SET_HW_RENDER: c_uint = 14;
pub const RETRO_ENVIRONMENT_GET_VARIABLE: c_uint = 15;
pub const RETRO_ENVIRONMENT_SET_VARIABLES: c_uint = 16;
pub const RETRO_ENVIRONMENT_SET_SUPPORT_NO_GAME: c_uint = 18;
pub const RETRO_ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY: c_uint = 31;
pub const RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO: c_uint = 32;
pub const RETRO_ENVIRONMENT_GET_PREFERRED_HW_RENDER: c_uint = 56;
pub const RETRO_ENVIRONMENT_SET_DISK_CONTROL_EXT_INTERFACE: c_uint = 58;

// Pixel formats
pub const RETRO_PIXEL_FORMAT_0RGB1555: c_uint = 0;
pub const RETRO_PIXEL_FORMAT_XRGB8888: c_uint = 1;
pub const RETRO_PIXEL_FORMAT_RGB565: c_uint = 2;

// Hardware context types
pub const RETRO_HW_CONTEXT_NONE: c_uint = 0;
pub const RETRO_HW_CONTEXT_OPENGL: c_uint = 1;
pub const RETRO_HW_CONTEXT_OPENGLES2: c_uint = 2;
pub const RETRO_HW_CONTEXT_OPENGL_CORE: c_uint = 3;
pub const RETRO_HW_CONTEXT_OPENGLES3: c_uint = 4;
pub const RETRO_HW_CONTEXT_OPENGLES_VERSION: c_uint = 5;
pub const RETRO_HW_CONTEXT_VULKAN: c_uint = 6;
pub const RETRO_HW_CONTEXT_DIRECT3D: c_uint = 7;

// Regions
pub const RETRO_REGION_NTSC: c_uint = 0;
pub const RETRO_REGION_PAL: c_uint = 1;

// Log levels
pub const RETRO_LOG_DEBUG: c_int = 0;
pub const RETRO_LOG_INFO: c_int = 1;
pub const RETRO_LOG_WARN: c_int = 2;
pub const RETRO_LOG_ERROR: c_int = 3;

// Input devices
pub const RETRO_DEVICE_JOYPAD: c_uint = 1;
pub const RETRO_DEVICE_ANALOG: c_uint = 5;

/// Passed as frame data when the frame was rendered into the hardware
/// framebuffer
pub const RETRO_HW_FRAME_BUFFER_VALID: *const c_void = usize::MAX as *const c_void;

pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type VideoRefreshFn = unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;
pub type InputPollFn = unsafe extern "C" fn();
pub type InputStateFn = unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;
pub type LogPrintfFn = unsafe extern "C" fn(level: c_int, fmt: *const c_char, ...);

pub type HwContextResetFn = unsafe extern "C" fn();
pub type HwGetCurrentFramebufferFn = unsafe extern "C" fn() -> usize;
pub type ProcAddressFn = unsafe extern "C" fn();
pub type HwGetProcAddressFn = unsafe extern "C" fn(sym: *const c_char) -> Option<ProcAddressFn>;

#[repr(C)]
pub struct RetroSystemInfo {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroGameGeometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroSystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroSystemAvInfo {
    pub geometry: RetroGameGeometry,
    pub timing: RetroSystemTiming,
}

impl From<&lr_core::SystemAvInfo> for RetroSystemAvInfo {
    fn from(info: &lr_core::SystemAvInfo) -> Self {
        Self {
            geometry: RetroGameGeometry {
                base_width: info.geometry.base_width,
                base_height: info.geometry.base_height,
                max_width: info.geometry.max_width,
                max_height: info.geometry.max_height,
                aspect_ratio: info.geometry.aspect_ratio,
            },
            timing: RetroSystemTiming {
                fps: info.timing.fps,
                sample_rate: info.timing.sample_rate,
            },
        }
    }
}

#[repr(C)]
pub struct RetroGameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

#[repr(C)]
pub struct RetroVariable {
    pub key: *const c_char,
    pub value: *const c_char,
}

#[repr(C)]
pub struct RetroLogCallback {
    pub log: Option<LogPrintfFn>,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RetroHwRenderCallback {
    pub context_type: c_uint,
    pub context_reset: Option<HwContextResetFn>,
    /// Filled in by the frontend
    pub get_current_framebuffer: Option<HwGetCurrentFramebufferFn>,
    /// Filled in by the frontend
    pub get_proc_address: Option<HwGetProcAddressFn>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub cache_context: bool,
    pub context_destroy: Option<HwContextResetFn>,
    pub debug_context: bool,
}

/// The first seven members match `retro_disk_control_callback`, so the
/// same table serves both registration commands.
#[repr(C)]
pub struct RetroDiskControlExtCallback {
    pub set_eject_state: Option<unsafe extern "C" fn(ejected: bool) -> bool>,
    pub get_eject_state: Option<unsafe extern "C" fn() -> bool>,
    pub get_image_index: Option<unsafe extern "C" fn() -> c_uint>,
    pub set_image_index: Option<unsafe extern "C" fn(index: c_uint) -> bool>,
    pub get_num_images: Option<unsafe extern "C" fn() -> c_uint>,
    pub replace_image_index: Option<unsafe extern "C" fn(index: c_uint, info: *const RetroGameInfo) -> bool>,
    pub add_image_index: Option<unsafe extern "C" fn() -> bool>,
    pub set_initial_image: Option<unsafe extern "C" fn(index: c_uint, path: *const c_char) -> bool>,
    pub get_image_path: Option<unsafe extern "C" fn(index: c_uint, path: *mut c_char, len: usize) -> bool>,
    pub get_image_label: Option<unsafe extern "C" fn(index: c_uint, label: *mut c_char, len: usize) -> bool>,
}

pub fn pixel_format_to_raw(format: PixelFormat) -> c_uint {
    match format {
        PixelFormat::Rgb1555 => RETRO_PIXEL_FORMAT_0RGB1555,
        PixelFormat::Xrgb8888 => RETRO_PIXEL_FORMAT_XRGB8888,
        PixelFormat::Rgb565 => RETRO_PIXEL_FORMAT_RGB565,
    }
}

pub fn context_kind_to_raw(kind: HwContextKind) -> c_uint {
    match kind {
        HwContextKind::None => RETRO_HW_CONTEXT_NONE,
        HwContextKind::OpenGl => RETRO_HW_CONTEXT_OPENGL,
        HwContextKind::OpenGles2 => RETRO_HW_CONTEXT_OPENGLES2,
        HwContextKind::OpenGlCore => RETRO_HW_CONTEXT_OPENGL_CORE,
        HwContextKind::OpenGles3 => RETRO_HW_CONTEXT_OPENGLES3,
        HwContextKind::OpenGlesVersion => RETRO_HW_CONTEXT_OPENGLES_VERSION,
        HwContextKind::Vulkan => RETRO_HW_CONTEXT_VULKAN,
        HwContextKind::Direct3D => RETRO_HW_CONTEXT_DIRECT3D,
    }
}

pub fn context_kind_from_raw(raw: c_uint) -> Option<HwContextKind> {
    let kind = match raw {
        RETRO_HW_CONTEXT_NONE => HwContextKind::None,
        RETRO_HW_CONTEXT_OPENGL => HwContextKind::OpenGl,
        RETRO_HW_CONTEXT_OPENGLES2 => HwContextKind::OpenGles2,
        RETRO_HW_CONTEXT_OPENGL_CORE => HwContextKind::OpenGlCore,
        RETRO_HW_CONTEXT_OPENGLES3 => HwContextKind::OpenGles3,
        RETRO_HW_CONTEXT_OPENGLES_VERSION => HwContextKind::OpenGlesVersion,
        RETRO_HW_CONTEXT_VULKAN => HwContextKind::Vulkan,
        RETRO_HW_CONTEXT_DIRECT3D => HwContextKind::Direct3D,
        _ => return None,
    };
    Some(kind)
}

pub fn log_level_to_raw(level: LogLevel) -> c_int {
    match level {
        LogLevel::Debug => RETRO_LOG_DEBUG,
        LogLevel::Info => RETRO_LOG_INFO,
        LogLevel::Warn => RETRO_LOG_WARN,
        LogLevel::Error => RETRO_LOG_ERROR,
    }
}

pub fn region_to_raw(region: Region) -> c_uint {
    match region {
        Region::Ntsc => RETRO_REGION_NTSC,
        Region::Pal => RETRO_REGION_PAL,
    }
}

pub fn device_to_raw(device: InputDevice) -> c_uint {
    match device {
        InputDevice::Joypad => RETRO_DEVICE_JOYPAD,
        InputDevice::Analog => RETRO_DEVICE_ANALOG,
    }
}

/// Copy `text` into a caller-provided C buffer of `len` bytes,
/// truncating and always NUL-terminating. Returns `false` if there is no
/// room for even the terminator.
///
/// # Safety
///
/// `buf` must be valid for writes of `len` bytes.
pub unsafe fn copy_to_c_buffer(text: &str, buf: *mut c_char, len: usize) -> bool {
    if buf.is_null() || len == 0 {
        return false;
    }
    let bytes = text.as_bytes();
    let count = bytes.len().min(len - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buf, count);
    *buf.add(count) = 0;
    true
}

/// Borrow a C string as UTF-8, lossily
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives
/// the returned value.
pub unsafe fn str_from_c<'a>(ptr: *const c_char) -> Option<std::borrow::Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    Some(std::ffi::CStr::from_ptr(ptr).to_string_lossy())
}
