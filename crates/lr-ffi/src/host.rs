//! Host capability adapters
//!
//! Each adapter wraps the function pointers the frontend handed over and
//! implements the matching `lr-core` trait. The frontend guarantees the
//! pointers stay valid until `retro_deinit`.

use crate::abi::*;
use libc::{c_char, c_uint, c_void};
use lr_core::{
    AudioSink, Environment, HwContextKind, HwRenderRequest, InputDevice, InputSource, LogLevel, LogSink,
    PixelFormat, SystemAvInfo, VariableDescriptor, VideoSink,
};
use parking_lot::Mutex;
use std::ffi::CString;
use std::path::PathBuf;
use std::ptr;
use std::sync::Arc;

/// Callbacks the core installs into the hardware render request
#[derive(Clone, Copy)]
pub struct HwContextHooks {
    pub context_reset: HwContextResetFn,
    pub context_destroy: HwContextResetFn,
}

/// Frontend-provided entry points of the accepted hardware context
#[derive(Clone, Copy)]
pub struct HwRenderInterface {
    pub get_current_framebuffer: Option<HwGetCurrentFramebufferFn>,
    pub get_proc_address: Option<HwGetProcAddressFn>,
}

/// Environment channel bound to `retro_environment_t`
pub struct FfiEnvironment {
    callback: EnvironmentFn,
    hooks: Option<HwContextHooks>,
    disk_control: Option<&'static RetroDiskControlExtCallback>,
    hw_interface: Mutex<Option<HwRenderInterface>>,
}

impl FfiEnvironment {
    pub fn new(callback: EnvironmentFn) -> Self {
        Self {
            callback,
            hooks: None,
            disk_control: None,
            hw_interface: Mutex::new(None),
        }
    }

    /// Context lifecycle callbacks sent with every hardware render request
    pub fn with_context_hooks(mut self, hooks: HwContextHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Disk-control table registered by [`Environment::set_disk_control`]
    pub fn with_disk_control(mut self, table: &'static RetroDiskControlExtCallback) -> Self {
        self.disk_control = Some(table);
        self
    }

    /// Entry points of the last accepted hardware context
    pub fn hw_interface(&self) -> Option<HwRenderInterface> {
        *self.hw_interface.lock()
    }

    fn call(&self, cmd: c_uint, data: *mut c_void) -> bool {
        // SAFETY: `data` points to the structure `cmd` expects and lives
        // for the duration of the call.
        unsafe { (self.callback)(cmd, data) }
    }

    fn directory(&self, cmd: c_uint) -> Option<PathBuf> {
        let mut dir: *const c_char = ptr::null();
        if !self.call(cmd, &mut dir as *mut *const c_char as *mut c_void) {
            return None;
        }
        // SAFETY: the frontend returns a NUL-terminated string or null
        let dir = unsafe { str_from_c(dir) }?;
        if dir.is_empty() {
            return None;
        }
        Some(PathBuf::from(dir.into_owned()))
    }
}

impl Environment for FfiEnvironment {
    fn set_pixel_format(&self, format: PixelFormat) -> bool {
        let mut raw = pixel_format_to_raw(format);
        self.call(RETRO_ENVIRONMENT_SET_PIXEL_FORMAT, &mut raw as *mut c_uint as *mut c_void)
    }

    fn log_interface(&self) -> Option<Arc<dyn LogSink>> {
        let mut callback = RetroLogCallback { log: None };
        if !self.call(
            RETRO_ENVIRONMENT_GET_LOG_INTERFACE,
            &mut callback as *mut RetroLogCallback as *mut c_void,
        ) {
            return None;
        }
        callback.log.map(|log| Arc::new(FfiLog { log }) as Arc<dyn LogSink>)
    }

    fn system_directory(&self) -> Option<PathBuf> {
        self.directory(RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY)
    }

    fn save_directory(&self) -> Option<PathBuf> {
        self.directory(RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY)
    }

    fn set_hw_render(&self, request: &HwRenderRequest) -> bool {
        let mut callback = RetroHwRenderCallback {
            context_type: context_kind_to_raw(request.kind),
            context_reset: self.hooks.map(|h| h.context_reset),
            get_current_framebuffer: None,
            get_proc_address: None,
            depth: request.depth,
            stencil: request.stencil,
            bottom_left_origin: request.bottom_left_origin,
            version_major: request.version_major,
            version_minor: request.version_minor,
            cache_context: request.cache_context,
            context_destroy: self.hooks.map(|h| h.context_destroy),
            debug_context: false,
        };

        let accepted = self.call(
            RETRO_ENVIRONMENT_SET_HW_RENDER,
            &mut callback as *mut RetroHwRenderCallback as *mut c_void,
        );
        if accepted {
            *self.hw_interface.lock() = Some(HwRenderInterface {
                get_current_framebuffer: callback.get_current_framebuffer,
                get_proc_address: callback.get_proc_address,
            });
        }
        accepted
    }

    fn preferred_hw_render(&self) -> Option<HwContextKind> {
        let mut raw: c_uint = RETRO_HW_CONTEXT_NONE;
        if !self.call(
            RETRO_ENVIRONMENT_GET_PREFERRED_HW_RENDER,
            &mut raw as *mut c_uint as *mut c_void,
        ) {
            return None;
        }
        context_kind_from_raw(raw)
    }

    fn set_variables(&self, variables: &[VariableDescriptor]) -> bool {
        let strings: Vec<(CString, CString)> = variables
            .iter()
            .filter_map(|v| Some((CString::new(v.key.as_str()).ok()?, CString::new(v.value.as_str()).ok()?)))
            .collect();

        let mut table: Vec<RetroVariable> = strings
            .iter()
            .map(|(key, value)| RetroVariable {
                key: key.as_ptr(),
                value: value.as_ptr(),
            })
            .collect();
        table.push(RetroVariable {
            key: ptr::null(),
            value: ptr::null(),
        });

        self.call(RETRO_ENVIRONMENT_SET_VARIABLES, table.as_mut_ptr() as *mut c_void)
    }

    fn get_variable(&self, key: &str) -> Option<String> {
        let key = CString::new(key).ok()?;
        let mut variable = RetroVariable {
            key: key.as_ptr(),
            value: ptr::null(),
        };
        if !self.call(
            RETRO_ENVIRONMENT_GET_VARIABLE,
            &mut variable as *mut RetroVariable as *mut c_void,
        ) {
            return None;
        }
        // SAFETY: the frontend returns a NUL-terminated string or null
        unsafe { str_from_c(variable.value) }.map(|v| v.into_owned())
    }

    fn set_system_av_info(&self, info: &SystemAvInfo) -> bool {
        let mut raw = RetroSystemAvInfo::from(info);
        self.call(
            RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO,
            &mut raw as *mut RetroSystemAvInfo as *mut c_void,
        )
    }

    fn set_disk_control(&self) -> bool {
        let Some(table) = self.disk_control else {
            return false;
        };
        let data = table as *const RetroDiskControlExtCallback as *mut c_void;
        if self.call(RETRO_ENVIRONMENT_SET_DISK_CONTROL_EXT_INTERFACE, data) {
            return true;
        }
        tracing::debug!("Extended disk control unsupported, registering the basic interface");
        self.call(RETRO_ENVIRONMENT_SET_DISK_CONTROL_INTERFACE, data)
    }

    fn set_support_no_game(&self, supported: bool) -> bool {
        let mut flag = supported;
        self.call(
            RETRO_ENVIRONMENT_SET_SUPPORT_NO_GAME,
            &mut flag as *mut bool as *mut c_void,
        )
    }
}

/// Host log interface bound to `retro_log_printf_t`
pub struct FfiLog {
    log: LogPrintfFn,
}

impl LogSink for FfiLog {
    fn log(&self, level: LogLevel, message: &str) {
        let text = CString::new(message.replace('\0', " ")).unwrap_or_default();
        // SAFETY: "%s" consumes exactly the one string argument passed
        unsafe { (self.log)(log_level_to_raw(level), c"%s".as_ptr(), text.as_ptr()) };
    }
}

/// Video callback
pub struct FfiVideo {
    refresh: VideoRefreshFn,
}

impl FfiVideo {
    pub fn new(refresh: VideoRefreshFn) -> Self {
        Self { refresh }
    }
}

impl VideoSink for FfiVideo {
    fn present_hardware(&self, width: u32, height: u32) {
        unsafe { (self.refresh)(RETRO_HW_FRAME_BUFFER_VALID, width, height, 0) };
    }

    fn present_software(&self, pixels: &[u32], width: u32, height: u32) {
        if pixels.len() < (width as usize) * (height as usize) {
            tracing::warn!("Software frame too small for {}x{}", width, height);
            return;
        }
        let pitch = width as usize * std::mem::size_of::<u32>();
        unsafe { (self.refresh)(pixels.as_ptr() as *const c_void, width, height, pitch) };
    }

    fn duplicate(&self, width: u32, height: u32) {
        unsafe { (self.refresh)(ptr::null(), width, height, 0) };
    }
}

/// Audio callbacks; either may be missing until the frontend sets it
pub struct FfiAudio {
    sample: Option<AudioSampleFn>,
    batch: Option<AudioSampleBatchFn>,
}

impl FfiAudio {
    pub fn new(sample: Option<AudioSampleFn>, batch: Option<AudioSampleBatchFn>) -> Self {
        Self { sample, batch }
    }
}

impl AudioSink for FfiAudio {
    fn sample(&self, left: i16, right: i16) {
        if let Some(sample) = self.sample {
            unsafe { sample(left, right) };
        }
    }

    fn sample_batch(&self, interleaved: &[i16]) -> usize {
        match self.batch {
            Some(batch) => unsafe { batch(interleaved.as_ptr(), interleaved.len() / 2) },
            None => 0,
        }
    }
}

/// Input callbacks
pub struct FfiInput {
    poll: InputPollFn,
    state: InputStateFn,
}

impl FfiInput {
    pub fn new(poll: InputPollFn, state: InputStateFn) -> Self {
        Self { poll, state }
    }
}

impl InputSource for FfiInput {
    fn poll(&self) {
        unsafe { (self.poll)() };
    }

    fn state(&self, port: u32, device: InputDevice, index: u32, id: u32) -> i16 {
        unsafe { (self.state)(port, device_to_raw(device), index, id) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    static COMMANDS: Mutex<Vec<c_uint>> = parking_lot::const_mutex(Vec::new());
    static BASIC_DISK_ONLY: AtomicBool = AtomicBool::new(false);

    unsafe extern "C" fn fake_framebuffer() -> usize {
        7
    }

    unsafe extern "C" fn fake_environment(cmd: c_uint, data: *mut c_void) -> bool {
        COMMANDS.lock().push(cmd);
        match cmd {
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
                *(data as *mut *const c_char) = c"/retro/system".as_ptr();
                true
            }
            RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY => {
                *(data as *mut *const c_char) = ptr::null();
                true
            }
            RETRO_ENVIRONMENT_SET_HW_RENDER => {
                let callback = &mut *(data as *mut RetroHwRenderCallback);
                if callback.context_type != RETRO_HW_CONTEXT_OPENGL_CORE {
                    return false;
                }
                callback.get_current_framebuffer = Some(fake_framebuffer);
                true
            }
            RETRO_ENVIRONMENT_GET_VARIABLE => {
                let variable = &mut *(data as *mut RetroVariable);
                if CStr::from_ptr(variable.key).to_bytes() == b"pcsx2_renderer" {
                    variable.value = c"Software".as_ptr();
                    true
                } else {
                    false
                }
            }
            RETRO_ENVIRONMENT_SET_VARIABLES => {
                let table = data as *const RetroVariable;
                let first = &*table;
                let second = &*table.add(1);
                CStr::from_ptr(first.key).to_bytes() == b"pcsx2_fastboot" && second.key.is_null()
            }
            RETRO_ENVIRONMENT_GET_PREFERRED_HW_RENDER => {
                *(data as *mut c_uint) = RETRO_HW_CONTEXT_DIRECT3D;
                true
            }
            RETRO_ENVIRONMENT_SET_DISK_CONTROL_EXT_INTERFACE => !BASIC_DISK_ONLY.load(Ordering::SeqCst),
            RETRO_ENVIRONMENT_SET_DISK_CONTROL_INTERFACE => true,
            _ => false,
        }
    }

    static DISK_TABLE: RetroDiskControlExtCallback = RetroDiskControlExtCallback {
        set_eject_state: None,
        get_eject_state: None,
        get_image_index: None,
        set_image_index: None,
        get_num_images: None,
        replace_image_index: None,
        add_image_index: None,
        set_initial_image: None,
        get_image_path: None,
        get_image_label: None,
    };

    // All environment behaviour lives in one test so the shared command
    // log is not interleaved with other tests.
    #[test]
    fn test_environment_commands() {
        let env = FfiEnvironment::new(fake_environment).with_disk_control(&DISK_TABLE);

        assert_eq!(env.system_directory(), Some(PathBuf::from("/retro/system")));
        assert_eq!(env.save_directory(), None);

        assert_eq!(env.get_variable("pcsx2_renderer").as_deref(), Some("Software"));
        assert_eq!(env.get_variable("pcsx2_bios"), None);

        assert!(env.set_variables(&[VariableDescriptor {
            key: "pcsx2_fastboot".to_string(),
            value: "Fast Boot; enabled|disabled".to_string(),
        }]));

        assert_eq!(env.preferred_hw_render(), Some(HwContextKind::Direct3D));

        let mut request = HwRenderRequest {
            kind: HwContextKind::Direct3D,
            version_major: 11,
            version_minor: 0,
            depth: true,
            stencil: false,
            bottom_left_origin: true,
            cache_context: true,
        };
        assert!(!env.set_hw_render(&request));
        assert!(env.hw_interface().is_none());
        request.kind = HwContextKind::OpenGlCore;
        assert!(env.set_hw_render(&request));
        let interface = env.hw_interface().unwrap();
        assert_eq!(interface.get_current_framebuffer.map(|f| unsafe { f() }), Some(7));

        COMMANDS.lock().clear();
        assert!(env.set_disk_control());
        BASIC_DISK_ONLY.store(true, Ordering::SeqCst);
        assert!(env.set_disk_control());
        assert_eq!(
            *COMMANDS.lock(),
            vec![
                RETRO_ENVIRONMENT_SET_DISK_CONTROL_EXT_INTERFACE,
                RETRO_ENVIRONMENT_SET_DISK_CONTROL_EXT_INTERFACE,
                RETRO_ENVIRONMENT_SET_DISK_CONTROL_INTERFACE,
            ]
        );

        assert!(!FfiEnvironment::new(fake_environment).set_disk_control());
    }
}
