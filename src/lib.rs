//! PS2 libretro core
//!
//! Exports the `retro_*` entry points. All state lives in one process-wide
//! [`CoreContext`]; the context and disk-control callbacks reach the GS
//! lifecycle and the disk image directory through their own handles so a
//! frontend calling back while an entry point is running never waits on
//! the runner lock.

use libc::{c_char, c_uint, c_void};
use lr_core::Result;
use lr_ffi::abi::*;
use lr_ffi::{FfiAudio, FfiEnvironment, FfiInput, FfiVideo, HwContextHooks, HwRenderInterface};
use lr_gs::{GsBackend, GsLifecycle, NullBackend};
use lr_integration::{CoreRunner, EmulationControl, NullMachine};
use lr_vfs::DiskImageDirectory;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::ptr;
use std::sync::Arc;

/// Process-wide core state
struct CoreContext {
    runner: Mutex<CoreRunner>,
    /// Shared with `context_reset` / `context_destroy`
    gs: Arc<GsLifecycle>,
    /// Shared with the disk-control callbacks
    disks: Arc<Mutex<DiskImageDirectory>>,
    env: RwLock<Option<Arc<FfiEnvironment>>>,
    audio: Mutex<(Option<AudioSampleFn>, Option<AudioSampleBatchFn>)>,
    input: Mutex<(Option<InputPollFn>, Option<InputStateFn>)>,
}

static CORE: Lazy<CoreContext> = Lazy::new(|| {
    let runner = CoreRunner::new(Box::new(NullMachine::new()), Box::new(NullBackend::new()));
    CoreContext {
        gs: runner.gs(),
        disks: runner.disks(),
        runner: Mutex::new(runner),
        env: RwLock::new(None),
        audio: Mutex::new((None, None)),
        input: Mutex::new((None, None)),
    }
});

static DISK_CONTROL: RetroDiskControlExtCallback = RetroDiskControlExtCallback {
    set_eject_state: Some(disk_set_eject_state),
    get_eject_state: Some(disk_get_eject_state),
    get_image_index: Some(disk_get_image_index),
    set_image_index: Some(disk_set_image_index),
    get_num_images: Some(disk_get_num_images),
    replace_image_index: Some(disk_replace_image_index),
    add_image_index: Some(disk_add_image_index),
    set_initial_image: Some(disk_set_initial_image),
    get_image_path: Some(disk_get_image_path),
    get_image_label: Some(disk_get_image_label),
};

/// Replace the null machine and GS backend with real ones. Must be called
/// before a game is loaded.
pub fn install_collaborators(machine: Box<dyn EmulationControl>, backend: Box<dyn GsBackend>) -> Result<()> {
    CORE.runner.lock().install_collaborators(machine, backend)
}

/// Framebuffer and proc-address entry points of the accepted hardware
/// context, for backends that draw through it
pub fn hw_render_interface() -> Option<HwRenderInterface> {
    CORE.env.read().as_ref().and_then(|env| env.hw_interface())
}

// ============================================================================
// Callback registration
// ============================================================================

#[no_mangle]
pub extern "C" fn retro_api_version() -> c_uint {
    RETRO_API_VERSION
}

#[no_mangle]
pub extern "C" fn retro_set_environment(callback: Option<EnvironmentFn>) {
    let Some(callback) = callback else {
        return;
    };
    let env = Arc::new(
        FfiEnvironment::new(callback)
            .with_context_hooks(HwContextHooks {
                context_reset: hw_context_reset,
                context_destroy: hw_context_destroy,
            })
            .with_disk_control(&DISK_CONTROL),
    );
    *CORE.env.write() = Some(env.clone());
    CORE.runner.lock().set_environment(env);
}

#[no_mangle]
pub extern "C" fn retro_set_video_refresh(callback: Option<VideoRefreshFn>) {
    if let Some(callback) = callback {
        CORE.runner.lock().set_video(Arc::new(FfiVideo::new(callback)));
    }
}

#[no_mangle]
pub extern "C" fn retro_set_audio_sample(callback: Option<AudioSampleFn>) {
    let audio = {
        let mut audio = CORE.audio.lock();
        audio.0 = callback;
        *audio
    };
    CORE.runner.lock().set_audio(Arc::new(FfiAudio::new(audio.0, audio.1)));
}

#[no_mangle]
pub extern "C" fn retro_set_audio_sample_batch(callback: Option<AudioSampleBatchFn>) {
    let audio = {
        let mut audio = CORE.audio.lock();
        audio.1 = callback;
        *audio
    };
    CORE.runner.lock().set_audio(Arc::new(FfiAudio::new(audio.0, audio.1)));
}

#[no_mangle]
pub extern "C" fn retro_set_input_poll(callback: Option<InputPollFn>) {
    let input = {
        let mut input = CORE.input.lock();
        input.0 = callback;
        *input
    };
    if let (Some(poll), Some(state)) = input {
        CORE.runner.lock().set_input(Arc::new(FfiInput::new(poll, state)));
    }
}

#[no_mangle]
pub extern "C" fn retro_set_input_state(callback: Option<InputStateFn>) {
    let input = {
        let mut input = CORE.input.lock();
        input.1 = callback;
        *input
    };
    if let (Some(poll), Some(state)) = input {
        CORE.runner.lock().set_input(Arc::new(FfiInput::new(poll, state)));
    }
}

#[no_mangle]
pub extern "C" fn retro_set_controller_port_device(port: c_uint, device: c_uint) {
    tracing::debug!("Controller port {} set to device {}", port, device);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[no_mangle]
pub extern "C" fn retro_init() {
    if let Err(e) = CORE.runner.lock().init() {
        tracing::error!("retro_init failed: {}", e);
    }
}

#[no_mangle]
pub extern "C" fn retro_deinit() {
    CORE.runner.lock().deinit();
}

/// # Safety
///
/// `info` must point to writable storage for a `retro_system_info`.
#[no_mangle]
pub unsafe extern "C" fn retro_get_system_info(info: *mut RetroSystemInfo) {
    if info.is_null() {
        return;
    }
    let system = CORE.runner.lock().system_info();
    info.write(RetroSystemInfo {
        library_name: system.library_name.as_ptr(),
        library_version: system.library_version.as_ptr(),
        valid_extensions: system.valid_extensions.as_ptr(),
        need_fullpath: system.need_fullpath,
        block_extract: system.block_extract,
    });
}

/// # Safety
///
/// `info` must point to writable storage for a `retro_system_av_info`.
#[no_mangle]
pub unsafe extern "C" fn retro_get_system_av_info(info: *mut RetroSystemAvInfo) {
    if info.is_null() {
        return;
    }
    let av = CORE.runner.lock().system_av_info();
    info.write(RetroSystemAvInfo::from(&av));
}

/// # Safety
///
/// `game` is null or points to a valid `retro_game_info`.
#[no_mangle]
pub unsafe extern "C" fn retro_load_game(game: *const RetroGameInfo) -> bool {
    let path = game
        .as_ref()
        .and_then(|game| str_from_c(game.path))
        .map(|path| PathBuf::from(path.into_owned()));

    match CORE.runner.lock().load_game(path.as_deref()) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("retro_load_game failed: {}", e);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn retro_load_game_special(game_type: c_uint, _info: *const RetroGameInfo, _num_info: usize) -> bool {
    CORE.runner.lock().load_game_special(game_type)
}

#[no_mangle]
pub extern "C" fn retro_unload_game() {
    CORE.runner.lock().unload_game();
}

#[no_mangle]
pub extern "C" fn retro_run() {
    CORE.runner.lock().run();
}

#[no_mangle]
pub extern "C" fn retro_reset() {
    CORE.runner.lock().reset();
}

#[no_mangle]
pub extern "C" fn retro_get_region() -> c_uint {
    region_to_raw(CORE.runner.lock().region())
}

// ============================================================================
// Unsupported surfaces
// ============================================================================

#[no_mangle]
pub extern "C" fn retro_serialize_size() -> usize {
    CORE.runner.lock().serialize_size()
}

/// # Safety
///
/// `data` is null or valid for `size` bytes of writes.
#[no_mangle]
pub unsafe extern "C" fn retro_serialize(data: *mut c_void, size: usize) -> bool {
    if data.is_null() {
        return false;
    }
    let buffer = std::slice::from_raw_parts_mut(data as *mut u8, size);
    CORE.runner.lock().serialize(buffer)
}

/// # Safety
///
/// `data` is null or valid for `size` bytes of reads.
#[no_mangle]
pub unsafe extern "C" fn retro_unserialize(data: *const c_void, size: usize) -> bool {
    if data.is_null() {
        return false;
    }
    let buffer = std::slice::from_raw_parts(data as *const u8, size);
    CORE.runner.lock().unserialize(buffer)
}

#[no_mangle]
pub extern "C" fn retro_get_memory_data(_id: c_uint) -> *mut c_void {
    ptr::null_mut()
}

#[no_mangle]
pub extern "C" fn retro_get_memory_size(id: c_uint) -> usize {
    CORE.runner.lock().memory_size(id)
}

#[no_mangle]
pub extern "C" fn retro_cheat_reset() {
    CORE.runner.lock().cheat_reset();
}

/// # Safety
///
/// `code` is null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn retro_cheat_set(index: c_uint, enabled: bool, code: *const c_char) {
    let code = str_from_c(code).unwrap_or_default();
    CORE.runner.lock().cheat_set(index, enabled, &code);
}

// ============================================================================
// Hardware context callbacks
// ============================================================================

unsafe extern "C" fn hw_context_reset() {
    if let Err(e) = CORE.gs.context_reset() {
        tracing::error!("Failed to open GS worker on context reset: {}", e);
    }
}

unsafe extern "C" fn hw_context_destroy() {
    CORE.gs.context_destroy();
}

// ============================================================================
// Disk control
// ============================================================================

unsafe extern "C" fn disk_set_eject_state(ejected: bool) -> bool {
    CORE.disks.lock().set_eject_state(ejected)
}

unsafe extern "C" fn disk_get_eject_state() -> bool {
    CORE.disks.lock().eject_state()
}

unsafe extern "C" fn disk_get_image_index() -> c_uint {
    CORE.disks.lock().current_index()
}

unsafe extern "C" fn disk_set_image_index(index: c_uint) -> bool {
    CORE.disks.lock().set_current_index(index)
}

unsafe extern "C" fn disk_get_num_images() -> c_uint {
    CORE.disks.lock().image_count()
}

unsafe extern "C" fn disk_replace_image_index(index: c_uint, info: *const RetroGameInfo) -> bool {
    let path = info.as_ref().and_then(|info| str_from_c(info.path));
    CORE.disks.lock().replace(index, path.as_deref())
}

unsafe extern "C" fn disk_add_image_index() -> bool {
    CORE.disks.lock().append_empty()
}

unsafe extern "C" fn disk_set_initial_image(index: c_uint, path: *const c_char) -> bool {
    let Some(path) = str_from_c(path) else {
        return false;
    };
    CORE.disks.lock().set_initial(index, &path)
}

unsafe extern "C" fn disk_get_image_path(index: c_uint, path: *mut c_char, len: usize) -> bool {
    let disks = CORE.disks.lock();
    match disks.path_of(index) {
        Some(image) => copy_to_c_buffer(image, path, len),
        None => false,
    }
}

unsafe extern "C" fn disk_get_image_label(index: c_uint, label: *mut c_char, len: usize) -> bool {
    match CORE.disks.lock().label_of(index) {
        Some(text) => copy_to_c_buffer(&text, label, len),
        None => false,
    }
}
