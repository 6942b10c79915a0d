//! Core runner that drives one session per loaded game
//!
//! The [`CoreRunner`] ties together:
//! - the frontend capability interfaces (environment, video, audio, input)
//! - the option surface and the persisted emulator configuration
//! - the GS worker lifecycle
//! - the sample sink and input relay shared with the machine
//! - the disk image directory
//! - the emulation-control collaborator
//!
//! Every entry point is called from the frontend's tick thread.

use crate::boot::{apply_host_pacing, plan_boot};
use crate::machine::{BootMode, BootRequest, EmulationControl, MachineLinks};
use crate::session::Session;
use lr_audio::SampleSink;
use lr_core::{
    logging, AudioSink, CoreError, CoreOptions, EmuConfig, Environment, GameGeometry, GsError,
    HwContextKind, InputSource, LoadError, PendingEvents, PixelFormat, Region, Renderer, Result,
    SystemAvInfo, SystemTiming, VideoSink,
};
use lr_core::config::CORE_DIR;
use lr_gs::backend::null::{NATIVE_HEIGHT, NATIVE_WIDTH};
use lr_gs::{negotiate, FrameOutput, FrameParams, FrameStatus, GsBackend, GsLifecycle};
use lr_input::InputRelay;
use lr_vfs::{probe_media, scan_bios_dir, BiosInfo, DiskImageDirectory};
use parking_lot::Mutex;
use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// SPU2 output rate
pub const SAMPLE_RATE: f64 = 48_000.0;

/// NTSC field rate
pub const NTSC_FPS: f64 = 60.0 / 1.001;

pub const PAL_FPS: f64 = 50.0;

const LIBRARY_VERSION: &CStr = match CStr::from_bytes_with_nul(concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes()) {
    Ok(version) => version,
    Err(_) => c"0.0.0",
};

/// Static core metadata reported to the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: &'static CStr,
    pub library_version: &'static CStr,
    /// `|`-separated extensions, without dots
    pub valid_extensions: &'static CStr,
    /// The frontend passes a path instead of loading the file into memory
    pub need_fullpath: bool,
    /// The frontend must not extract archives for us
    pub block_extract: bool,
}

pub const SYSTEM_INFO: SystemInfo = SystemInfo {
    library_name: c"pcsx2 (alpha)",
    library_version: LIBRARY_VERSION,
    valid_extensions: c"elf|iso|ciso|cue|bin",
    need_fullpath: true,
    block_extract: true,
};

/// Core runner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// `init` not yet called, or `deinit` done
    Uninitialized,
    /// Initialized with no game loaded
    Initialized,
    /// Game loaded, no frame run yet
    GameLoaded,
    /// At least one frame run
    Running,
}

/// Main core runner
pub struct CoreRunner {
    /// Current state
    state: CoreState,
    /// Environment channel
    env: Option<Arc<dyn Environment>>,
    /// Frame delivery
    video: Option<Arc<dyn VideoSink>>,
    /// Pad polling
    input_source: Option<Arc<dyn InputSource>>,
    /// Frontend-editable options
    options: CoreOptions,
    /// Configuration the machine boots with
    config: EmuConfig,
    /// BIOS images found by the last `init`
    bios: Vec<BiosInfo>,
    /// Directory scanned for BIOS images
    bios_dir: Option<PathBuf>,
    /// Deferred work shared with the machine and the GS worker
    events: Arc<PendingEvents>,
    /// GS worker, shared with the context callbacks
    gs: Arc<GsLifecycle>,
    /// SPU2 output
    audio: Arc<SampleSink>,
    /// Pad state
    input: Arc<InputRelay>,
    /// Disk-control state, shared with the disk-control callbacks
    disks: Arc<Mutex<DiskImageDirectory>>,
    /// Emulated console
    machine: Box<dyn EmulationControl>,
    /// The loaded game
    session: Option<Session>,
    /// Size of the last presented frame, reused for duplicates
    last_frame: (u32, u32),
}

impl CoreRunner {
    /// Create a runner around a machine and a GS backend
    pub fn new(mut machine: Box<dyn EmulationControl>, backend: Box<dyn GsBackend>) -> Self {
        tracing::info!("Creating core runner (GS backend: {})", backend.name());

        let events = Arc::new(PendingEvents::new());
        let gs = Arc::new(GsLifecycle::new(backend, events.clone()));
        let audio = Arc::new(SampleSink::default());
        let input = Arc::new(InputRelay::new());

        machine.attach(MachineLinks {
            audio: audio.clone(),
            input: input.clone(),
            events: events.clone(),
        });

        Self {
            state: CoreState::Uninitialized,
            env: None,
            video: None,
            input_source: None,
            options: CoreOptions::new(),
            config: EmuConfig::default(),
            bios: Vec::new(),
            bios_dir: None,
            events,
            gs,
            audio,
            input,
            disks: Arc::new(Mutex::new(DiskImageDirectory::new())),
            machine,
            session: None,
            last_frame: (NATIVE_WIDTH, NATIVE_HEIGHT),
        }
    }

    /// Replace the machine and the GS backend. Only valid without a game.
    pub fn install_collaborators(
        &mut self,
        mut machine: Box<dyn EmulationControl>,
        backend: Box<dyn GsBackend>,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(CoreError::InvalidState(
                "cannot replace collaborators while a game is loaded".to_string(),
            ));
        }

        tracing::info!("Installing GS backend: {}", backend.name());
        self.gs.set_backend(backend)?;

        self.machine.cleanup_on_exit();
        machine.attach(MachineLinks {
            audio: self.audio.clone(),
            input: self.input.clone(),
            events: self.events.clone(),
        });
        self.machine = machine;
        Ok(())
    }

    /// Store the environment channel and announce no-game support
    pub fn set_environment(&mut self, env: Arc<dyn Environment>) {
        env.set_support_no_game(true);
        self.env = Some(env);
    }

    pub fn set_video(&mut self, video: Arc<dyn VideoSink>) {
        self.video = Some(video);
    }

    pub fn set_audio(&mut self, audio: Arc<dyn AudioSink>) {
        self.audio.set_output(audio);
    }

    pub fn set_input(&mut self, input: Arc<dyn InputSource>) {
        self.input_source = Some(input);
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn options(&self) -> &CoreOptions {
        &self.options
    }

    pub fn config(&self) -> &EmuConfig {
        &self.config
    }

    pub fn bios(&self) -> &[BiosInfo] {
        &self.bios
    }

    pub fn gs(&self) -> Arc<GsLifecycle> {
        self.gs.clone()
    }

    pub fn disks(&self) -> Arc<Mutex<DiskImageDirectory>> {
        self.disks.clone()
    }

    pub fn events(&self) -> Arc<PendingEvents> {
        self.events.clone()
    }

    pub fn audio(&self) -> Arc<SampleSink> {
        self.audio.clone()
    }

    pub fn input(&self) -> Arc<InputRelay> {
        self.input.clone()
    }

    fn env(&self) -> Option<Arc<dyn Environment>> {
        self.env.clone()
    }

    /// Negotiate the pixel format and log sink, discover BIOS images and
    /// announce the options.
    ///
    /// Finding no BIOS is not an error here; `load_game` reports it.
    pub fn init(&mut self) -> Result<()> {
        if self.state != CoreState::Uninitialized {
            return Err(CoreError::InvalidState(format!("init called in state {:?}", self.state)));
        }
        let env = self
            .env()
            .ok_or_else(|| CoreError::InvalidState("no environment callback".to_string()))?;

        logging::init_logging(env.log_interface());
        tracing::info!("Initializing {} {}", SYSTEM_INFO.library_name.to_string_lossy(), env!("CARGO_PKG_VERSION"));

        if !env.set_pixel_format(PixelFormat::Xrgb8888) {
            tracing::warn!("Frontend rejected XRGB8888");
        }

        self.options = CoreOptions::new();
        self.config = EmuConfig {
            enable_ipc: false,
            ..EmuConfig::default()
        };

        self.bios_dir = env.system_directory().map(|dir| dir.join(CORE_DIR).join("bios"));
        self.bios = match &self.bios_dir {
            Some(dir) => scan_bios_dir(dir),
            None => {
                tracing::warn!("Frontend has no system directory");
                Vec::new()
            }
        };
        for bios in &self.bios {
            self.options
                .bios
                .push_choice(bios.description.clone(), bios.path.to_string_lossy().into_owned());
        }
        tracing::info!("Found {} BIOS image(s)", self.bios.len());

        if !self.options.set_variables(env.as_ref()) {
            tracing::warn!("Frontend rejected the core options");
        }
        if !env.set_disk_control() {
            tracing::debug!("Frontend has no disk control interface");
        }

        self.state = CoreState::Initialized;
        Ok(())
    }

    /// Boot `media` (disc image or executable), or the BIOS browser when
    /// `None`. No session exists after any error.
    pub fn load_game(&mut self, media: Option<&Path>) -> std::result::Result<(), LoadError> {
        match self.state {
            CoreState::Uninitialized => return Err(LoadError::NotInitialized),
            CoreState::GameLoaded | CoreState::Running => return Err(LoadError::AlreadyLoaded),
            CoreState::Initialized => {}
        }
        let env = self.env().ok_or(LoadError::NotInitialized)?;

        if !self.options.bios.has_choices() {
            let dir = self.bios_dir.clone().unwrap_or_default();
            tracing::error!("Could not find any valid PS2 BIOS file in {}", dir.display());
            return Err(LoadError::NoBios(dir));
        }

        let media = match media {
            Some(path) => {
                let kind = probe_media(path).map_err(|source| LoadError::MediaUnreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some((path, kind))
            }
            None => None,
        };

        self.options.check_variables(env.as_ref());
        self.options.renderer.update_and_lock(env.as_ref());
        let renderer = self.options.renderer();
        let bios = PathBuf::from(self.options.bios.get());

        let plan = plan_boot(media, *self.options.fast_boot.get());
        self.config.bios = bios.clone();
        plan.apply(&mut self.config);
        apply_host_pacing(&mut self.config);
        self.apply_frame_options();

        self.input.init();
        self.audio.init();

        let requested = resolve_context_kind(renderer, env.as_ref());
        let Some(context) = negotiate(env.as_ref(), requested) else {
            self.options.renderer.unlock();
            return Err(LoadError::ContextNegotiation(requested.to_string()));
        };
        self.gs.set_context(Some(context));

        let request = BootRequest {
            mode: plan.mode,
            media: plan.media.clone(),
            config: self.config.clone(),
        };
        if let Err(e) = self.machine.execute(&request) {
            tracing::error!("Failed to start the machine: {}", e);
            self.abort_load();
            return Err(e);
        }

        // A hardware context opens the worker from the frontend's
        // context_reset; without one nothing else will.
        if context.kind == HwContextKind::None {
            if let Err(e) = self.gs.open() {
                tracing::error!("Failed to open GS worker: {}", e);
                self.machine.shutdown();
                self.abort_load();
                return Err(LoadError::Machine(e.to_string()));
            }
        }

        let config_path = EmuConfig::config_path(env.save_directory().as_deref());
        if let Err(e) = self.config.save_to(&config_path) {
            tracing::warn!("Failed to write {}: {}", config_path.display(), e);
        }

        {
            let mut disks = self.disks.lock();
            match (plan.mode, &plan.media) {
                (BootMode::Disc, Some(path)) => disks.insert_initial(&path.to_string_lossy()),
                _ => disks.clear(),
            }
        }

        tracing::info!(
            "Loaded {:?} boot ({}) with {} context, BOOT2 injection {}",
            plan.mode,
            plan.media.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "no media".to_string()),
            context.kind,
            if plan.boot2_injection { "on" } else { "off" }
        );

        self.session = Some(Session {
            bios,
            boot_mode: plan.mode,
            boot2_injection: plan.boot2_injection,
            media: plan.media,
            renderer,
            context,
        });
        self.state = CoreState::GameLoaded;
        Ok(())
    }

    fn abort_load(&mut self) {
        self.gs.set_context(None);
        self.options.renderer.unlock();
    }

    /// One frontend tick
    pub fn run(&mut self) {
        if self.session.is_none() {
            tracing::warn!("run called without a loaded game");
            return;
        }
        let Some(env) = self.env() else {
            return;
        };

        self.options.check_variables(env.as_ref());
        let params = self.apply_frame_options();

        if let Some(source) = &self.input_source {
            self.input.update(source.as_ref());
        }

        if self.options.upscale_multiplier.take_updated() {
            let info = self.system_av_info();
            tracing::info!(
                "Output scale changed, announcing {}x{}",
                info.geometry.base_width,
                info.geometry.base_height
            );
            if !env.set_system_av_info(&info) {
                tracing::warn!("Frontend rejected the new geometry");
            }
        }

        self.events.process_pending();

        match self.gs.execute_frame(params) {
            Ok(FrameStatus::Complete(output)) => self.present(output),
            Ok(FrameStatus::Yielded) => {
                tracing::trace!("GS frame yielded");
                self.duplicate();
            }
            Err(GsError::NotOpen) => {
                tracing::trace!("GS worker not open, duplicating frame");
                self.duplicate();
            }
            Err(e) => {
                tracing::error!("GS frame failed: {}", e);
                self.duplicate();
            }
        }

        self.audio.flush();
        self.state = CoreState::Running;
    }

    fn present(&mut self, output: FrameOutput) {
        let Some(video) = &self.video else {
            return;
        };
        match output {
            FrameOutput::Hardware { width, height } => {
                self.last_frame = (width, height);
                video.present_hardware(width, height);
            }
            FrameOutput::Software { pixels, width, height } => {
                self.last_frame = (width, height);
                video.present_software(&pixels, width, height);
            }
            FrameOutput::Skipped => video.duplicate(self.last_frame.0, self.last_frame.1),
        }
    }

    fn duplicate(&self) {
        if let Some(video) = &self.video {
            video.duplicate(self.last_frame.0, self.last_frame.1);
        }
    }

    /// Copy the frame-skip options into the config and the worker parameters
    fn apply_frame_options(&mut self) -> FrameParams {
        let params = FrameParams {
            skip_enabled: *self.options.frameskip.get(),
            frames_to_draw: (*self.options.frames_to_draw.get()).max(1) as u32,
            frames_to_skip: (*self.options.frames_to_skip.get()).max(1) as u32,
        };
        self.config.gs.frame_skip_enable = params.skip_enabled;
        self.config.gs.frames_to_skip = params.frames_to_skip;
        params
    }

    /// Drain the in-flight frame, then soft-reset the machine
    pub fn reset(&mut self) {
        if self.session.is_none() {
            return;
        }
        tracing::info!("Resetting");
        if let Err(e) = self.gs.finish() {
            tracing::debug!("No frame to drain before reset: {}", e);
        }
        self.machine.reset_quick();
    }

    /// Tear the session down with the same drain protocol as a context
    /// destroy, then stop the machine
    pub fn unload_game(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        tracing::info!("Unloading {:?} session", session.boot_mode);

        self.gs.teardown();
        self.gs.set_context(None);
        self.machine.shutdown();
        self.audio.clear();
        self.disks.lock().clear();
        self.options.renderer.unlock();
        self.state = CoreState::Initialized;
    }

    /// Release everything. Helper threads are cancelled before shared
    /// state goes away.
    pub fn deinit(&mut self) {
        if self.state == CoreState::Uninitialized {
            return;
        }
        self.unload_game();
        self.machine.cancel_helpers();
        self.machine.cleanup_on_exit();
        tracing::info!("Core deinitialized");
        logging::shutdown_logging();
        self.state = CoreState::Uninitialized;
    }

    /// Geometry and timing for the current renderer and output scale
    pub fn system_av_info(&self) -> SystemAvInfo {
        let renderer = self
            .session
            .as_ref()
            .map(|s| s.renderer)
            .unwrap_or_else(|| self.options.renderer());
        let scale = if renderer.is_native_only() {
            1
        } else {
            (*self.options.upscale_multiplier.get()).max(1) as u32
        };

        let width = NATIVE_WIDTH * scale;
        let height = NATIVE_HEIGHT * scale;
        SystemAvInfo {
            geometry: GameGeometry {
                base_width: width,
                base_height: height,
                max_width: width,
                max_height: height,
                aspect_ratio: 4.0 / 3.0,
            },
            timing: SystemTiming {
                fps: match self.region() {
                    Region::Ntsc => NTSC_FPS,
                    Region::Pal => PAL_FPS,
                },
                sample_rate: SAMPLE_RATE,
            },
        }
    }

    pub fn system_info(&self) -> SystemInfo {
        SYSTEM_INFO
    }

    pub fn region(&self) -> Region {
        Region::Ntsc
    }

    /// Multi-file loading is not supported
    pub fn load_game_special(&mut self, game_type: u32) -> bool {
        tracing::debug!("load_game_special({}) is not supported", game_type);
        false
    }

    /// Save states are not supported
    pub fn serialize_size(&self) -> usize {
        0
    }

    pub fn serialize(&self, _data: &mut [u8]) -> bool {
        false
    }

    pub fn unserialize(&mut self, _data: &[u8]) -> bool {
        false
    }

    pub fn memory_size(&self, _id: u32) -> usize {
        0
    }

    pub fn cheat_reset(&mut self) {}

    pub fn cheat_set(&mut self, index: u32, enabled: bool, code: &str) {
        tracing::debug!("Ignoring cheat {} ({}): {}", index, enabled, code);
    }
}

impl Drop for CoreRunner {
    fn drop(&mut self) {
        self.deinit();
    }
}

/// Context kind to ask for. The frontend's preference is only consulted
/// for `Auto`.
pub fn resolve_context_kind(renderer: Renderer, env: &dyn Environment) -> HwContextKind {
    match renderer {
        Renderer::Auto => env.preferred_hw_render().unwrap_or(HwContextKind::OpenGl),
        Renderer::D3D11 => HwContextKind::Direct3D,
        Renderer::Null => HwContextKind::None,
        Renderer::OpenGl | Renderer::Software => HwContextKind::OpenGl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lr_core::{HwRenderRequest, LogSink, VariableDescriptor};

    struct PreferEnv(Option<HwContextKind>);

    impl Environment for PreferEnv {
        fn set_pixel_format(&self, _format: PixelFormat) -> bool {
            true
        }
        fn log_interface(&self) -> Option<Arc<dyn LogSink>> {
            None
        }
        fn system_directory(&self) -> Option<PathBuf> {
            None
        }
        fn save_directory(&self) -> Option<PathBuf> {
            None
        }
        fn set_hw_render(&self, _request: &HwRenderRequest) -> bool {
            true
        }
        fn preferred_hw_render(&self) -> Option<HwContextKind> {
            self.0
        }
        fn set_variables(&self, _variables: &[VariableDescriptor]) -> bool {
            true
        }
        fn get_variable(&self, _key: &str) -> Option<String> {
            None
        }
        fn set_system_av_info(&self, _info: &SystemAvInfo) -> bool {
            true
        }
        fn set_disk_control(&self) -> bool {
            false
        }
        fn set_support_no_game(&self, _supported: bool) -> bool {
            true
        }
    }

    #[test]
    fn test_preferred_context_only_for_auto() {
        let env = PreferEnv(Some(HwContextKind::Vulkan));
        assert_eq!(resolve_context_kind(Renderer::Auto, &env), HwContextKind::Vulkan);
        assert_eq!(resolve_context_kind(Renderer::OpenGl, &env), HwContextKind::OpenGl);
        assert_eq!(resolve_context_kind(Renderer::Null, &env), HwContextKind::None);
        assert_eq!(resolve_context_kind(Renderer::D3D11, &env), HwContextKind::Direct3D);
        assert_eq!(resolve_context_kind(Renderer::Software, &env), HwContextKind::OpenGl);

        let env = PreferEnv(None);
        assert_eq!(resolve_context_kind(Renderer::Auto, &env), HwContextKind::OpenGl);
    }

    #[test]
    fn test_system_info() {
        assert_eq!(SYSTEM_INFO.library_name, c"pcsx2 (alpha)");
        assert_eq!(SYSTEM_INFO.library_version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
        assert!(SYSTEM_INFO.need_fullpath);
        assert!(SYSTEM_INFO.block_extract);
    }

    #[test]
    fn test_inert_entry_points() {
        let mut runner = CoreRunner::new(
            Box::new(crate::null::NullMachine::new()),
            Box::new(lr_gs::NullBackend::new()),
        );
        assert_eq!(runner.serialize_size(), 0);
        assert!(!runner.serialize(&mut [0u8; 4]));
        assert!(!runner.unserialize(&[0u8; 4]));
        assert_eq!(runner.memory_size(0), 0);
        assert!(!runner.load_game_special(1));
        assert_eq!(runner.region(), Region::Ntsc);
        runner.cheat_reset();
        runner.cheat_set(0, true, "code");
    }

    #[test]
    fn test_load_before_init() {
        let mut runner = CoreRunner::new(
            Box::new(crate::null::NullMachine::new()),
            Box::new(lr_gs::NullBackend::new()),
        );
        assert!(matches!(runner.load_game(None), Err(LoadError::NotInitialized)));
    }
}
