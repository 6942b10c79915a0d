//! The loaded game session
//!
//! At most one session exists. It is created by a successful `load_game`
//! and dropped by `unload_game`.

use crate::machine::BootMode;
use lr_core::{HwContextKind, HwRenderRequest, Renderer};
use std::path::PathBuf;

/// One loaded virtual machine
#[derive(Debug, Clone)]
pub struct Session {
    /// BIOS image the machine booted with
    pub bios: PathBuf,
    pub boot_mode: BootMode,
    pub boot2_injection: bool,
    /// Disc image or executable
    pub media: Option<PathBuf>,
    /// Renderer locked at load
    pub renderer: Renderer,
    /// Context accepted by the frontend
    pub context: HwRenderRequest,
}

impl Session {
    /// Whether frames are drawn into a frontend hardware context
    pub fn is_hardware(&self) -> bool {
        self.context.kind != HwContextKind::None
    }
}
