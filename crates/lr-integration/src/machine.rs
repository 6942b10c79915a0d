//! Emulation-control collaborator
//!
//! The virtual machine itself (EE/IOP cores, SPU2, CDVD) lives behind
//! [`EmulationControl`]. The runner boots it, resets it and tears it down;
//! everything it needs from the frontend side arrives once through
//! [`MachineLinks`].

use lr_audio::SampleSink;
use lr_core::{EmuConfig, LoadError, PendingEvents};
use lr_input::InputRelay;
use std::path::PathBuf;
use std::sync::Arc;

/// How the virtual machine boots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Disc image in the drive
    Disc,
    /// Empty drive (BIOS browser)
    NoDisc,
    /// Executable injected directly, no disc
    Elf,
}

/// Everything the machine needs to start
#[derive(Debug, Clone)]
pub struct BootRequest {
    pub mode: BootMode,
    /// Disc image or executable, if any
    pub media: Option<PathBuf>,
    /// Configuration the machine boots with
    pub config: EmuConfig,
}

/// Shared frontend-side endpoints handed to the machine
#[derive(Clone)]
pub struct MachineLinks {
    /// Destination of SPU2 output
    pub audio: Arc<SampleSink>,
    /// Pad state latched once per tick
    pub input: Arc<InputRelay>,
    /// Deferred work, processed on the tick thread only
    pub events: Arc<PendingEvents>,
}

/// Control surface of the emulated console
pub trait EmulationControl: Send {
    /// Receive the shared endpoints. Called once, before any boot.
    fn attach(&mut self, links: MachineLinks);

    /// Boot the machine
    fn execute(&mut self, request: &BootRequest) -> Result<(), LoadError>;

    /// Soft reset, keeping media and configuration
    fn reset_quick(&mut self);

    /// Stop the running machine
    fn shutdown(&mut self);

    /// Cancel and join co-processor helper threads
    fn cancel_helpers(&mut self);

    /// Release everything at process teardown
    fn cleanup_on_exit(&mut self);
}
