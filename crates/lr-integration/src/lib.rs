//! Session lifecycle and tick driver for the PS2 libretro bridge
//!
//! This crate ties the GS worker, sample sink, input relay and disk image
//! directory to the emulated machine, and exposes one entry point per
//! frontend call through [`CoreRunner`].

pub mod boot;
pub mod machine;
pub mod null;
pub mod runner;
pub mod session;

pub use boot::{apply_host_pacing, plan_boot, BootPlan};
pub use machine::{BootMode, BootRequest, EmulationControl, MachineLinks};
pub use null::NullMachine;
pub use runner::{resolve_context_kind, CoreRunner, CoreState, SystemInfo, SYSTEM_INFO};
pub use session::Session;
