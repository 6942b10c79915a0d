//! Media handling for the PS2 libretro bridge
//!
//! Disk image bookkeeping for the frontend's disk-control interface,
//! BIOS discovery and media classification.

pub mod bios;
pub mod disc;
pub mod media;

pub use bios::{scan_bios_dir, BiosInfo};
pub use disc::DiskImageDirectory;
pub use media::{probe_media, MediaKind, ELF_MAGIC};
