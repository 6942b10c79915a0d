//! Boot planning
//!
//! Decides how the machine boots from the supplied media and the fast-boot
//! option, and writes the decision into the emulator configuration.

use crate::machine::BootMode;
use lr_core::config::{CdvdSource, VsyncMode};
use lr_core::EmuConfig;
use lr_vfs::MediaKind;
use std::path::{Path, PathBuf};

/// Outcome of boot planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootPlan {
    pub mode: BootMode,
    /// Skip the BIOS and inject BOOT2 directly
    pub boot2_injection: bool,
    pub media: Option<PathBuf>,
}

/// An executable always boots through BOOT2 injection. A disc (or no
/// media at all) honours the fast-boot option.
pub fn plan_boot(media: Option<(&Path, MediaKind)>, fast_boot: bool) -> BootPlan {
    match media {
        Some((path, MediaKind::Elf)) => BootPlan {
            mode: BootMode::Elf,
            boot2_injection: true,
            media: Some(path.to_path_buf()),
        },
        Some((path, MediaKind::Disc)) => BootPlan {
            mode: BootMode::Disc,
            boot2_injection: fast_boot,
            media: Some(path.to_path_buf()),
        },
        None => BootPlan {
            mode: BootMode::NoDisc,
            boot2_injection: fast_boot,
            media: None,
        },
    }
}

impl BootPlan {
    /// Write the plan into `config`, clearing what a previous boot left
    pub fn apply(&self, config: &mut EmuConfig) {
        config.use_boot2_injection = self.boot2_injection;
        config.current_irx = None;
        config.elf_override = None;
        config.current_iso = None;

        match self.mode {
            BootMode::Elf => {
                config.cdvd_source = CdvdSource::NoDisc;
                config.elf_override = self.media.clone();
            }
            BootMode::Disc => {
                config.cdvd_source = CdvdSource::Iso;
                config.current_iso = self.media.clone();
            }
            BootMode::NoDisc => {
                config.cdvd_source = CdvdSource::NoDisc;
            }
        }
    }
}

/// The frontend paces the machine: no vsync, no frame limiter, and
/// exactly one frame drawn per `run`.
pub fn apply_host_pacing(config: &mut EmuConfig) {
    config.gs.vsync = VsyncMode::Off;
    config.gs.frame_limit_enable = false;
    config.gs.frames_to_draw = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elf_forces_boot2() {
        for fast_boot in [false, true] {
            let plan = plan_boot(Some((Path::new("/games/demo.elf"), MediaKind::Elf)), fast_boot);
            assert_eq!(plan.mode, BootMode::Elf);
            assert!(plan.boot2_injection);
        }
    }

    #[test]
    fn test_disc_honours_fast_boot() {
        let path = Path::new("/games/game.iso");
        let slow = plan_boot(Some((path, MediaKind::Disc)), false);
        assert_eq!(slow.mode, BootMode::Disc);
        assert!(!slow.boot2_injection);

        let fast = plan_boot(Some((path, MediaKind::Disc)), true);
        assert!(fast.boot2_injection);
    }

    #[test]
    fn test_apply_to_config() {
        let mut config = EmuConfig::default();
        plan_boot(Some((Path::new("/games/demo.elf"), MediaKind::Elf)), false).apply(&mut config);
        assert_eq!(config.cdvd_source, CdvdSource::NoDisc);
        assert_eq!(config.elf_override, Some(PathBuf::from("/games/demo.elf")));
        assert!(config.use_boot2_injection);

        plan_boot(Some((Path::new("/games/game.iso"), MediaKind::Disc)), false).apply(&mut config);
        assert_eq!(config.cdvd_source, CdvdSource::Iso);
        assert_eq!(config.current_iso, Some(PathBuf::from("/games/game.iso")));
        assert!(config.elf_override.is_none());
        assert!(!config.use_boot2_injection);

        plan_boot(None, true).apply(&mut config);
        assert_eq!(config.cdvd_source, CdvdSource::NoDisc);
        assert!(config.current_iso.is_none());
    }

    #[test]
    fn test_host_pacing() {
        let mut config = EmuConfig::default();
        config.gs.vsync = VsyncMode::On;
        config.gs.frames_to_draw = 3;
        apply_host_pacing(&mut config);
        assert_eq!(config.gs.vsync, VsyncMode::Off);
        assert!(!config.gs.frame_limit_enable);
        assert_eq!(config.gs.frames_to_draw, 1);
    }
}
