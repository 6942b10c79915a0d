//! Media probing
//!
//! The loader only needs the first four bytes of the supplied media to
//! choose between booting an executable directly and inserting a disc.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// `\x7FELF` read as a little-endian word
pub const ELF_MAGIC: u32 = 0x464C_457F;

/// What the supplied media boots as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A PS2 executable, booted without a disc
    Elf,
    /// Anything else is treated as a disc image
    Disc,
}

impl MediaKind {
    pub fn from_magic(magic: u32) -> Self {
        if magic == ELF_MAGIC {
            Self::Elf
        } else {
            Self::Disc
        }
    }
}

/// Read the leading little-endian word of `path`.
///
/// Files shorter than four bytes read as 0. Failing to open or read the
/// file is an error.
pub fn peek_magic(path: &Path) -> io::Result<u32> {
    let mut head = Vec::with_capacity(4);
    File::open(path)?.take(4).read_to_end(&mut head)?;

    let Ok(bytes) = <[u8; 4]>::try_from(head.as_slice()) else {
        return Ok(0);
    };
    Ok(u32::from_le_bytes(bytes))
}

/// Probe `path` and classify it
pub fn probe_media(path: &Path) -> io::Result<MediaKind> {
    let magic = peek_magic(path)?;
    let kind = MediaKind::from_magic(magic);
    tracing::debug!("Media {} magic 0x{:08X} -> {:?}", path.display(), magic, kind);
    Ok(kind)
}
