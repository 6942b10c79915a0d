//! PS2 BIOS discovery
//!
//! A BIOS image starts with a ROMDIR table: 16-byte entries (`name[10]`,
//! `ext_info_size: u16`, `file_size: u32`, little endian) beginning with
//! `RESET` and terminated by an entry with an empty name. Files are laid
//! out back to back from offset 0, each padded to 16 bytes. The `ROMVER`
//! file holds `VVVVZTYYYYMMDD`: version, zone, console type and date.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Size of a ROMDIR entry
const ROMDIR_ENTRY_SIZE: usize = 16;

/// Images larger than this are not BIOS dumps
pub const MAX_BIOS_SIZE: u64 = 8 * 1024 * 1024;

/// Length of the ROMVER string
const ROMVER_LEN: usize = 14;

/// A recognized BIOS image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosInfo {
    pub path: PathBuf,
    /// Human-readable description shown as the option label
    pub description: String,
    /// Zone letter from ROMVER
    pub zone: char,
    /// Version as `major * 100 + minor`
    pub version: u32,
}

#[derive(Debug, Clone, Copy)]
struct RomDirEntry<'a> {
    name: &'a [u8],
    file_size: u32,
}

fn read_entry(data: &[u8], offset: usize) -> Option<RomDirEntry<'_>> {
    let raw = data.get(offset..offset + ROMDIR_ENTRY_SIZE)?;
    let name_len = raw[..10].iter().position(|&b| b == 0).unwrap_or(10);
    Some(RomDirEntry {
        name: &raw[..name_len],
        file_size: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
    })
}

fn zone_name(zone: char) -> String {
    match zone {
        'T' => "T10K".to_string(),
        'X' => "Test".to_string(),
        'J' => "Japan".to_string(),
        'A' => "USA".to_string(),
        'E' => "Europe".to_string(),
        'H' => "HK".to_string(),
        'P' => "Free".to_string(),
        'C' => "China".to_string(),
        other => other.to_string(),
    }
}

/// Locate the ROMVER file of a BIOS image and describe it.
/// Returns `None` for anything that is not a PS2 BIOS.
pub fn parse_bios(data: &[u8]) -> Option<(String, char, u32)> {
    let table = (0..data.len())
        .step_by(ROMDIR_ENTRY_SIZE)
        .find(|&offset| read_entry(data, offset).is_some_and(|e| e.name == b"RESET"))?;

    let mut file_offset = 0usize;
    let mut entry_offset = table;
    loop {
        let entry = read_entry(data, entry_offset)?;
        if entry.name.is_empty() {
            return None;
        }

        if entry.name == b"ROMVER" {
            let romver = data.get(file_offset..file_offset + ROMVER_LEN)?;
            return describe_romver(romver);
        }

        file_offset += (entry.file_size as usize + 0xF) & !0xF;
        entry_offset += ROMDIR_ENTRY_SIZE;
    }
}

fn describe_romver(romver: &[u8]) -> Option<(String, char, u32)> {
    if !romver.is_ascii() {
        return None;
    }
    let text = std::str::from_utf8(romver).ok()?;
    let version: u32 = text[0..4].parse().ok()?;
    let zone = romver[4] as char;
    let kind = match romver[5] {
        b'C' => "Console",
        b'D' => "Devel",
        _ => "",
    };

    let description = format!(
        "{:<7} v{}.{}({}/{}/{}) {}",
        zone_name(zone),
        &text[0..2],
        &text[2..4],
        &text[12..14],
        &text[10..12],
        &text[6..10],
        kind
    );
    Some((description.trim_end().to_string(), zone, version))
}

/// Probe a single file
pub fn probe_bios(path: &Path) -> Option<BiosInfo> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() || metadata.len() > MAX_BIOS_SIZE {
        return None;
    }

    let mut data = Vec::with_capacity(metadata.len() as usize);
    File::open(path).ok()?.read_to_end(&mut data).ok()?;

    let (description, zone, version) = parse_bios(&data)?;
    Some(BiosInfo {
        path: path.to_path_buf(),
        description,
        zone,
        version,
    })
}

/// Scan `dir` (non-recursively) for BIOS images, sorted by description.
/// A missing directory yields an empty list.
pub fn scan_bios_dir(dir: &Path) -> Vec<BiosInfo> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read BIOS directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<BiosInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| probe_bios(&entry.path()))
        .collect();
    found.sort_by(|a, b| a.description.cmp(&b.description).then_with(|| a.path.cmp(&b.path)));

    for bios in &found {
        tracing::info!("Found BIOS: {} ({})", bios.description, bios.path.display());
    }
    found
}
