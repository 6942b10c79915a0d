//! Disk image directory
//!
//! Backs the frontend's disk-control interface: an ordered list of media
//! slots plus a cursor. Slots are appended empty and filled in place, never
//! reordered or removed while a session runs. Every operation is O(1) so
//! it is safe to call while the emulator is paused mid-frame.

use std::path::Path;

/// Ordered collection of swappable media images
#[derive(Debug, Clone, Default)]
pub struct DiskImageDirectory {
    /// Image paths; `None` is an empty (ejected or never set) slot
    images: Vec<Option<String>>,
    /// Current image index; may point past the end
    index: u32,
    /// Tray state as last reported by the frontend
    ejected: bool,
}

impl DiskImageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tray state. Advisory only, always succeeds.
    pub fn set_eject_state(&mut self, ejected: bool) -> bool {
        tracing::debug!("Disk tray {}", if ejected { "opened" } else { "closed" });
        self.ejected = ejected;
        true
    }

    pub fn eject_state(&self) -> bool {
        self.ejected
    }

    pub fn current_index(&self) -> u32 {
        self.index
    }

    /// Store the cursor. Out-of-range values are accepted; lookups through
    /// them fail later.
    pub fn set_current_index(&mut self, index: u32) -> bool {
        self.index = index;
        true
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Overwrite slot `index`. Fails without mutating when out of range.
    pub fn replace(&mut self, index: u32, path: Option<&str>) -> bool {
        let Some(slot) = self.images.get_mut(index as usize) else {
            tracing::warn!("Disk replace: index {} out of range ({} images)", index, self.images.len());
            return false;
        };
        *slot = path.map(str::to_string);
        true
    }

    /// Grow by one empty slot
    pub fn append_empty(&mut self) -> bool {
        self.images.push(None);
        true
    }

    /// Restore the cursor saved by the frontend. An out-of-range index
    /// resets to 0 rather than failing.
    pub fn set_initial(&mut self, index: u32, path: &str) -> bool {
        let index = if index as usize >= self.images.len() { 0 } else { index };
        tracing::debug!("Disk initial image {} ({})", index, path);
        self.index = index;
        true
    }

    /// Path of slot `index`, or `None` if out of range or empty
    pub fn path_of(&self, index: u32) -> Option<&str> {
        self.images.get(index as usize)?.as_deref()
    }

    /// Display label of slot `index` (its file name)
    pub fn label_of(&self, index: u32) -> Option<String> {
        let path = self.path_of(index)?;
        let label = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        Some(label)
    }

    /// Start a session with `path` as the only image
    pub fn insert_initial(&mut self, path: &str) {
        self.images.clear();
        self.images.push(Some(path.to_string()));
        self.index = 0;
        self.ejected = false;
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.index = 0;
        self.ejected = false;
    }
}
