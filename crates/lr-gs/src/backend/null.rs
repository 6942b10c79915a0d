//! Null backend
//!
//! Produces a black frame each call. With a hardware context the frame is
//! reported as drawn into the host framebuffer; without one a black
//! software frame is handed back.

use super::{FrameOutput, FrameStatus, GsBackend};
use lr_core::{GsError, HwContextKind, HwRenderRequest};

/// Native PS2 output size
pub const NATIVE_WIDTH: u32 = 640;
pub const NATIVE_HEIGHT: u32 = 448;

/// Null GS backend for headless runs and tests
pub struct NullBackend {
    width: u32,
    height: u32,
    context: Option<HwRenderRequest>,
    frame_count: u64,
    skipped_count: u64,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            width: NATIVE_WIDTH,
            height: NATIVE_HEIGHT,
            context: None,
            frame_count: 0,
            skipped_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GsBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn open(&mut self, context: &HwRenderRequest) -> Result<(), GsError> {
        tracing::debug!("NullBackend: open with {} context", context.kind);
        self.context = Some(*context);
        Ok(())
    }

    fn close(&mut self) {
        tracing::debug!("NullBackend: close");
        self.context = None;
    }

    fn execute_frame(&mut self) -> FrameStatus {
        self.frame_count += 1;
        let output = match self.context.map(|c| c.kind) {
            Some(HwContextKind::None) | None => FrameOutput::Software {
                pixels: vec![0; (self.width * self.height) as usize],
                width: self.width,
                height: self.height,
            },
            Some(_) => FrameOutput::Hardware {
                width: self.width,
                height: self.height,
            },
        };
        FrameStatus::Complete(output)
    }

    fn skip_frame(&mut self) {
        self.skipped_count += 1;
    }

    fn finish(&mut self) {}
}
