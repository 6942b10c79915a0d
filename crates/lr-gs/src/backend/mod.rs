//! GS rendering backends
//!
//! A backend is created on the tick thread but only ever driven from the
//! worker thread, which is why it must be `Send`.

pub mod null;

use lr_core::{GsError, HwRenderRequest};

/// What a completed frame produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutput {
    /// Drawn into the frontend's hardware framebuffer
    Hardware { width: u32, height: u32 },
    /// Drawn in software (XRGB8888, tightly packed)
    Software {
        pixels: Vec<u32>,
        width: u32,
        height: u32,
    },
    /// Nothing new was drawn
    Skipped,
}

/// Result of one `execute_frame` handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    Complete(FrameOutput),
    /// The worker stopped at a safe point before the frame was done. The
    /// next `execute_frame` resumes the same frame.
    Yielded,
}

/// GS backend trait
pub trait GsBackend: Send {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Bind GPU resources to a freshly created context
    fn open(&mut self, context: &HwRenderRequest) -> Result<(), GsError>;

    /// Release every resource bound to the current context
    fn close(&mut self);

    /// Run (or resume) one frame's worth of GS commands
    fn execute_frame(&mut self) -> FrameStatus;

    /// Account for a frame dropped by frame skipping
    fn skip_frame(&mut self);

    /// Complete any partially executed frame
    fn finish(&mut self);
}
