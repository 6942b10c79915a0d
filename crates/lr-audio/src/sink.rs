//! Sample sink
//!
//! The SPU mixer produces 32-bit stereo frames at 48 kHz. Each frame is
//! scaled to 16 bits and handed to the frontend either one at a time
//! (the default) or accumulated into fixed-size batches.

use lr_core::AudioSink;
use parking_lot::Mutex;
use std::sync::Arc;

/// Stereo frames per batch delivery
pub const BATCH_FRAMES: usize = 0x100;

/// Mixer output scale: 32-bit mixer samples carry 12 fractional bits
const OUTPUT_SHIFT: u32 = 12;

/// One mixer output frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoOut32 {
    pub left: i32,
    pub right: i32,
}

impl StereoOut32 {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }
}

/// How frames reach the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One `sample` call per frame
    #[default]
    Direct,
    /// `sample_batch` every [`BATCH_FRAMES`] frames
    Batched,
}

/// Scale a mixer sample to 16 bits
pub fn to_s16(sample: i32) -> i16 {
    (sample >> OUTPUT_SHIFT).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

struct SinkState {
    output: Option<Arc<dyn AudioSink>>,
    /// Interleaved pending frames (batched mode only)
    pending: Vec<i16>,
}

/// Audio sink shared between the SPU thread and the tick thread
pub struct SampleSink {
    mode: DeliveryMode,
    state: Mutex<SinkState>,
}

impl SampleSink {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            state: Mutex::new(SinkState {
                output: None,
                pending: Vec::with_capacity(BATCH_FRAMES * 2),
            }),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Attach the frontend's audio callbacks
    pub fn set_output(&self, output: Arc<dyn AudioSink>) {
        self.state.lock().output = Some(output);
    }

    /// Reset the write position
    pub fn init(&self) {
        self.state.lock().pending.clear();
    }

    /// Drop buffered frames without delivering them
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.state.lock();
            let dropped = state.pending.len() / 2;
            state.pending.clear();
            dropped
        };
        if dropped > 0 {
            tracing::debug!("Dropped {} buffered audio frames", dropped);
        }
    }

    /// Deliver one mixer frame
    pub fn write(&self, frame: StereoOut32) {
        let left = to_s16(frame.left);
        let right = to_s16(frame.right);

        let mut state = self.state.lock();
        match self.mode {
            DeliveryMode::Direct => {
                if let Some(output) = &state.output {
                    output.sample(left, right);
                }
            }
            DeliveryMode::Batched => {
                state.pending.push(left);
                state.pending.push(right);
                if state.pending.len() == BATCH_FRAMES * 2 {
                    Self::deliver(&mut state);
                }
            }
        }
    }

    /// Deliver any partial batch. Called at the end of every tick.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if !state.pending.is_empty() {
            Self::deliver(&mut state);
        }
    }

    /// Frames waiting for the next batch delivery
    pub fn pending_frames(&self) -> usize {
        self.state.lock().pending.len() / 2
    }

    fn deliver(state: &mut SinkState) {
        if let Some(output) = &state.output {
            let frames = state.pending.len() / 2;
            let consumed = output.sample_batch(&state.pending);
            if consumed < frames {
                tracing::trace!("Frontend consumed {} of {} audio frames", consumed, frames);
            }
        }
        state.pending.clear();
    }
}

impl Default for SampleSink {
    fn default() -> Self {
        Self::new(DeliveryMode::Direct)
    }
}
