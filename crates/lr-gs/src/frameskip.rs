//! Frame skip scheduling
//!
//! With skipping enabled the worker draws `frames_to_draw` frames and then
//! drops `frames_to_skip`, repeating. Changing the parameters restarts the
//! cycle on a draw.

/// Frame skip parameters, re-read from the options every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub skip_enabled: bool,
    pub frames_to_draw: u32,
    pub frames_to_skip: u32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            skip_enabled: false,
            frames_to_draw: 1,
            frames_to_skip: 1,
        }
    }
}

/// Draw/skip cycle state
#[derive(Debug, Default)]
pub struct FrameSkipper {
    params: FrameParams,
    /// Position within the current draw+skip cycle
    position: u32,
}

impl FrameSkipper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> FrameParams {
        self.params
    }

    /// Decide whether the next frame is drawn
    pub fn should_draw(&mut self, params: FrameParams) -> bool {
        if params != self.params {
            self.params = params;
            self.position = 0;
        }
        if !params.skip_enabled {
            return true;
        }

        let draw = params.frames_to_draw.max(1);
        let cycle = draw + params.frames_to_skip;
        let drawn = self.position < draw;
        self.position = (self.position + 1) % cycle;
        drawn
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}
