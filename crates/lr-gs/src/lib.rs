//! Graphics Synthesizer worker for the PS2 libretro bridge
//!
//! This crate negotiates the hardware context with the frontend and owns
//! the worker thread that issues every GPU call.

pub mod backend;
pub mod context;
pub mod frameskip;
pub mod lifecycle;
pub mod worker;

pub use backend::{null::NullBackend, FrameOutput, FrameStatus, GsBackend};
pub use context::{fallback_chain, negotiate, request_for};
pub use frameskip::{FrameParams, FrameSkipper};
pub use lifecycle::GsLifecycle;
pub use worker::{GsWorker, WorkerState};
