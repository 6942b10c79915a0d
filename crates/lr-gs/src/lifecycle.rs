//! Graphics worker lifecycle
//!
//! Couples the worker to the frontend's context events. Teardown is always
//! the same four steps: drain the in-flight frame on the worker, quiesce
//! pending events, close the worker, quiesce again. The worker lock is
//! released while events run so a deferred event may itself query the
//! worker.

use crate::backend::{FrameStatus, GsBackend};
use crate::frameskip::FrameParams;
use crate::worker::{GsWorker, WorkerState};
use lr_core::{GsError, HwRenderRequest, PendingEvents};
use parking_lot::Mutex;
use std::sync::Arc;

/// Worker plus the context description it is rebuilt against
pub struct GsLifecycle {
    worker: Mutex<GsWorker>,
    events: Arc<PendingEvents>,
    /// Negotiated context; survives `context_destroy`
    context: Mutex<Option<HwRenderRequest>>,
}

impl GsLifecycle {
    pub fn new(backend: Box<dyn GsBackend>, events: Arc<PendingEvents>) -> Self {
        Self {
            worker: Mutex::new(GsWorker::new(backend)),
            events,
            context: Mutex::new(None),
        }
    }

    pub fn events(&self) -> &Arc<PendingEvents> {
        &self.events
    }

    pub fn set_context(&self, context: Option<HwRenderRequest>) {
        *self.context.lock() = context;
    }

    pub fn context(&self) -> Option<HwRenderRequest> {
        *self.context.lock()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.lock().state()
    }

    pub fn in_flight(&self) -> usize {
        self.worker.lock().in_flight()
    }

    pub fn set_backend(&self, backend: Box<dyn GsBackend>) -> Result<(), GsError> {
        self.worker.lock().set_backend(backend)
    }

    /// Open the worker against the negotiated context. An already open
    /// worker is torn down first.
    pub fn open(&self) -> Result<(), GsError> {
        let context = self.context().ok_or_else(|| GsError::Backend("no context negotiated".to_string()))?;
        if self.worker.lock().is_open() {
            tracing::debug!("GS worker already open, rebuilding");
            self.teardown();
        }
        self.worker.lock().open(context)
    }

    /// Frontend created (or recreated) its context
    pub fn context_reset(&self) -> Result<(), GsError> {
        tracing::info!("Context reset");
        self.open()
    }

    /// Frontend is about to destroy its context
    pub fn context_destroy(&self) {
        tracing::info!("Context destroy");
        self.teardown();
    }

    /// Drain, quiesce, close, quiesce
    pub fn teardown(&self) {
        if let Err(e) = self.worker.lock().finish_in_thread() {
            tracing::warn!("GS drain failed: {}", e);
        }
        self.events.quiesce();
        self.worker.lock().close();
        self.events.quiesce();
    }

    pub fn execute_frame(&self, params: FrameParams) -> Result<FrameStatus, GsError> {
        self.worker.lock().execute_frame(params)
    }

    /// Drain barrier without closing
    pub fn finish(&self) -> Result<(), GsError> {
        self.worker.lock().finish_in_thread()
    }
}
