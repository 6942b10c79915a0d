//! GS worker thread
//!
//! The worker thread is the only place backend (GPU) calls are made. It is
//! spawned by [`GsWorker::open`] and joined by [`GsWorker::close`]. Every
//! request is a synchronous handshake over a pair of rendezvous channels:
//! the caller sends one request and blocks on the reply, so at most one
//! frame is ever in flight.

use crate::backend::{FrameOutput, FrameStatus, GsBackend};
use crate::frameskip::{FrameParams, FrameSkipper};
use crossbeam::channel::{self, Receiver, Sender};
use lr_core::{GsError, HwRenderRequest};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No thread, no context resources
    Closed,
    /// Thread running, context resources bound, no frame executed yet
    Open,
    /// Last frame completed
    Running,
    /// Last frame stopped at a yield point and is still in flight
    Suspended,
}

enum Request {
    Execute(FrameParams),
    Finish,
    Close,
}

enum Reply {
    Opened(Result<(), GsError>),
    Frame(FrameStatus),
    Finished,
}

/// Backend storage shared with the thread. The thread takes the backend
/// on start and puts it back on exit.
type BackendSlot = Arc<Mutex<Option<Box<dyn GsBackend>>>>;

struct WorkerThread {
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    handle: JoinHandle<()>,
}

impl WorkerThread {
    fn call(&self, request: Request) -> Option<Reply> {
        self.requests.send(request).ok()?;
        self.replies.recv().ok()
    }

    fn join(self) {
        drop(self.requests);
        if self.handle.join().is_err() {
            tracing::error!("GS worker thread panicked");
        }
    }
}

fn worker_main(slot: BackendSlot, context: HwRenderRequest, requests: Receiver<Request>, replies: Sender<Reply>) {
    let Some(mut backend) = slot.lock().take() else {
        let _ = replies.send(Reply::Opened(Err(GsError::Backend("no backend installed".to_string()))));
        return;
    };

    if let Err(e) = backend.open(&context) {
        *slot.lock() = Some(backend);
        let _ = replies.send(Reply::Opened(Err(e)));
        return;
    }
    let _ = replies.send(Reply::Opened(Ok(())));

    let mut skipper = FrameSkipper::new();
    let mut resuming = false;
    for request in requests.iter() {
        let reply = match request {
            Request::Execute(params) => {
                // A suspended frame is resumed, never re-scheduled
                let status = if !resuming && !skipper.should_draw(params) {
                    backend.skip_frame();
                    FrameStatus::Complete(FrameOutput::Skipped)
                } else {
                    backend.execute_frame()
                };
                resuming = status == FrameStatus::Yielded;
                Reply::Frame(status)
            }
            Request::Finish => {
                backend.finish();
                resuming = false;
                Reply::Finished
            }
            Request::Close => break,
        };
        if replies.send(reply).is_err() {
            break;
        }
    }

    if resuming {
        backend.finish();
    }
    backend.close();
    *slot.lock() = Some(backend);
}

/// Owner of the GS worker thread and its backend
pub struct GsWorker {
    backend: BackendSlot,
    thread: Option<WorkerThread>,
    state: WorkerState,
    /// Context the worker is currently bound to
    context: Option<HwRenderRequest>,
    frames_completed: u64,
}

impl GsWorker {
    pub fn new(backend: Box<dyn GsBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Some(backend))),
            thread: None,
            state: WorkerState::Closed,
            context: None,
            frames_completed: 0,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != WorkerState::Closed
    }

    /// Frames started but not yet completed
    pub fn in_flight(&self) -> usize {
        usize::from(self.state == WorkerState::Suspended)
    }

    pub fn context(&self) -> Option<HwRenderRequest> {
        self.context
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// Swap the backend. Only allowed while closed.
    pub fn set_backend(&mut self, backend: Box<dyn GsBackend>) -> Result<(), GsError> {
        if self.is_open() {
            return Err(GsError::AlreadyOpen);
        }
        *self.backend.lock() = Some(backend);
        Ok(())
    }

    /// Spawn the worker and bind the backend to `context`
    pub fn open(&mut self, context: HwRenderRequest) -> Result<(), GsError> {
        if self.is_open() {
            return Err(GsError::AlreadyOpen);
        }

        let (request_tx, request_rx) = channel::bounded(0);
        let (reply_tx, reply_rx) = channel::bounded(0);
        let slot = self.backend.clone();
        let handle = thread::Builder::new()
            .name("gs-worker".to_string())
            .spawn(move || worker_main(slot, context, request_rx, reply_tx))
            .map_err(GsError::Spawn)?;

        let thread = WorkerThread {
            requests: request_tx,
            replies: reply_rx,
            handle,
        };
        let opened = match thread.replies.recv() {
            Ok(Reply::Opened(result)) => result,
            _ => Err(GsError::WorkerGone),
        };
        if let Err(e) = opened {
            tracing::error!("GS worker failed to open: {}", e);
            thread.join();
            return Err(e);
        }

        tracing::info!("GS worker open ({} context)", context.kind);
        self.thread = Some(thread);
        self.context = Some(context);
        self.state = WorkerState::Open;
        Ok(())
    }

    /// Run one frame on the worker, blocking until it completes or yields
    pub fn execute_frame(&mut self, params: FrameParams) -> Result<FrameStatus, GsError> {
        let reply = match (&self.thread, self.state) {
            (Some(thread), state) if state != WorkerState::Closed => thread.call(Request::Execute(params)),
            _ => return Err(GsError::NotOpen),
        };

        let Some(Reply::Frame(status)) = reply else {
            self.abandon();
            return Err(GsError::WorkerGone);
        };

        if status == FrameStatus::Yielded {
            tracing::trace!("GS frame yielded");
            self.state = WorkerState::Suspended;
        } else {
            self.frames_completed += 1;
            self.state = WorkerState::Running;
        }
        Ok(status)
    }

    /// Drain barrier: wait until the worker has no partially executed
    /// frame. A closed worker has nothing to drain.
    pub fn finish_in_thread(&mut self) -> Result<(), GsError> {
        let Some(thread) = &self.thread else {
            return Ok(());
        };

        match thread.call(Request::Finish) {
            Some(Reply::Finished) => {
                if self.state == WorkerState::Suspended {
                    self.frames_completed += 1;
                    self.state = WorkerState::Running;
                }
                Ok(())
            }
            _ => {
                self.abandon();
                Err(GsError::WorkerGone)
            }
        }
    }

    /// Release context resources and join the thread. Idempotent.
    pub fn close(&mut self) {
        let Some(thread) = self.thread.take() else {
            self.state = WorkerState::Closed;
            return;
        };

        let _ = thread.requests.send(Request::Close);
        thread.join();
        self.state = WorkerState::Closed;
        self.context = None;
        tracing::info!("GS worker closed");
    }

    /// The thread stopped answering; join what is left of it
    fn abandon(&mut self) {
        tracing::error!("GS worker stopped responding");
        if let Some(thread) = self.thread.take() {
            thread.join();
        }
        self.state = WorkerState::Closed;
        self.context = None;
    }
}

impl Drop for GsWorker {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::null::NullBackend;
    use crate::context::request_for;
    use lr_core::HwContextKind;

    /// Yields every other call, counts finishes
    struct YieldingBackend {
        calls: u32,
        finishes: Arc<Mutex<u32>>,
    }

    impl GsBackend for YieldingBackend {
        fn name(&self) -> &str {
            "yielding"
        }
        fn open(&mut self, _context: &HwRenderRequest) -> Result<(), GsError> {
            Ok(())
        }
        fn close(&mut self) {}
        fn execute_frame(&mut self) -> FrameStatus {
            self.calls += 1;
            if self.calls % 2 == 1 {
                FrameStatus::Yielded
            } else {
                FrameStatus::Complete(FrameOutput::Hardware { width: 640, height: 448 })
            }
        }
        fn skip_frame(&mut self) {}
        fn finish(&mut self) {
            *self.finishes.lock() += 1;
        }
    }

    /// Refuses the first open
    struct FlakyBackend {
        attempts: u32,
    }

    impl GsBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }
        fn open(&mut self, _context: &HwRenderRequest) -> Result<(), GsError> {
            self.attempts += 1;
            if self.attempts == 1 {
                Err(GsError::Backend("device lost".to_string()))
            } else {
                Ok(())
            }
        }
        fn close(&mut self) {}
        fn execute_frame(&mut self) -> FrameStatus {
            FrameStatus::Complete(FrameOutput::Skipped)
        }
        fn skip_frame(&mut self) {}
        fn finish(&mut self) {}
    }

    fn gl() -> HwRenderRequest {
        request_for(HwContextKind::OpenGlCore)
    }

    #[test]
    fn test_open_execute_close() {
        let mut worker = GsWorker::new(Box::new(NullBackend::new()));
        assert_eq!(worker.state(), WorkerState::Closed);

        worker.open(gl()).unwrap();
        assert_eq!(worker.state(), WorkerState::Open);
        assert_eq!(worker.context().map(|c| c.kind), Some(HwContextKind::OpenGlCore));

        let status = worker.execute_frame(FrameParams::default()).unwrap();
        assert_eq!(status, FrameStatus::Complete(FrameOutput::Hardware { width: 640, height: 448 }));
        assert_eq!(worker.state(), WorkerState::Running);
        assert_eq!(worker.frames_completed(), 1);

        worker.close();
        assert_eq!(worker.state(), WorkerState::Closed);
        assert!(worker.context().is_none());
        worker.close();
    }

    #[test]
    fn test_execute_requires_open() {
        let mut worker = GsWorker::new(Box::new(NullBackend::new()));
        assert!(matches!(
            worker.execute_frame(FrameParams::default()),
            Err(GsError::NotOpen)
        ));
    }

    #[test]
    fn test_open_twice_fails() {
        let mut worker = GsWorker::new(Box::new(NullBackend::new()));
        worker.open(gl()).unwrap();
        assert!(matches!(worker.open(gl()), Err(GsError::AlreadyOpen)));
        assert!(worker.set_backend(Box::new(NullBackend::new())).is_err());
    }

    #[test]
    fn test_reopen_after_close() {
        let mut worker = GsWorker::new(Box::new(NullBackend::new()));
        for _ in 0..3 {
            worker.open(gl()).unwrap();
            worker.execute_frame(FrameParams::default()).unwrap();
            worker.close();
        }
        assert_eq!(worker.frames_completed(), 3);
    }

    #[test]
    fn test_yield_then_resume() {
        let finishes = Arc::new(Mutex::new(0));
        let mut worker = GsWorker::new(Box::new(YieldingBackend {
            calls: 0,
            finishes: finishes.clone(),
        }));
        worker.open(gl()).unwrap();

        assert_eq!(worker.execute_frame(FrameParams::default()).unwrap(), FrameStatus::Yielded);
        assert_eq!(worker.state(), WorkerState::Suspended);
        assert_eq!(worker.in_flight(), 1);

        // Resuming finishes the same frame
        assert!(matches!(
            worker.execute_frame(FrameParams::default()).unwrap(),
            FrameStatus::Complete(_)
        ));
        assert_eq!(worker.state(), WorkerState::Running);
        assert_eq!(worker.in_flight(), 0);
        assert_eq!(worker.frames_completed(), 1);
    }

    #[test]
    fn test_finish_drains_suspended_frame() {
        let finishes = Arc::new(Mutex::new(0));
        let mut worker = GsWorker::new(Box::new(YieldingBackend {
            calls: 0,
            finishes: finishes.clone(),
        }));
        worker.open(gl()).unwrap();
        worker.execute_frame(FrameParams::default()).unwrap();
        assert_eq!(worker.in_flight(), 1);

        worker.finish_in_thread().unwrap();
        assert_eq!(worker.in_flight(), 0);
        assert_eq!(worker.state(), WorkerState::Running);
        assert_eq!(*finishes.lock(), 1);

        worker.close();
        // Nothing left to finish at close
        assert_eq!(*finishes.lock(), 1);
    }

    #[test]
    fn test_frame_skip_on_worker() {
        let mut worker = GsWorker::new(Box::new(NullBackend::new()));
        worker.open(request_for(HwContextKind::OpenGl)).unwrap();
        let params = FrameParams {
            skip_enabled: true,
            frames_to_draw: 1,
            frames_to_skip: 2,
        };

        let skipped: Vec<bool> = (0..6)
            .map(|_| {
                worker.execute_frame(params).unwrap() == FrameStatus::Complete(FrameOutput::Skipped)
            })
            .collect();
        assert_eq!(skipped, vec![false, true, true, false, true, true]);
    }

    #[test]
    fn test_failed_open_keeps_backend() {
        let mut worker = GsWorker::new(Box::new(FlakyBackend { attempts: 0 }));
        assert!(matches!(worker.open(gl()), Err(GsError::Backend(_))));
        assert_eq!(worker.state(), WorkerState::Closed);

        // The backend came back from the thread and can be opened again
        worker.open(gl()).unwrap();
        assert_eq!(worker.state(), WorkerState::Open);
    }
}
