//! Cooperative helper threads
//!
//! Co-processor threads (e.g. the VU1 thread) must be stopped before the
//! state they share with the emulator is released. Cancellation is
//! cooperative: the thread polls its [`CancelToken`] and returns, and
//! [`HelperThread::cancel`] joins it.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cancellation flag shared with a helper thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// A named helper thread that can be cancelled and joined
#[derive(Debug)]
pub struct HelperThread {
    name: String,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl HelperThread {
    /// Spawn `body`, which must return once its token is cancelled
    pub fn spawn<F>(name: &str, body: F) -> io::Result<Self>
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        let token = CancelToken::default();
        let thread_token = token.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(thread_token))?;

        tracing::debug!("Helper thread '{}' started", name);
        Ok(Self {
            name: name.to_string(),
            token,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Request cancellation, then wait for the thread to exit. Idempotent.
    pub fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.token.cancel();
        if handle.join().is_err() {
            tracing::error!("Helper thread '{}' panicked", self.name);
        } else {
            tracing::debug!("Helper thread '{}' cancelled", self.name);
        }
    }
}

impl Drop for HelperThread {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_cancel_joins_thread() {
        let iterations = Arc::new(AtomicUsize::new(0));
        let counter = iterations.clone();
        let mut helper = HelperThread::spawn("vu1", move |token| {
            while !token.is_cancelled() {
                counter.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();

        assert_eq!(helper.name(), "vu1");
        thread::sleep(Duration::from_millis(5));
        helper.cancel();
        assert!(!helper.is_running());

        let after_cancel = iterations.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(iterations.load(Ordering::Relaxed), after_cancel);

        // Second cancel is a no-op
        helper.cancel();
    }
}
