//! Pending-event queue
//!
//! Emulator threads post deferred work here instead of touching frontend
//! state directly; the queue is only ever processed on the tick thread.
//! Context teardown calls [`PendingEvents::quiesce`] on both sides of
//! closing the graphics worker so no deferred call can reach a dead context.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A deferred unit of work
pub type PendingEvent = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe FIFO of deferred events
#[derive(Default)]
pub struct PendingEvents {
    queue: Mutex<VecDeque<PendingEvent>>,
}

impl std::fmt::Debug for PendingEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEvents")
            .field("pending", &self.queue.lock().len())
            .finish()
    }
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the tick thread
    pub fn post<F>(&self, event: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.lock().push_back(Box::new(event));
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    /// Run the events queued right now. Events posted while these run wait
    /// for the next call. Returns the number processed.
    pub fn process_pending(&self) -> usize {
        let batch: Vec<PendingEvent> = self.queue.lock().drain(..).collect();
        let count = batch.len();
        for event in batch {
            event();
        }
        count
    }

    /// Process until the queue is empty, including events posted by
    /// the events themselves. Returns the total processed.
    pub fn quiesce(&self) -> usize {
        let mut total = 0;
        while self.has_pending() {
            total += self.process_pending();
        }
        if total > 0 {
            tracing::trace!("Quiesced {} pending events", total);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_events_run_in_order() {
        let events = PendingEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            events.post(move || log.lock().push(i));
        }
        assert!(events.has_pending());
        assert_eq!(events.process_pending(), 3);
        assert!(!events.has_pending());
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_quiesce_drains_reposted_events() {
        let events = Arc::new(PendingEvents::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_events = events.clone();
        let inner_counter = counter.clone();
        events.post(move || {
            inner_counter.fetch_add(1, Ordering::SeqCst);
            let counter = inner_counter.clone();
            inner_events.post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(events.quiesce(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!events.has_pending());
    }

    #[test]
    fn test_quiesce_empty_queue() {
        let events = PendingEvents::new();
        assert_eq!(events.quiesce(), 0);
    }
}
