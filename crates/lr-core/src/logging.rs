//! Logging bridge
//!
//! Every crate logs through `tracing`. This module installs a subscriber
//! layer that forwards formatted events to the frontend's log interface.
//! The subscriber is installed once per process; re-initialising the core
//! only swaps the sink it writes to.

use crate::host::{LogLevel, LogSink};
use parking_lot::RwLock;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Process-wide sink the layer forwards to
static HOST_SINK: RwLock<Option<Arc<dyn LogSink>>> = parking_lot::const_rwlock(None);

/// Map a tracing level to the host's severity
pub fn host_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        Level::DEBUG | Level::TRACE => LogLevel::Debug,
    }
}

/// Layer forwarding events to the installed host sink
#[derive(Debug, Default)]
pub struct HostLogLayer;

impl<S: Subscriber> Layer<S> for HostLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let sink = HOST_SINK.read().clone();
        let Some(sink) = sink else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        sink.log(host_level(event.metadata().level()), &visitor.finish());
    }
}

/// Renders `message` followed by `key=value` for the remaining fields
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(mut self) -> String {
        if !self.fields.is_empty() {
            if !self.message.is_empty() {
                self.message.push(' ');
            }
            self.message.push_str(&self.fields);
        }
        self.message.push('\n');
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }
}

/// Install the logging stack, or swap the sink if already installed.
///
/// With no host sink, events are written to stderr instead.
pub fn init_logging(sink: Option<Arc<dyn LogSink>>) {
    let has_sink = sink.is_some();
    *HOST_SINK.write() = sink;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = if has_sink {
        None
    } else {
        Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(HostLogLayer)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized (host sink: {})", has_sink);
    }
}

/// Detach the host sink; the frontend's callback must not be used after deinit
pub fn shutdown_logging() {
    *HOST_SINK.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl LogSink for RecordingSink {
        fn log(&self, level: LogLevel, message: &str) {
            self.lines.lock().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(host_level(&Level::ERROR), LogLevel::Error);
        assert_eq!(host_level(&Level::WARN), LogLevel::Warn);
        assert_eq!(host_level(&Level::INFO), LogLevel::Info);
        assert_eq!(host_level(&Level::DEBUG), LogLevel::Debug);
        assert_eq!(host_level(&Level::TRACE), LogLevel::Debug);
    }

    #[test]
    fn test_layer_forwards_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        *HOST_SINK.write() = Some(sink.clone());

        let subscriber = tracing_subscriber::registry().with(HostLogLayer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(slot = 3, "disk slot empty");
        });
        shutdown_logging();

        let lines = sink.lines.lock();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, LogLevel::Warn);
        assert_eq!(lines[0].1, "disk slot empty slot=3\n");
    }
}
