//! Pluggable event sinks.
//!
//! Sinks consume events from handles and process them
//! (collect in memory, log through `tracing`, render to a writer).

use std::io::Write;

use crate::events::{EventKind, SessionEvent};

/// Trait for event consumers.
///
/// Implement this to create custom diagnostic outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SessionEvent);

    /// Called when the owner is done emitting. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// A simple sink that collects events in a `Vec` for testing and inspection.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Collected events.
    pub events: Vec<SessionEvent>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains collected events.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::INFO)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SessionEvent) {
        macro_rules! log_at {
            ($lvl:expr) => {
                tracing::event!($lvl, source = %event.source, event = ?event.kind, "session_event")
            };
        }
        use tracing::Level;
        if self.level == Level::ERROR {
            log_at!(Level::ERROR);
        } else if self.level == Level::WARN {
            log_at!(Level::WARN);
        } else if self.level == Level::DEBUG {
            log_at!(Level::DEBUG);
        } else if self.level == Level::TRACE {
            log_at!(Level::TRACE);
        } else {
            log_at!(Level::INFO);
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Renders events as human-readable text.
///
/// Structural reports are printed as the level table; write failures are
/// kept in [`WriterSink::error`] instead of aborting the caller.
pub struct WriterSink<W: Write + Send> {
    writer: W,
    error: Option<std::io::Error>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// First write error, if any.
    pub fn error(&self) -> Option<&std::io::Error> {
        self.error.as_ref()
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render(&mut self, event: &SessionEvent) -> std::io::Result<()> {
        match &event.kind {
            EventKind::Built {
                engine,
                unknowns,
                nonzeros,
                setup_time,
            } => writeln!(
                self.writer,
                "{} built by {engine}: {unknowns} unknowns, {nonzeros} nonzeros ({:.3} ms)",
                event.source,
                setup_time * 1000.0
            ),
            EventKind::Report(report) => write!(self.writer, "{report}"),
            EventKind::Convergence(info) => writeln!(self.writer, "{}: {info}", event.source),
            EventKind::Destroyed => writeln!(self.writer, "{} destroyed", event.source),
        }
    }
}

impl WriterSink<std::io::Stdout> {
    /// Sink printing to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn handle(&mut self, event: &SessionEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.render(event) {
            self.error = Some(e);
        }
    }

    fn finalize(&mut self) {
        if self.error.is_none() {
            if let Err(e) = self.writer.flush() {
                self.error = Some(e);
            }
        }
    }

    fn name(&self) -> &str {
        "writer_sink"
    }
}
