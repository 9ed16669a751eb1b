//! Pieces shared by the preconditioner and solver handles.

use std::time::Duration;

use amgkit_telemetry::{EventKind, EventSink, SessionEvent};
use amgkit_types::{AmgError, AmgResult};

/// A backend together with what was known when it was built.
pub(crate) struct Built<B: ?Sized> {
    pub backend: Box<B>,
    pub engine: String,
    pub unknowns: usize,
    pub nonzeros: usize,
    pub setup_time: Duration,
}

impl<B: ?Sized> Built<B> {
    pub fn built_event(&self) -> EventKind {
        EventKind::Built {
            engine: self.engine.clone(),
            unknowns: self.unknowns,
            nonzeros: self.nonzeros,
            setup_time: self.setup_time.as_secs_f64(),
        }
    }
}

/// Optional sink that sees lifecycle events as they happen.
#[derive(Default)]
pub(crate) struct Observer {
    sink: Option<Box<dyn EventSink>>,
}

impl Observer {
    pub fn attach(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.sink.replace(sink)
    }

    pub fn detach(&mut self) -> Option<Box<dyn EventSink>> {
        self.sink.take()
    }

    pub fn emit(&mut self, source: &str, kind: EventKind) {
        if let Some(sink) = self.sink.as_mut() {
            sink.handle(&SessionEvent::new(source, kind));
        }
    }

    pub fn finalize(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.finalize();
        }
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> AmgResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AmgError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
