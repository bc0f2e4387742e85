//! In-memory trace sink
//!
//! Collects traces for inspection. Useful as a development default and
//! in tests; production exporters implement [`TraceSink`] against their
//! own transport.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kotoba::{ObservationData, TraceData, TraceHandle, TraceSink};

/// One collected trace with its spans
pub struct RecordedTrace {
    data: Mutex<TraceData>,
    spans: Mutex<Vec<ObservationData>>,
    ended: AtomicBool,
    updates: AtomicUsize,
}

impl RecordedTrace {
    fn new(data: TraceData) -> Self {
        Self {
            data: Mutex::new(data),
            spans: Mutex::new(Vec::new()),
            ended: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
        }
    }

    /// Spans attached so far
    pub fn spans(&self) -> Vec<ObservationData> {
        self.spans.lock().unwrap().clone()
    }

    /// Current trace-level data
    pub fn data(&self) -> TraceData {
        self.data.lock().unwrap().clone()
    }

    pub fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl TraceHandle for RecordedTrace {
    fn span(&self, observation: ObservationData) {
        self.spans.lock().unwrap().push(observation);
    }

    fn update(&self, data: TraceData) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut current = self.data.lock().unwrap();
        if data.name.is_some() {
            current.name = data.name;
        }
        if data.input.is_some() {
            current.input = data.input;
        }
        if data.output.is_some() {
            current.output = data.output;
        }
        if !data.tags.is_empty() {
            current.tags.extend(data.tags);
        }
        if data.metadata.is_some() {
            current.metadata = data.metadata;
        }
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// Trace sink that keeps everything in memory
#[derive(Default)]
pub struct InMemorySink {
    traces: Mutex<Vec<Arc<RecordedTrace>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All traces opened so far
    pub fn traces(&self) -> Vec<Arc<RecordedTrace>> {
        self.traces.lock().unwrap().clone()
    }
}

impl TraceSink for InMemorySink {
    fn begin_trace(&self, data: TraceData) -> Arc<dyn TraceHandle> {
        let trace = Arc::new(RecordedTrace::new(data));
        self.traces.lock().unwrap().push(trace.clone());
        trace
    }
}
