use std::{
    fmt,
    sync::{Arc, Mutex},
};

use crate::trace::backend::{Attribute, AttributeValue, SpanHandle, SpanStatus, Tracer};

/// Everything one span saw.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpanRecord {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(&'static str, AttributeValue)>,
    pub(crate) errors: Vec<String>,
    pub(crate) status: Option<SpanStatus>,
    pub(crate) ends: usize,
}

impl SpanRecord {
    pub(crate) fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Test tracer keeping every span in memory.
#[derive(Clone, Default)]
pub(crate) struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingTracer {
    pub(crate) fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().expect("spans lock").clone()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn SpanHandle> {
        let mut spans = self.spans.lock().expect("spans lock");
        spans.push(SpanRecord {
            name: name.to_string(),
            attributes: attributes.to_vec(),
            ..SpanRecord::default()
        });
        Box::new(RecordingSpan {
            spans: Arc::clone(&self.spans),
            idx: spans.len() - 1,
        })
    }
}

struct RecordingSpan {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    idx: usize,
}

impl RecordingSpan {
    fn with(&self, f: impl FnOnce(&mut SpanRecord)) {
        f(&mut self.spans.lock().expect("spans lock")[self.idx]);
    }
}

impl SpanHandle for RecordingSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        self.with(|r| r.attributes.push((key, value)));
    }

    fn record_error(&mut self, error: &dyn fmt::Display) {
        let msg = error.to_string();
        self.with(|r| r.errors.push(msg));
    }

    fn set_status(&mut self, status: SpanStatus) {
        self.with(|r| r.status = Some(status));
    }

    fn end(&mut self) {
        self.with(|r| r.ends += 1);
    }
}
