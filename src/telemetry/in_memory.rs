//! In-memory telemetry collector for tests and local runs.

use parking_lot::Mutex;

use super::recorder::TelemetrySink;
use super::types::{BusinessEvent, DependencyRecord};

#[derive(Debug, Default)]
pub struct InMemoryTelemetrySink {
    name: String,
    events: Mutex<Vec<BusinessEvent>>,
    dependencies: Mutex<Vec<DependencyRecord>>,
    exceptions: Mutex<Vec<String>>,
}

impl InMemoryTelemetrySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<BusinessEvent> {
        self.events.lock().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<BusinessEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    pub fn dependencies(&self) -> Vec<DependencyRecord> {
        self.dependencies.lock().clone()
    }

    pub fn exceptions(&self) -> Vec<String> {
        self.exceptions.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.dependencies.lock().clear();
        self.exceptions.lock().clear();
    }
}

impl TelemetrySink for InMemoryTelemetrySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn track_event(&self, event: &BusinessEvent) {
        self.events.lock().push(event.clone());
    }

    fn track_dependency(&self, dependency: &DependencyRecord) {
        self.dependencies.lock().push(dependency.clone());
    }

    fn track_exception(&self, message: &str) {
        self.exceptions.lock().push(message.to_string());
    }
}
