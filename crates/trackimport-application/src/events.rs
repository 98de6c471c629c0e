// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use trackimport_domain::{ImportEvent, ImportEventKind};

/// Receiver of the progress events of a batch import.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &ImportEvent);
}

/// Keeps published import events in order until they are drained.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    events: Arc<Mutex<Vec<ImportEvent>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, Vec<ImportEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn kinds(&self) -> Vec<ImportEventKind> {
        self.events().iter().map(|event| event.payload.kind).collect()
    }

    /// Texts of the events of one kind, e.g. the accuracy of every
    /// received track list.
    pub fn texts(&self, kind: ImportEventKind) -> Vec<String> {
        self.events()
            .iter()
            .filter(|event| event.payload.kind == kind)
            .map(|event| event.payload.text.clone())
            .collect()
    }

    pub fn drain(&self) -> Vec<ImportEvent> {
        std::mem::take(&mut *self.events())
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: &ImportEvent) {
        self.events().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackimport_domain::BatchRunId;

    #[test]
    fn events_are_kept_until_drained() {
        let bus = InMemoryEventBus::new();
        assert!(bus.is_empty());

        let run_id = BatchRunId::new();
        bus.publish(&ImportEvent::import(run_id, ImportEventKind::Started, "All"));
        bus.publish(&ImportEvent::import(run_id, ImportEventKind::TrackListReceived, "Accuracy 80%"));
        bus.publish(&ImportEvent::import(run_id, ImportEventKind::Finished, ""));
        assert_eq!(bus.len(), 3);
        assert_eq!(
            bus.kinds(),
            vec![
                ImportEventKind::Started,
                ImportEventKind::TrackListReceived,
                ImportEventKind::Finished
            ]
        );
        assert_eq!(bus.texts(ImportEventKind::TrackListReceived), vec!["Accuracy 80%"]);

        let drained = bus.drain();
        assert!(bus.is_empty());
        assert_eq!(drained[0].name, "batch.started");
        assert_eq!(drained[2].payload.run_id, run_id);

        let json = serde_json::to_value(&drained[1]).expect("event should serialize");
        assert_eq!(json["payload"]["kind"], "track_list_received");
        assert_eq!(json["payload"]["run_id"], run_id.0.to_string());
    }
}
