#![allow(dead_code)]

//! Test helpers shared by the integration tests: a recording event sink,
//! manager construction with a shared in-memory store, and threshold-table
//! builders.

use std::cell::RefCell;
use std::rc::Rc;

use achievement_tracker::persist::{self, StoredAchievement, StoredSettings, StoredThreshold};
use achievement_tracker::{
    AchievementManager, EventSink, KvStore, ManagerConfig, MemoryStore, STATE_KEY, ThresholdTable,
    UnlockEvent,
};
use store::PersistenceCodec;

pub const TOKEN: &str = "test-capability-token";
pub const SECRET: &str = "test-secret-key";

/// Sink that records every emitted event; cloning shares the record.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<(String, UnlockEvent)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, UnlockEvent)> {
        self.events.borrow().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|(_, payload)| payload.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn clear(&mut self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &str, payload: &UnlockEvent) {
        self.events
            .borrow_mut()
            .push((event.to_string(), payload.clone()));
    }
}

pub fn config() -> ManagerConfig {
    ManagerConfig::new(TOKEN, SECRET)
}

/// Builds a manager over the given store, returning the sink handle too.
pub fn manager_over(store: MemoryStore) -> (AchievementManager, RecordingSink) {
    let sink = RecordingSink::new();
    let manager = AchievementManager::new(config(), Box::new(store), Box::new(sink.clone()));
    (manager, sink)
}

/// Fresh manager over a fresh store.
pub fn manager() -> (AchievementManager, RecordingSink, MemoryStore) {
    let store = MemoryStore::new();
    let (manager, sink) = manager_over(store.clone());
    (manager, sink, store)
}

/// Table with the given widths and generated labels.
pub fn table(widths: &[f64], tag: &str) -> ThresholdTable {
    let n = widths.len();
    ThresholdTable::from_widths(
        widths.to_vec(),
        (0..n).map(|i| format!("{tag} {i}")).collect(),
        (0..n).map(|i| format!("{tag} level {i}.")).collect(),
        (0..n).map(|i| format!("images/{tag}-{i}.svg")).collect(),
        None,
    )
    .expect("valid test table")
}

/// Stored record with generated labels, as an older session might have
/// written it.
pub fn stored_record(id: &str, widths: &[f64], level: usize, progress: f64) -> StoredAchievement {
    let n = widths.len();
    StoredAchievement {
        id: id.to_string(),
        settings: StoredSettings {
            names: (0..n).map(|i| format!("{id} {i}")).collect(),
            descriptions: (0..n).map(|i| format!("{id} level {i}.")).collect(),
            thresholds: widths.iter().map(|w| StoredThreshold::Width(*w)).collect(),
            images: (0..n).map(|i| format!("images/{id}-{i}.svg")).collect(),
            colors: None,
        },
        level,
        progress,
    }
}

/// Writes the given records into the store under the well-known key, sealed
/// the same way a previous session would have sealed them.
pub fn seed_store(store: &mut MemoryStore, records: &[StoredAchievement]) {
    let plaintext = persist::encode_collection(records).expect("encode");
    let sealed = PersistenceCodec::new(SECRET).seal(&plaintext).expect("seal");
    store.set(STATE_KEY, &sealed).expect("seed store");
}
