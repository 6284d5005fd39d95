//! Persistence across manager instances: round trips, tamper detection and
//! the emergency reset sentinel.

mod helpers;

use achievement_tracker::{
    AchievementManager, FileStore, KvStore, LogSink, ManagerConfig, STATE_KEY,
};
use pretty_assertions::assert_eq;

use helpers::{TOKEN, manager, manager_over, seed_store, stored_record};

#[test]
fn state_round_trips_across_instances() {
    let (mut first, _sink, store) = manager();
    first.update("jump", 10.0, Some(TOKEN)).expect("update");
    assert_eq!(first.get("jump").expect("jump").level(), 2);

    let (second, _sink) = manager_over(store.clone());
    let jump = second.get("jump").expect("jump");
    assert_eq!(jump.level(), 2);
    assert_eq!(jump.progress(), 0.0);
    assert_eq!(jump.cumulative_progress(), 10.0);
    assert_eq!(second.len(), 4);
}

#[test]
fn tampered_data_falls_back_to_defaults() {
    let (mut first, _sink, mut store) = manager();
    first.update("jump", 10.0, Some(TOKEN)).expect("update");

    let sealed = store.get(STATE_KEY).expect("persisted value");
    let mut tampered: Vec<char> = sealed.chars().collect();
    let mid = tampered.len() / 2;
    tampered[mid] = if tampered[mid] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    store.set(STATE_KEY, &tampered).expect("tamper");

    let (second, _sink) = manager_over(store);
    assert_eq!(second.len(), 4);
    assert_eq!(second.staged_count(), 0);
    for achievement in second.achievements() {
        assert_eq!(achievement.level(), 0);
        assert_eq!(achievement.cumulative_progress(), 0.0);
    }
}

#[test]
fn reset_sentinel_clears_the_stored_slot() {
    let (mut manager, _sink, mut store) = manager();
    manager.update("jump", 10.0, Some(TOKEN)).expect("update");

    store.set(STATE_KEY, "reset").expect("plant sentinel");
    manager.save().expect("save executes the command");
    assert!(store.get(STATE_KEY).is_none());

    // The next save writes normal sealed state again.
    manager.save().expect("plain save");
    assert!(store.get(STATE_KEY).is_some());
}

#[test]
fn reset_sentinel_resets_named_achievements() {
    let (mut first, _sink, mut store) = manager();
    first.update("jump", 10.0, Some(TOKEN)).expect("update jump");
    first.update("content", 5.0, Some(TOKEN)).expect("update content");

    store.set(STATE_KEY, "reset:jump").expect("plant sentinel");
    first.save().expect("save executes the command");

    assert_eq!(first.get("jump").expect("jump").cumulative_progress(), 0.0);
    assert_eq!(
        first.get("content").expect("content").cumulative_progress(),
        5.0
    );

    // The command was consumed and replaced with sealed state.
    let (second, _sink) = manager_over(store);
    assert_eq!(second.get("jump").expect("jump").level(), 0);
    assert_eq!(
        second.get("content").expect("content").cumulative_progress(),
        5.0
    );
}

#[test]
fn unknown_stored_ids_are_staged_and_survive_saves() {
    let mut store = achievement_tracker::MemoryStore::new();
    seed_store(
        &mut store,
        &[stored_record("custom", &[10.0, 40.0], 1, 5.0)],
    );

    let (mut manager, _sink) = manager_over(store.clone());
    assert_eq!(manager.len(), 4, "staged records are not live achievements");
    assert!(manager.get("custom").is_none());
    assert_eq!(manager.staged_count(), 1);

    manager.save().expect("save");

    let (reloaded, _sink) = manager_over(store);
    assert_eq!(reloaded.staged_count(), 1);
}

#[test]
fn file_store_round_trips_across_processes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ManagerConfig::new(TOKEN, helpers::SECRET);

    let store = FileStore::new(dir.path()).expect("open store");
    let mut first =
        AchievementManager::new(config.clone(), Box::new(store), Box::new(LogSink));
    first.update("content", 10.0, Some(TOKEN)).expect("update");
    drop(first);

    let store = FileStore::new(dir.path()).expect("reopen store");
    let second = AchievementManager::new(config, Box::new(store), Box::new(LogSink));
    let content = second.get("content").expect("content");
    assert_eq!(content.level(), 2);
    assert_eq!(content.cumulative_progress(), 10.0);
}
