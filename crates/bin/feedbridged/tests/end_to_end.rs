//! End-to-end tests for the full feedbridged wiring.
//!
//! Each test runs [`bridge::run`] with the virtual device and store, a real
//! snapshot file in a temporary directory and a fixed clock, then inspects
//! what reached the device, the store and the disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use tempfile::TempDir;

use feedbridge_adapter_storage_file::FileSnapshotStore;
use feedbridge_adapter_virtual::{VirtualDevice, VirtualStore};
use feedbridge_app::ports::Clock;
use feedbridge_domain::schedule::ScheduleSnapshot;
use feedbridged::bridge;
use feedbridged::config::Config;

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

fn at(hour: u32, minute: u32) -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 10)
            .unwrap(),
    )
}

fn cache_file(dir: &TempDir) -> PathBuf {
    dir.path().join("schedules_cache.json")
}

fn test_config(cache: PathBuf) -> Config {
    let mut config = Config::default();
    config.cache.path = cache;
    config.scheduler.dwell_secs = 1;
    config.scheduler.shutdown_grace_secs = 2;
    config.device.poll_interval_ms = 5;
    config
}

#[tokio::test]
async fn should_pulse_due_schedule_and_persist_cache() {
    let dir = TempDir::new().unwrap();
    let cache_path = cache_file(&dir);
    let config = test_config(cache_path.clone());
    let store = Arc::new(VirtualStore::new());
    store.seed("schedules", json!({"breakfast": "08:00", "dinner": {"time": "19:30"}}));
    let device = VirtualDevice::new();
    let (source, sink) = device.split();

    let report = bridge::run(
        &config,
        sink,
        source,
        Arc::clone(&store),
        FileSnapshotStore::new(&cache_path),
        at(8, 0),
        tokio::time::sleep(Duration::from_millis(1500)),
    )
    .await
    .unwrap();

    assert_eq!(report.abandoned, 0);
    assert_eq!(device.written(), vec!["TRUE", "FALSE"]);
    assert_eq!(store.value("Boton"), Some(json!(false)));
    assert!(device.is_closed());

    let blob = std::fs::read(&cache_path).unwrap();
    let cached = ScheduleSnapshot::from_blob(&blob).unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached.get("breakfast").unwrap().to_string(), "08:00");
}

#[tokio::test]
async fn should_forward_device_lines_without_echoing_state_back() {
    let dir = TempDir::new().unwrap();
    let cache_path = cache_file(&dir);
    let config = test_config(cache_path.clone());
    let store = Arc::new(VirtualStore::new());
    let device = VirtualDevice::new();
    device.push_line("sensor ready");
    device.push_line("TRUE");
    for _ in 0..10 {
        device.push_line("Distancia: 5 cm\r");
    }
    let (source, sink) = device.split();

    bridge::run(
        &config,
        sink,
        source,
        Arc::clone(&store),
        FileSnapshotStore::new(&cache_path),
        at(12, 0),
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await
    .unwrap();

    assert_eq!(store.value("Boton"), Some(json!(true)));
    assert_eq!(store.value("NivelComida"), Some(json!(55)));
    assert!(device.written().is_empty());
}

#[tokio::test]
async fn should_mirror_remote_pushes_to_device() {
    let dir = TempDir::new().unwrap();
    let cache_path = cache_file(&dir);
    let config = test_config(cache_path.clone());
    let store = Arc::new(VirtualStore::new());
    let device = VirtualDevice::new();
    let (source, sink) = device.split();

    let pusher = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.push("Boton", json!(true));
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.push("Boton", json!("garbage"));
            store.push("Boton", json!(false));
        }
    });

    bridge::run(
        &config,
        sink,
        source,
        Arc::clone(&store),
        FileSnapshotStore::new(&cache_path),
        at(12, 0),
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await
    .unwrap();
    pusher.await.unwrap();

    assert_eq!(device.written(), vec!["TRUE", "FALSE"]);
}

#[tokio::test]
async fn should_start_from_disk_cache_when_store_is_offline() {
    let dir = TempDir::new().unwrap();
    let cache_path = cache_file(&dir);
    std::fs::write(&cache_path, br#"{"lunch": "13:00"}"#).unwrap();
    let config = test_config(cache_path.clone());
    let store = Arc::new(VirtualStore::new());
    store.seed("schedules", json!({"other": "14:00"}));
    store.set_offline(true);
    let device = VirtualDevice::new();
    let (source, sink) = device.split();

    bridge::run(
        &config,
        sink,
        source,
        Arc::clone(&store),
        FileSnapshotStore::new(&cache_path),
        at(13, 0),
        tokio::time::sleep(Duration::from_millis(300)),
    )
    .await
    .unwrap();

    // the pulse fires from the cached schedule but cannot reach the store
    assert!(device.written().is_empty());
    let blob = std::fs::read(&cache_path).unwrap();
    let cached = ScheduleSnapshot::from_blob(&blob).unwrap();
    assert!(cached.get("lunch").is_some());
    assert!(cached.get("other").is_none());
}
