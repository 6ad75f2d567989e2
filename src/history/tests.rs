//! Unit tests for the history store.

use super::*;
use crate::dashboard::types::UpdateType;

fn sample(timestamp: i64, spc: f64) -> Action {
    Action::kpi_sample(
        KpiReading {
            spc,
            tsr: spc + 1.0,
            clinker_quality: spc + 2.0,
            co2: spc + 3.0,
        },
        timestamp,
    )
}

fn log(message: &str) -> Action {
    Action::AddLog(LogEntry::new(
        format!("id-{}", message),
        LogLevel::Info,
        message,
    ))
}

// ============================================================================
// Reducer: KPI samples
// ============================================================================

#[test]
fn test_new_state_is_empty_and_running() {
    let state = HistoryState::new();
    assert!(state.logs.is_empty());
    for metric in Metric::ALL {
        assert!(state.series(metric).is_empty());
        assert_eq!(state.latest(metric), None);
    }
    assert_eq!(state.plant_status, PlantStatus::Running);
}

#[test]
fn test_kpi_sample_appends_to_all_series() {
    let state = HistoryState::new().apply(sample(10, 50.0));

    assert_eq!(state.spc_history.len(), 1);
    assert_eq!(state.tsr_history.len(), 1);
    assert_eq!(state.clinker_quality_history.len(), 1);
    assert_eq!(state.co2_history.len(), 1);

    assert_eq!(state.spc_history[0], KpiSample { timestamp: 10, value: 50.0 });
    assert_eq!(state.tsr_history[0].value, 51.0);
    assert_eq!(state.clinker_quality_history[0].value, 52.0);
    assert_eq!(state.co2_history[0].value, 53.0);
}

#[test]
fn test_kpi_eviction_keeps_last_300() {
    // 301 samples with timestamps and spc values 1..=301
    let state = (1..=301).fold(HistoryState::new(), |state, i| {
        state.apply(sample(i, i as f64))
    });

    assert_eq!(state.spc_history.len(), KPI_HISTORY_CAPACITY);
    assert_eq!(state.spc_history.front().unwrap().timestamp, 2);
    assert_eq!(state.spc_history.back().unwrap().timestamp, 301);
    assert_eq!(state.latest(Metric::Spc), Some(301.0));

    for metric in Metric::ALL {
        assert_eq!(state.series(metric).len(), KPI_HISTORY_CAPACITY);
    }
}

#[test]
fn test_kpi_sample_does_not_touch_logs_or_status() {
    let state = HistoryState::new()
        .apply(Action::SetPlantStatus(PlantStatus::Stopped))
        .apply(log("m1"))
        .apply(sample(1, 1.0));

    assert_eq!(state.logs.len(), 1);
    assert_eq!(state.plant_status, PlantStatus::Stopped);
}

// ============================================================================
// Reducer: logs
// ============================================================================

#[test]
fn test_log_prepends_newest_first() {
    let state = HistoryState::new().apply(log("first")).apply(log("second"));
    assert_eq!(state.logs[0].message, "second");
    assert_eq!(state.logs[1].message, "first");
}

#[test]
fn test_log_eviction_drops_oldest() {
    let state = (1..=51).fold(HistoryState::new(), |state, i| {
        state.apply(log(&format!("m{}", i)))
    });

    assert_eq!(state.logs.len(), LOG_CAPACITY);
    assert_eq!(state.logs.front().unwrap().message, "m51");
    assert_eq!(state.logs.back().unwrap().message, "m2");
    assert!(state.logs.iter().all(|entry| entry.message != "m1"));
}

#[test]
fn test_logs_matching_filter_preserves_order() {
    let state = HistoryState::new()
        .apply(Action::AddLog(LogEntry::new("1", LogLevel::Warning, "w1")))
        .apply(Action::AddLog(LogEntry::new("2", LogLevel::Alert, "a1")))
        .apply(Action::AddLog(LogEntry::new("3", LogLevel::Warning, "w2")));

    let warnings = state.logs_matching(LogFilter::Warning);
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].message, "w2");
    assert_eq!(warnings[1].message, "w1");

    assert_eq!(state.logs_matching(LogFilter::All).len(), 3);
    assert!(state.logs_matching(LogFilter::Info).is_empty());
}

// ============================================================================
// Reducer: plant status
// ============================================================================

#[test]
fn test_set_plant_status_is_idempotent() {
    let base = HistoryState::new().apply(sample(1, 1.0)).apply(log("m1"));

    let once = base
        .clone()
        .apply(Action::SetPlantStatus(PlantStatus::Maintenance));
    let twice = once
        .clone()
        .apply(Action::SetPlantStatus(PlantStatus::Maintenance));

    assert_eq!(once, twice);
    assert_eq!(twice.plant_status, PlantStatus::Maintenance);
}

#[test]
fn test_kpi_cards_default_to_zero() {
    let cards = HistoryState::new().kpi_cards();
    assert_eq!(cards.len(), 4);
    assert!(cards.iter().all(|card| card.value == 0.0));

    let cards = HistoryState::new().apply(sample(5, 72.5)).kpi_cards();
    assert_eq!(cards[0].metric, Metric::Spc);
    assert_eq!(cards[0].value, 72.5);
    assert_eq!(cards[3].unit, "t/t clinker");
}

// ============================================================================
// Store
// ============================================================================

#[test]
fn test_store_dispatch_replaces_snapshot() {
    let store = HistoryStore::new();
    let before = store.snapshot();

    store.dispatch(sample(1, 42.0));
    let after = store.snapshot();

    // The earlier snapshot is untouched
    assert!(before.spc_history.is_empty());
    assert_eq!(after.spc_history.len(), 1);
    assert_eq!(after.latest(Metric::Spc), Some(42.0));
}

#[test]
fn test_store_applies_actions_in_dispatch_order() {
    let store = HistoryStore::new();
    for i in 1..=5 {
        store.dispatch(sample(i, i as f64));
        store.dispatch(log(&format!("m{}", i)));
    }

    let snapshot = store.snapshot();
    let timestamps: Vec<i64> = snapshot.spc_history.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![1, 2, 3, 4, 5]);
    assert_eq!(snapshot.logs[0].message, "m5");
    assert_eq!(snapshot.logs[4].message, "m1");
}

#[tokio::test]
async fn test_store_broadcasts_updates() {
    let (tx, mut rx) = tokio::sync::broadcast::channel(16);
    let store = HistoryStore::new().with_broadcast(tx);

    store.dispatch(sample(7, 55.0));
    store.dispatch(Action::SetPlantStatus(PlantStatus::Stopped));

    let first = rx.recv().await.unwrap();
    assert_eq!(first.update_type, UpdateType::KpiSample);
    assert_eq!(first.data["timestamp"], 7);

    let second = rx.recv().await.unwrap();
    assert_eq!(second.update_type, UpdateType::PlantStatus);
    assert_eq!(second.data, serde_json::json!("Stopped"));
}

#[test]
fn test_concurrent_dispatch_broadcasts_in_apply_order() {
    let (tx, mut rx) = tokio::sync::broadcast::channel(64);
    let store = std::sync::Arc::new(HistoryStore::new().with_broadcast(tx));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..10 {
                    store.dispatch(log(&format!("t{}-{}", t, i)));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let mut broadcast = Vec::new();
    while let Ok(update) = rx.try_recv() {
        broadcast.push(update.data["message"].as_str().unwrap().to_string());
    }

    // Logs are newest first, so the apply order is the reverse
    let applied: Vec<String> = store
        .snapshot()
        .logs
        .iter()
        .rev()
        .map(|entry| entry.message.clone())
        .collect();
    assert_eq!(applied.len(), 40);
    assert_eq!(broadcast, applied);
}

#[test]
fn test_store_dispatch_without_receivers() {
    let (tx, rx) = tokio::sync::broadcast::channel(4);
    drop(rx);
    let store = HistoryStore::new().with_broadcast(tx);

    store.dispatch(log("nobody listening"));
    assert_eq!(store.snapshot().logs.len(), 1);
}
