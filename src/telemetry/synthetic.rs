//! Synthetic random-walk feed used in place of a real plant connection

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{FeedCallback, FeedHandle, FeedPayload, TelemetryFeed};
use crate::config::TelemetryConfig;
use crate::history::{KpiReading, LogEntry, LogLevel};

/// SPC above this raises an alert
pub const SPC_ALERT_THRESHOLD: f64 = 85.0;

/// SPC above this raises a warning
pub const SPC_WARNING_THRESHOLD: f64 = 70.0;

/// Interval-driven generator of plausible kiln KPIs.
pub struct SyntheticFeed {
    interval: Duration,
    seed: Option<u64>,
    parent: CancellationToken,
}

impl SyntheticFeed {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            // A zero period would panic in `interval_at`
            interval: Duration::from_millis(config.interval_ms.max(1)),
            seed: config.seed,
            parent: CancellationToken::new(),
        }
    }

    /// Tie the feed to a wider shutdown token.
    pub fn with_cancellation(mut self, parent: CancellationToken) -> Self {
        self.parent = parent;
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl TelemetryFeed for SyntheticFeed {
    fn start(&self, callback: FeedCallback) -> FeedHandle {
        let cancel = self.parent.child_token();
        let token = cancel.clone();
        let period = self.interval;
        let mut rng = self.rng();

        let task = tokio::spawn(async move {
            // First tick after one full period, like a browser interval timer
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(interval_ms = period.as_millis() as u64, "Synthetic telemetry feed started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Synthetic telemetry feed stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let payload = generate(&mut rng, Utc::now().timestamp_millis());
                        callback(payload);
                    }
                }
            }
        });

        FeedHandle::new(cancel, task)
    }
}

/// Produce one synthetic tick for wall-clock time `now_ms`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, now_ms: i64) -> FeedPayload {
    let phase = now_ms as f64 * 0.001;

    let reading = KpiReading {
        spc: rng.gen_range(0.0..30.0) + 40.0 + phase.sin() * 15.0,
        tsr: rng.gen_range(0.0..20.0) + 50.0 + phase.cos() * 10.0,
        clinker_quality: rng.gen_range(0.0..10.0) + 85.0,
        co2: rng.gen_range(0.0..5.0) + 10.0,
    };

    FeedPayload {
        kpi_data: Some(reading),
        log_entry: spc_log_entry(reading.spc, now_ms),
    }
}

/// Log entry raised for an SPC reading, if it crosses a threshold
pub fn spc_log_entry(spc: f64, now_ms: i64) -> Option<LogEntry> {
    let (level, message) = if spc > SPC_ALERT_THRESHOLD {
        (LogLevel::Alert, format!("Critical SPC: {:.1} kWh/t!", spc))
    } else if spc > SPC_WARNING_THRESHOLD {
        (LogLevel::Warning, format!("High SPC: {:.1} kWh/t.", spc))
    } else {
        return None;
    };

    Some(LogEntry::new(log_id(now_ms), level, message))
}

/// RFC 3339 timestamp with millisecond precision
fn log_id(now_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(now_ms)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| now_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_generate_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..500 {
            let payload = generate(&mut rng, 1_700_000_000_000 + i * 2000);
            let kpi = payload.kpi_data.unwrap();
            assert!((25.0..=85.0).contains(&kpi.spc), "spc {}", kpi.spc);
            assert!((40.0..=80.0).contains(&kpi.tsr), "tsr {}", kpi.tsr);
            assert!((85.0..95.0).contains(&kpi.clinker_quality));
            assert!((10.0..15.0).contains(&kpi.co2));
        }
    }

    #[test]
    fn test_generate_is_reproducible_with_seed() {
        let a = generate(&mut StdRng::seed_from_u64(42), 1_000);
        let b = generate(&mut StdRng::seed_from_u64(42), 1_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_spc_log_thresholds() {
        assert!(spc_log_entry(70.0, 0).is_none());

        let warning = spc_log_entry(71.24, 0).unwrap();
        assert_eq!(warning.level, LogLevel::Warning);
        assert_eq!(warning.message, "High SPC: 71.2 kWh/t.");

        let alert = spc_log_entry(90.0, 0).unwrap();
        assert_eq!(alert.level, LogLevel::Alert);
        assert_eq!(alert.message, "Critical SPC: 90.0 kWh/t!");
    }

    #[test]
    fn test_log_id_is_iso_timestamp() {
        assert_eq!(log_id(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(log_id(1_500), "1970-01-01T00:00:01.500Z");
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_ticks_until_stopped() {
        let config = TelemetryConfig {
            enabled: true,
            interval_ms: 2000,
            seed: Some(1),
        };
        let feed = SyntheticFeed::new(&config);

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handle = feed.start(Arc::new(move |payload| {
            sink.lock().unwrap().push(payload);
        }));

        tokio::time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(received.lock().unwrap().len(), 3);

        handle.stop();
        assert!(handle.is_stopped());
        handle.join().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(received.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_runs_at_one_millisecond() {
        let config = TelemetryConfig {
            enabled: true,
            interval_ms: 0,
            seed: Some(3),
        };
        let feed = SyntheticFeed::new(&config);
        assert_eq!(feed.interval, Duration::from_millis(1));

        let ticks = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&ticks);
        let handle = feed.start(Arc::new(move |_| {
            *counter.lock().unwrap() += 1;
        }));

        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.stop();
        handle.join().await;
        assert!(*ticks.lock().unwrap() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_feed() {
        let parent = CancellationToken::new();
        let feed = SyntheticFeed::new(&TelemetryConfig::default()).with_cancellation(parent.clone());

        let handle = feed.start(Arc::new(|_| {}));
        parent.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle.join()).await;
        assert!(result.is_ok());
    }
}
