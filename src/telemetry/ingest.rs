//! Validation between a telemetry feed and the history store

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::{FeedCallback, FeedPayload};
use crate::history::{Action, HistoryStore, KpiReading, LogEntry, Metric};

/// Why part of a payload was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// A KPI value was NaN or infinite
    NonFiniteKpi,
    /// Log entry without an id
    EmptyLogId,
    /// Log entry without a message
    EmptyLogMessage,
    /// Payload part could not be decoded
    Malformed,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NonFiniteKpi => "non_finite_kpi",
            DropReason::EmptyLogId => "empty_log_id",
            DropReason::EmptyLogMessage => "empty_log_message",
            DropReason::Malformed => "malformed",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub kpi_applied: bool,
    pub log_applied: bool,
    pub dropped: Vec<DropReason>,
}

/// Check that every KPI value is a finite number
pub fn validate_reading(reading: &KpiReading) -> Result<(), DropReason> {
    if Metric::ALL
        .iter()
        .all(|&metric| reading.value(metric).is_finite())
    {
        Ok(())
    } else {
        Err(DropReason::NonFiniteKpi)
    }
}

pub fn validate_log_entry(entry: &LogEntry) -> Result<(), DropReason> {
    if entry.id.trim().is_empty() {
        return Err(DropReason::EmptyLogId);
    }
    if entry.message.trim().is_empty() {
        return Err(DropReason::EmptyLogMessage);
    }
    Ok(())
}

/// Validates feed payloads and turns them into history actions.
///
/// KPI readings and log entries are handled independently: a rejected
/// reading does not stop an accompanying log entry, and a tick without
/// `kpi_data` still records its log entry.
pub struct Ingestor {
    store: Arc<HistoryStore>,
}

impl Ingestor {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self { store }
    }

    /// Ingest a payload, stamping KPI samples with the current time.
    pub fn ingest(&self, payload: FeedPayload) -> IngestOutcome {
        self.ingest_at(payload, Utc::now().timestamp_millis())
    }

    /// Ingest a payload, stamping KPI samples with `timestamp` (epoch ms).
    pub fn ingest_at(&self, payload: FeedPayload, timestamp: i64) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        if let Some(reading) = payload.kpi_data {
            match validate_reading(&reading) {
                Ok(()) => {
                    record_kpi_gauges(&reading);
                    self.store.dispatch(Action::kpi_sample(reading, timestamp));
                    outcome.kpi_applied = true;
                }
                Err(reason) => {
                    tracing::warn!(?reading, reason = %reason, "Dropping invalid KPI reading");
                    outcome.dropped.push(reason);
                }
            }
        }

        if let Some(entry) = payload.log_entry {
            match validate_log_entry(&entry) {
                Ok(()) => {
                    self.store.dispatch(Action::AddLog(entry));
                    outcome.log_applied = true;
                }
                Err(reason) => {
                    tracing::warn!(id = %entry.id, reason = %reason, "Dropping invalid log entry");
                    outcome.dropped.push(reason);
                }
            }
        }

        for reason in &outcome.dropped {
            metrics::counter!("kiln_telemetry_dropped_total", "reason" => reason.as_str())
                .increment(1);
        }

        outcome
    }

    /// Ingest a payload received as JSON text.
    pub fn ingest_json(&self, raw: &str) -> IngestOutcome {
        let Some(decoded) = FeedPayload::from_json(raw) else {
            tracing::warn!(bytes = raw.len(), "Dropping undecodable telemetry payload");
            metrics::counter!("kiln_telemetry_dropped_total", "reason" => DropReason::Malformed.as_str())
                .increment(1);
            return IngestOutcome {
                dropped: vec![DropReason::Malformed],
                ..Default::default()
            };
        };

        for part in &decoded.malformed {
            tracing::warn!(part = *part, "Dropping malformed payload part");
            metrics::counter!("kiln_telemetry_dropped_total", "reason" => DropReason::Malformed.as_str())
                .increment(1);
        }

        let mut outcome = self.ingest(decoded.payload);
        outcome
            .dropped
            .extend(decoded.malformed.iter().map(|_| DropReason::Malformed));
        outcome
    }

    /// Feed callback that ingests every tick
    pub fn callback(self: Arc<Self>) -> FeedCallback {
        Arc::new(move |payload| {
            self.ingest(payload);
        })
    }
}

fn record_kpi_gauges(reading: &KpiReading) {
    for metric in Metric::ALL {
        metrics::gauge!("kiln_kpi_value", "metric" => metric.as_str()).set(reading.value(metric));
    }
}
