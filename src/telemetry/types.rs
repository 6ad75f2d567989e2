//! Feed payload types

use serde::{Deserialize, Serialize};

use crate::history::{KpiReading, LogEntry};

/// One tick of a telemetry feed.
///
/// KPI readings and log entries are independent: a tick may carry either,
/// both or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpi_data: Option<KpiReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_entry: Option<LogEntry>,
}

/// Result of decoding a JSON payload part by part
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPayload {
    pub payload: FeedPayload,
    /// Parts that were present but could not be decoded
    pub malformed: Vec<&'static str>,
}

impl FeedPayload {
    /// Decode a payload received as JSON text.
    ///
    /// `kpi_data` and `log_entry` are decoded separately so that a bad KPI
    /// block does not take an accompanying log entry down with it. Returns
    /// `None` when the text is not a JSON object at all.
    pub fn from_json(raw: &str) -> Option<DecodedPayload> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let object = value.as_object()?;

        let mut decoded = DecodedPayload::default();

        match object.get("kpi_data") {
            None | Some(serde_json::Value::Null) => {}
            Some(kpi) => match serde_json::from_value::<KpiReading>(kpi.clone()) {
                Ok(reading) => decoded.payload.kpi_data = Some(reading),
                Err(_) => decoded.malformed.push("kpi_data"),
            },
        }

        match object.get("log_entry") {
            None | Some(serde_json::Value::Null) => {}
            Some(entry) => match serde_json::from_value::<LogEntry>(entry.clone()) {
                Ok(entry) => decoded.payload.log_entry = Some(entry),
                Err(_) => decoded.malformed.push("log_entry"),
            },
        }

        Some(decoded)
    }
}
