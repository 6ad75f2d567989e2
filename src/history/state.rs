//! History state and its reducer
//!
//! `HistoryState::apply` is the only way the state changes. It is a pure
//! function of (state, action) and never fails.

use std::collections::VecDeque;

use serde::Serialize;

use super::types::{
    Action, KpiCard, KpiSample, LogEntry, LogFilter, Metric, PlantStatus,
};

/// Maximum samples kept per KPI series
pub const KPI_HISTORY_CAPACITY: usize = 300;

/// Maximum entries kept in the plant log
pub const LOG_CAPACITY: usize = 50;

/// Bounded snapshot of recent KPI samples, log entries and plant status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryState {
    /// Most recent first
    pub logs: VecDeque<LogEntry>,
    pub spc_history: VecDeque<KpiSample>,
    pub tsr_history: VecDeque<KpiSample>,
    pub clinker_quality_history: VecDeque<KpiSample>,
    pub co2_history: VecDeque<KpiSample>,
    pub plant_status: PlantStatus,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryState {
    /// Empty history with the plant `Running`
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            spc_history: VecDeque::with_capacity(KPI_HISTORY_CAPACITY),
            tsr_history: VecDeque::with_capacity(KPI_HISTORY_CAPACITY),
            clinker_quality_history: VecDeque::with_capacity(KPI_HISTORY_CAPACITY),
            co2_history: VecDeque::with_capacity(KPI_HISTORY_CAPACITY),
            plant_status: PlantStatus::Running,
        }
    }

    /// Apply one action and return the resulting state.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::AddLog(entry) => {
                self.logs.push_front(entry);
                self.logs.truncate(LOG_CAPACITY);
            }
            Action::AddKpiSample {
                spc,
                tsr,
                clinker_quality,
                co2,
                timestamp,
            } => {
                push_bounded(&mut self.spc_history, timestamp, spc);
                push_bounded(&mut self.tsr_history, timestamp, tsr);
                push_bounded(&mut self.clinker_quality_history, timestamp, clinker_quality);
                push_bounded(&mut self.co2_history, timestamp, co2);
            }
            Action::SetPlantStatus(status) => {
                self.plant_status = status;
            }
        }
        self
    }

    /// Series for one metric, oldest first
    pub fn series(&self, metric: Metric) -> &VecDeque<KpiSample> {
        match metric {
            Metric::Spc => &self.spc_history,
            Metric::Tsr => &self.tsr_history,
            Metric::ClinkerQuality => &self.clinker_quality_history,
            Metric::Co2 => &self.co2_history,
        }
    }

    /// Most recent value of a series, `None` if nothing has been recorded
    pub fn latest(&self, metric: Metric) -> Option<f64> {
        self.series(metric).back().map(|s| s.value)
    }

    /// Log entries matching the filter, newest first
    pub fn logs_matching(&self, filter: LogFilter) -> Vec<LogEntry> {
        self.logs
            .iter()
            .filter(|entry| filter.matches(entry.level))
            .cloned()
            .collect()
    }

    pub fn kpi_cards(&self) -> Vec<KpiCard> {
        Metric::ALL
            .iter()
            .map(|&metric| KpiCard {
                metric,
                title: metric.title(),
                unit: metric.unit(),
                color: metric.color(),
                value: self.latest(metric).unwrap_or(0.0),
            })
            .collect()
    }
}

fn push_bounded(series: &mut VecDeque<KpiSample>, timestamp: i64, value: f64) {
    series.push_back(KpiSample { timestamp, value });
    while series.len() > KPI_HISTORY_CAPACITY {
        series.pop_front();
    }
}
