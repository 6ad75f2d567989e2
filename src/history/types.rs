//! Type definitions for the bounded history store

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Single point in a KPI time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSample {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub value: f64,
}

/// The four monitored plant metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Specific power consumption
    Spc,
    /// Thermal substitution rate
    Tsr,
    /// Clinker quality index
    ClinkerQuality,
    /// CO₂ emissions
    Co2,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Spc,
        Metric::Tsr,
        Metric::ClinkerQuality,
        Metric::Co2,
    ];

    /// Human readable card title
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Spc => "Specific Power Consumption",
            Metric::Tsr => "Thermal Substitution Rate",
            Metric::ClinkerQuality => "Clinker Quality Index",
            Metric::Co2 => "CO₂ Emissions",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Spc => "kWh/t",
            Metric::Tsr => "%",
            Metric::ClinkerQuality => "%",
            Metric::Co2 => "t/t clinker",
        }
    }

    /// Chart colour used by the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            Metric::Spc => "#00FF88",
            Metric::Tsr => "#FF4757",
            Metric::ClinkerQuality => "#3742FA",
            Metric::Co2 => "#FFA500",
        }
    }

    /// Prometheus label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Spc => "spc",
            Metric::Tsr => "tsr",
            Metric::ClinkerQuality => "clinker_quality",
            Metric::Co2 => "co2",
        }
    }
}

/// Severity of a plant log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Alert,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "Info",
            LogLevel::Warning => "Warning",
            LogLevel::Alert => "Alert",
        };
        f.write_str(s)
    }
}

/// Entry in the plant event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique id, doubles as the entry's timestamp
    pub id: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(id: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level,
            message: message.into(),
        }
    }
}

/// Overall plant state shown in the navigation shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlantStatus {
    #[default]
    Running,
    Stopped,
    Maintenance,
}

impl PlantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlantStatus::Running => "running",
            PlantStatus::Stopped => "stopped",
            PlantStatus::Maintenance => "maintenance",
        }
    }
}

impl FromStr for PlantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(PlantStatus::Running),
            "stopped" => Ok(PlantStatus::Stopped),
            "maintenance" => Ok(PlantStatus::Maintenance),
            _ => Err(format!("Invalid plant status: {}", s)),
        }
    }
}

/// One reading of all four KPIs, as produced by a telemetry feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiReading {
    pub spc: f64,
    pub tsr: f64,
    pub clinker_quality: f64,
    pub co2: f64,
}

impl KpiReading {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Spc => self.spc,
            Metric::Tsr => self.tsr,
            Metric::ClinkerQuality => self.clinker_quality,
            Metric::Co2 => self.co2,
        }
    }
}

/// Discrete, named mutation of the history state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddLog(LogEntry),
    AddKpiSample {
        spc: f64,
        tsr: f64,
        clinker_quality: f64,
        co2: f64,
        timestamp: i64,
    },
    SetPlantStatus(PlantStatus),
}

impl Action {
    /// Build an `AddKpiSample` from a full reading
    pub fn kpi_sample(reading: KpiReading, timestamp: i64) -> Self {
        Action::AddKpiSample {
            spc: reading.spc,
            tsr: reading.tsr,
            clinker_quality: reading.clinker_quality,
            co2: reading.co2,
            timestamp,
        }
    }

    /// Short name used for metrics and logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddLog(_) => "add_log",
            Action::AddKpiSample { .. } => "add_kpi_sample",
            Action::SetPlantStatus(_) => "set_plant_status",
        }
    }
}

/// Log panel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFilter {
    #[default]
    All,
    Info,
    Warning,
    Alert,
}

impl LogFilter {
    pub fn matches(&self, level: LogLevel) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Info => level == LogLevel::Info,
            LogFilter::Warning => level == LogLevel::Warning,
            LogFilter::Alert => level == LogLevel::Alert,
        }
    }
}

impl FromStr for LogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(LogFilter::All),
            "info" => Ok(LogFilter::Info),
            "warning" => Ok(LogFilter::Warning),
            "alert" => Ok(LogFilter::Alert),
            _ => Err(format!("Invalid log filter: {}", s)),
        }
    }
}

/// KPI card shown at the top of the controller screen
#[derive(Debug, Clone, Serialize)]
pub struct KpiCard {
    pub metric: Metric,
    pub title: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    /// Latest value, 0 when the series is empty
    pub value: f64,
}
