//! Type definitions for dashboard data structures

use serde::{Deserialize, Serialize};

use crate::history::Action;
use crate::session::SessionNotice;

/// WebSocket update message sent to dashboard clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardUpdate {
    /// Type of update
    pub update_type: UpdateType,
    /// JSON payload for the update
    pub data: serde_json::Value,
}

/// Type of WebSocket update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// New sample for all four KPI series
    KpiSample,
    /// New plant log entry
    Log,
    /// Plant status changed
    PlantStatus,
    /// Session was closed after the idle timeout
    SessionExpired,
}

impl From<&Action> for DashboardUpdate {
    fn from(action: &Action) -> Self {
        match action {
            Action::AddLog(entry) => DashboardUpdate {
                update_type: UpdateType::Log,
                data: serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
            },
            Action::AddKpiSample {
                spc,
                tsr,
                clinker_quality,
                co2,
                timestamp,
            } => DashboardUpdate {
                update_type: UpdateType::KpiSample,
                data: serde_json::json!({
                    "timestamp": timestamp,
                    "spc": spc,
                    "tsr": tsr,
                    "clinker_quality": clinker_quality,
                    "co2": co2,
                }),
            },
            Action::SetPlantStatus(status) => DashboardUpdate {
                update_type: UpdateType::PlantStatus,
                data: serde_json::to_value(status).unwrap_or(serde_json::Value::Null),
            },
        }
    }
}

impl DashboardUpdate {
    pub fn session_expired(notice: &SessionNotice) -> Self {
        DashboardUpdate {
            update_type: UpdateType::SessionExpired,
            data: serde_json::to_value(notice).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// A navigable screen of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Dashboard,
    Controller,
    Chatbot,
    Optimizer,
    Login,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Dashboard,
        Screen::Controller,
        Screen::Chatbot,
        Screen::Optimizer,
        Screen::Login,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Dashboard => "/dashboard",
            Screen::Controller => "/controller",
            Screen::Chatbot => "/chatbot",
            Screen::Optimizer => "/optimizer",
            Screen::Login => "/login",
        }
    }

    /// Whether the screen needs a logged-in session
    pub fn requires_session(&self) -> bool {
        !matches!(self, Screen::Login)
    }
}

/// Sidebar entry
#[derive(Debug, Clone, Serialize)]
pub struct NavigationItem {
    pub path: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Sidebar entries, in display order
pub const NAVIGATION: [NavigationItem; 4] = [
    NavigationItem {
        path: "/dashboard",
        label: "Dashboard",
        description: "System Overview",
    },
    NavigationItem {
        path: "/controller",
        label: "Controller",
        description: "Process Control",
    },
    NavigationItem {
        path: "/chatbot",
        label: "Plant GPT",
        description: "Intelligent Support",
    },
    NavigationItem {
        path: "/optimizer",
        label: "Optimizer",
        description: "Performance Tuning",
    },
];
