//! Web console for the plant
//!
//! Serves the embedded console page for each screen:
//! - `/dashboard` - system overview
//! - `/controller` - KPI cards, charts and the filterable plant log
//! - `/chatbot` - plant assistant
//! - `/optimizer` - performance tuning
//! - `/login` - sign-in, sign-up and role selection
//!
//! Screens other than `/login` require a logged-in session. History
//! changes and session expiry are pushed to the page over `/ws`.

pub mod handler;
pub mod types;
pub mod websocket;

pub use handler::{
    assets_handler, history_handler, logs_handler, plant_status_handler, render_screen,
    screen_routes,
};
pub use websocket::websocket_handler;
