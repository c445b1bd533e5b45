//! TripForge gateway HTTP API server.
//!
//! Provides the JSON API under `/api` and hosts the dashboard page.

pub mod api_error;
pub mod control_ui;
pub mod health_api;
pub mod itinerary_api;
pub mod server;
pub mod session_api;

#[cfg(test)]
mod test_support;

pub use api_error::ApiError;
pub use server::{build_router, start_server, GatewayState};
