// API module
//
// This module contains the HTTP API surface for the ledger

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
