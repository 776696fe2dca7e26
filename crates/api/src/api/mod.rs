// HTTP API routes
//
// Each submodule handles one resource with its own AppState.

pub mod common;
pub mod health;
pub mod logs;
pub mod validation;

// Re-export common types
pub use common::ErrorResponse;
