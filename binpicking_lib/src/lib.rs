//! # Bin Picking Library
//!
//! Shared types and utilities for the bin picking emulator node and the
//! clients that call its services.

pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use types::*;
pub use utils::*;
