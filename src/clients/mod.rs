//! Clients - backend del marketplace
//!
//! This module contains the backend contract and its HTTP and in-memory
//! implementations.

pub mod backend;
pub mod fixtures;
pub mod memory;
pub mod rest_client;

// Re-export main types for convenience
pub use backend::LoadBoardBackend;
pub use memory::{MemoryBackend, Operation};
pub use rest_client::RestBackendClient;
