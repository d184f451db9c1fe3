//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, JWT
//! y la política de reintentos.

pub mod errors;
pub mod jwt;
pub mod retry;

pub use errors::{AppError, AppResult};
