//! Middleware del sistema
//!
//! Autenticación de la sesión y CORS.

pub mod auth;
pub mod cors;

pub use auth::auth_middleware;
pub use cors::cors_layer;
