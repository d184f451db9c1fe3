//! Configuración del proyecto
//!
//! Variables de entorno del gateway y del motor del tablero.

pub mod environment;

pub use environment::*;
