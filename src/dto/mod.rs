//! DTOs del gateway HTTP

pub mod board_dto;

pub use board_dto::*;
