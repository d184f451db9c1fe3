//! Estados del ciclo de vida de una puja
//!
//! El vocabulario es cerrado; el orden y las transiciones viven en
//! `services::status_registry`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::errors::AppError;

/// Estado de una puja (y del registro espejo de la solicitud)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    #[serde(rename = "bid")]
    Bid,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "loaded")]
    Loaded,
    #[serde(rename = "in transit", alias = "in_transit", alias = "intransit")]
    InTransit,
    #[serde(rename = "delivered")]
    Delivered,
}

impl BidStatus {
    /// Representación usada en la API del backend
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Loaded => "loaded",
            Self::InTransit => "in transit",
            Self::Delivered => "delivered",
        }
    }

    /// La puja todavía compite por la solicitud (no aceptada)
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Bid | Self::Pending)
    }

    /// La puja sigue comprometiendo a su camión: abierta o en curso
    pub const fn holds_truck(&self) -> bool {
        !matches!(self, Self::Delivered)
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BidStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bid" => Ok(Self::Bid),
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "loaded" => Ok(Self::Loaded),
            "in transit" | "in_transit" | "intransit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            other => Err(AppError::Validation(format!("Unknown bid status '{}'", other))),
        }
    }
}
