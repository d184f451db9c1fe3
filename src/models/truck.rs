//! Modelo de Truck
//!
//! Camiones de la flota de un transportista y su estado de disponibilidad.
//! El estado está normalizado: las variantes heredadas (`intransit`,
//! `in_transit`) se aceptan al leer y siempre se escriben en forma canónica.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Estado de disponibilidad del camión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TruckStatus {
    #[default]
    #[serde(rename = "standby")]
    Standby,
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "loaded")]
    Loaded,
    #[serde(
        rename = "in transit",
        alias = "intransit",
        alias = "in_transit",
        alias = "In Transit"
    )]
    InTransit,
}

impl TruckStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Loaded => "loaded",
            Self::InTransit => "in transit",
        }
    }

    /// El camión está comprometido con una carga activa
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Assigned | Self::Loaded | Self::InTransit)
    }
}

impl fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Datos del conductor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
}

/// Contacto del propietario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContact {
    pub name: String,
    pub phone: String,
}

/// Carga que el camión lleva actualmente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLoad {
    pub load_id: String,
    pub bid_id: String,
    pub goods_type: String,
    pub weight: f64,
    pub pickup: String,
    pub dropoff: String,
}

/// Truck principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: String,
    pub trucker_id: String,
    pub truck_type: String,
    pub driver: DriverInfo,
    pub owner: OwnerContact,
    pub location: String,
    pub max_weight: f64,
    #[serde(default)]
    pub status: TruckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_load: Option<CurrentLoad>,
}

/// Request para registrar un camión nuevo
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTruck {
    #[validate(length(min = 2, max = 50))]
    pub truck_type: String,

    #[validate(length(min = 2, max = 100))]
    pub driver_name: String,

    #[validate(length(min = 6, max = 20))]
    pub driver_phone: String,

    pub license_number: Option<String>,
    pub passport_number: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub owner_name: String,

    #[validate(length(min = 6, max = 20))]
    pub owner_phone: String,

    #[validate(length(min = 2, max = 200))]
    pub location: String,

    #[validate(range(min = 0.1))]
    pub max_weight: f64,
}

/// Payload de actualización de estado del camión
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckStatusUpdate {
    pub status: TruckStatus,
    /// `None` desasocia la carga actual
    pub current_load: Option<CurrentLoad>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_spellings_normalize() {
        for raw in ["\"intransit\"", "\"in_transit\"", "\"in transit\"", "\"In Transit\""] {
            let status: TruckStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, TruckStatus::InTransit);
        }
        assert_eq!(serde_json::to_string(&TruckStatus::InTransit).unwrap(), "\"in transit\"");
    }

    #[test]
    fn test_busy_statuses() {
        assert!(!TruckStatus::Standby.is_busy());
        assert!(!TruckStatus::Available.is_busy());
        assert!(TruckStatus::Assigned.is_busy());
        assert!(TruckStatus::Loaded.is_busy());
        assert!(TruckStatus::InTransit.is_busy());
    }

    #[test]
    fn test_new_truck_validation() {
        let mut truck = NewTruck {
            truck_type: "Flatbed".to_string(),
            driver_name: "Amina".to_string(),
            driver_phone: "0712345678".to_string(),
            license_number: None,
            passport_number: None,
            owner_name: "Amina".to_string(),
            owner_phone: "0712345678".to_string(),
            location: "Nairobi".to_string(),
            max_weight: 28.0,
        };
        assert!(truck.validate().is_ok());

        truck.max_weight = 0.0;
        assert!(truck.validate().is_err());
    }
}
