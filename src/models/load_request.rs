//! Modelo de LoadRequest
//!
//! Un envío publicado por un cliente. Su estado solo avanza cuando el
//! cliente acepta una puja.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::status::BidStatus;

/// Ubicación de recogida o entrega
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[validate(length(min = 2, max = 300))]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Solicitud de carga
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub id: String,
    pub client_id: String,
    pub pickup: Location,
    pub dropoff: Location,
    pub distance_km: f64,
    pub goods_type: String,
    pub weight: f64,
    pub pay_terms: String,
    /// Tope de camiones asignables a pujas de esta solicitud
    pub number_of_trucks: u32,
    pub estimated_price: Decimal,
    #[serde(default)]
    pub comments: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

/// Request para publicar una solicitud de carga
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLoadRequest {
    #[validate]
    pub pickup: Location,

    #[validate]
    pub dropoff: Location,

    #[validate(range(min = 0.0))]
    pub distance_km: f64,

    #[validate(length(min = 2, max = 100))]
    pub goods_type: String,

    #[validate(range(min = 0.1))]
    pub weight: f64,

    #[validate(length(min = 2, max = 100))]
    pub pay_terms: String,

    #[validate(range(min = 1, max = 50))]
    pub number_of_trucks: u32,

    pub estimated_price: Decimal,

    #[validate(length(max = 1000))]
    pub comments: Option<String>,
}
