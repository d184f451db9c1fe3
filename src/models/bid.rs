//! Modelo de Bid
//!
//! Oferta de un transportista para cubrir (total o parcialmente) una
//! solicitud con un camión concreto. Lleva una copia de los datos de la
//! solicitud y del camión tomada en el momento de pujar.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::load_request::{LoadRequest, Location};
use super::status::BidStatus;
use super::truck::{CurrentLoad, Truck};

/// Datos de transporte copiados de la solicitud
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSnapshot {
    pub pickup: Location,
    pub dropoff: Location,
    pub goods_type: String,
    pub weight: f64,
    pub distance_km: f64,
    pub pay_terms: String,
}

impl From<&LoadRequest> for LoadSnapshot {
    fn from(request: &LoadRequest) -> Self {
        Self {
            pickup: request.pickup.clone(),
            dropoff: request.dropoff.clone(),
            goods_type: request.goods_type.clone(),
            weight: request.weight,
            distance_km: request.distance_km,
            pay_terms: request.pay_terms.clone(),
        }
    }
}

/// Datos descriptivos del camión copiados al pujar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckSnapshot {
    pub truck_type: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub max_weight: f64,
    pub owner_name: String,
    pub owner_phone: String,
}

impl From<&Truck> for TruckSnapshot {
    fn from(truck: &Truck) -> Self {
        Self {
            truck_type: truck.truck_type.clone(),
            driver_name: truck.driver.name.clone(),
            driver_phone: truck.driver.phone.clone(),
            max_weight: truck.max_weight,
            owner_name: truck.owner.name.clone(),
            owner_phone: truck.owner.phone.clone(),
        }
    }
}

/// Bid principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: String,
    pub request_id: String,
    pub trucker_id: String,
    pub truck_id: String,
    pub client_id: String,
    pub negotiation_price: Decimal,
    pub estimated_price: Decimal,
    pub load: LoadSnapshot,
    pub truck: TruckSnapshot,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Descriptor de carga que se asocia al camión mientras la lleva
    pub fn current_load(&self) -> CurrentLoad {
        CurrentLoad {
            load_id: self.request_id.clone(),
            bid_id: self.id.clone(),
            goods_type: self.load.goods_type.clone(),
            weight: self.load.weight,
            pickup: self.load.pickup.address.clone(),
            dropoff: self.load.dropoff.address.clone(),
        }
    }
}

/// Payload para crear una puja (asignar un camión a una solicitud)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    pub request_id: String,
    pub trucker_id: String,
    pub truck_id: String,
    pub client_id: String,
    pub negotiation_price: Decimal,
    pub estimated_price: Decimal,
    pub load: LoadSnapshot,
    pub truck: TruckSnapshot,
    pub status: BidStatus,
}

impl NewBid {
    /// Construye la puja de un camión con la copia completa de la solicitud
    pub fn for_truck(request: &LoadRequest, truck: &Truck, negotiation_price: Decimal) -> Self {
        Self {
            request_id: request.id.clone(),
            trucker_id: truck.trucker_id.clone(),
            truck_id: truck.id.clone(),
            client_id: request.client_id.clone(),
            negotiation_price,
            estimated_price: request.estimated_price,
            load: LoadSnapshot::from(request),
            truck: TruckSnapshot::from(truck),
            status: BidStatus::Pending,
        }
    }
}
