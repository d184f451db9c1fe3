//! Datos de ejemplo para el backend en memoria
//!
//! Sirven para arrancar el gateway en modo `memory` con un tablero poblado
//! y como base de los tests.

use chrono::Utc;
use rust_decimal::Decimal;

use super::memory::MemoryBackend;
use crate::models::{
    Bid, BidStatus, DriverInfo, LoadRequest, LoadSnapshot, Location, OwnerContact, Truck,
    TruckSnapshot, TruckStatus,
};

pub fn sample_request(id: &str, client_id: &str, number_of_trucks: u32) -> LoadRequest {
    LoadRequest {
        id: id.to_string(),
        client_id: client_id.to_string(),
        pickup: Location {
            address: "Mombasa Port, Kenya".to_string(),
            latitude: Some(-4.0435),
            longitude: Some(39.6682),
        },
        dropoff: Location {
            address: "Kampala Industrial Area, Uganda".to_string(),
            latitude: Some(0.3136),
            longitude: Some(32.6015),
        },
        distance_km: 1_150.0,
        goods_type: "Cement".to_string(),
        weight: 28.0,
        pay_terms: "50% upfront".to_string(),
        number_of_trucks,
        estimated_price: Decimal::new(120_000, 2),
        comments: None,
        status: BidStatus::Pending,
        created_at: Utc::now(),
    }
}

pub fn sample_truck(id: &str, trucker_id: &str) -> Truck {
    Truck {
        id: id.to_string(),
        trucker_id: trucker_id.to_string(),
        truck_type: "Flatbed".to_string(),
        driver: DriverInfo {
            name: format!("Driver {}", id),
            phone: "+254700000000".to_string(),
            license_number: Some(format!("DL-{}", id)),
            passport_number: None,
        },
        owner: OwnerContact {
            name: format!("Owner {}", trucker_id),
            phone: "+254711111111".to_string(),
        },
        location: "Mombasa".to_string(),
        max_weight: 30.0,
        status: TruckStatus::Standby,
        current_load: None,
    }
}

/// Puja ya creada para `truck` sobre `request`
pub fn sample_bid(id: &str, request: &LoadRequest, truck: &Truck, status: BidStatus) -> Bid {
    Bid {
        id: id.to_string(),
        request_id: request.id.clone(),
        trucker_id: truck.trucker_id.clone(),
        truck_id: truck.id.clone(),
        client_id: request.client_id.clone(),
        negotiation_price: Decimal::new(500, 0),
        estimated_price: request.estimated_price,
        load: LoadSnapshot::from(request),
        truck: TruckSnapshot::from(truck),
        status,
        created_at: Utc::now(),
    }
}

/// Backend en memoria con un cliente, un transportista con dos camiones y
/// dos solicitudes pendientes
pub async fn demo_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.seed_request(sample_request("R1", "client-1", 2)).await;
    backend.seed_request(sample_request("R2", "client-1", 1)).await;
    backend.seed_truck(sample_truck("truck-1", "trucker-1")).await;
    backend.seed_truck(sample_truck("truck-2", "trucker-1")).await;
    backend
}
