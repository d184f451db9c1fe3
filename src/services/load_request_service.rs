//! Publicación de solicitudes de carga

use std::sync::Arc;
use validator::Validate;

use crate::clients::LoadBoardBackend;
use crate::models::{AccountType, LoadRequest, NewLoadRequest, Session};
use crate::utils::errors::{validation_error, AppResult};

pub struct LoadRequestService {
    backend: Arc<dyn LoadBoardBackend>,
}

impl LoadRequestService {
    pub fn new(backend: Arc<dyn LoadBoardBackend>) -> Self {
        Self { backend }
    }

    /// Publica una solicitud nueva; el backend la crea en `pending`
    pub async fn submit(&self, session: &Session, new_request: &NewLoadRequest) -> AppResult<LoadRequest> {
        session.require(AccountType::Client)?;
        new_request.validate()?;
        if new_request.pickup.address.trim().is_empty() || new_request.dropoff.address.trim().is_empty() {
            return Err(validation_error("Pickup and dropoff addresses are required"));
        }

        let request = self.backend.create_load_request(session, new_request).await?;
        tracing::info!(
            "📝 Solicitud {} publicada: {} -> {} ({} camión(es))",
            request.id,
            request.pickup.address,
            request.dropoff.address,
            request.number_of_trucks
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MemoryBackend, Operation};
    use crate::models::{BidStatus, Location};
    use crate::utils::errors::AppError;
    use rust_decimal::Decimal;

    fn new_request(number_of_trucks: u32) -> NewLoadRequest {
        NewLoadRequest {
            pickup: Location {
                address: "Dar es Salaam Port".to_string(),
                latitude: None,
                longitude: None,
            },
            dropoff: Location {
                address: "Lusaka".to_string(),
                latitude: None,
                longitude: None,
            },
            distance_km: 1_900.0,
            goods_type: "Copper".to_string(),
            weight: 30.0,
            pay_terms: "50% upfront".to_string(),
            number_of_trucks,
            estimated_price: Decimal::new(4_500, 0),
            comments: None,
        }
    }

    #[tokio::test]
    async fn test_client_publishes_pending_request() {
        let backend = MemoryBackend::new();
        let service = LoadRequestService::new(Arc::new(backend));
        let session = Session::new("tok", "C1", AccountType::Client);

        let request = service.submit(&session, &new_request(2)).await.unwrap();
        assert_eq!(request.status, BidStatus::Pending);
        assert_eq!(request.client_id, "C1");
        assert_eq!(request.number_of_trucks, 2);
    }

    #[tokio::test]
    async fn test_zero_trucks_or_trucker_session_rejected() {
        let backend = MemoryBackend::new();
        let service = LoadRequestService::new(Arc::new(backend.clone()));

        let client = Session::new("tok", "C1", AccountType::Client);
        let result = service.submit(&client, &new_request(0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let trucker = Session::new("tok", "T1", AccountType::Trucker);
        let result = service.submit(&trucker, &new_request(1)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        assert_eq!(backend.call_count(Operation::CreateLoadRequest).await, 0);
    }
}
