//! Reconciliación de disponibilidad del camión
//!
//! Deriva el estado que debe tener un camión a partir del nuevo estado de su
//! puja y lo aplica con una única actualización sobre ese camión.

use std::sync::Arc;

use crate::clients::LoadBoardBackend;
use crate::models::{BidStatus, CurrentLoad, Session, TruckStatus, TruckStatusUpdate};
use crate::utils::errors::AppResult;

/// `loaded` e `in transit` dejan el camión cargado; cualquier otro estado
/// (incluido `delivered`) lo devuelve a `standby`.
pub const fn derive_truck_status(status: BidStatus) -> TruckStatus {
    match status {
        BidStatus::Loaded | BidStatus::InTransit => TruckStatus::Loaded,
        BidStatus::Delivered => TruckStatus::Standby,
        BidStatus::Bid | BidStatus::Pending | BidStatus::Accepted => TruckStatus::Standby,
    }
}

/// Payload de actualización: con carga asociada solo mientras está cargado
pub fn plan_update(status: BidStatus, load: Option<&CurrentLoad>) -> TruckStatusUpdate {
    let truck_status = derive_truck_status(status);
    let current_load = match truck_status {
        TruckStatus::Loaded => load.cloned(),
        _ => None,
    };
    TruckStatusUpdate {
        status: truck_status,
        current_load,
    }
}

#[derive(Clone)]
pub struct TruckReconciler {
    backend: Arc<dyn LoadBoardBackend>,
}

impl TruckReconciler {
    pub fn new(backend: Arc<dyn LoadBoardBackend>) -> Self {
        Self { backend }
    }

    /// Aplica al camión `truck_id` el estado derivado de `status`
    pub async fn reconcile(
        &self,
        session: &Session,
        truck_id: &str,
        status: BidStatus,
        load: Option<&CurrentLoad>,
    ) -> AppResult<TruckStatus> {
        let update = plan_update(status, load);

        match self.backend.update_truck_status(session, truck_id, &update).await {
            Ok(()) => {
                tracing::info!("🚛 Camión {} -> {} (puja {})", truck_id, update.status, status);
                Ok(update.status)
            }
            Err(e) => {
                tracing::error!("❌ Error sincronizando camión {}: {}", truck_id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fixtures::{sample_bid, sample_request, sample_truck};
    use crate::clients::{MemoryBackend, Operation};
    use crate::models::AccountType;
    use crate::services::status_registry::CANONICAL_ORDER;

    #[test]
    fn test_mapping_policy() {
        for status in CANONICAL_ORDER {
            let expected = match status {
                BidStatus::Loaded | BidStatus::InTransit => TruckStatus::Loaded,
                _ => TruckStatus::Standby,
            };
            assert_eq!(derive_truck_status(status), expected, "status {}", status);
        }
    }

    #[test]
    fn test_load_descriptor_only_attached_when_loaded() {
        let request = sample_request("R1", "C1", 1);
        let truck = sample_truck("K1", "T1");
        let load = sample_bid("B1", &request, &truck, BidStatus::Accepted).current_load();

        assert_eq!(plan_update(BidStatus::Loaded, Some(&load)).current_load, Some(load.clone()));
        assert_eq!(plan_update(BidStatus::Delivered, Some(&load)).current_load, None);
    }

    #[tokio::test]
    async fn test_reconcile_touches_only_the_referenced_truck() {
        let backend = MemoryBackend::new();
        backend.seed_truck(sample_truck("K1", "T1")).await;
        backend.seed_truck(sample_truck("K2", "T1")).await;
        let reconciler = TruckReconciler::new(Arc::new(backend.clone()));
        let session = Session::new("tok", "T1", AccountType::Trucker);

        let status = reconciler
            .reconcile(&session, "K1", BidStatus::InTransit, None)
            .await
            .unwrap();

        assert_eq!(status, TruckStatus::Loaded);
        assert_eq!(backend.truck_snapshot("K1").await.unwrap().status, TruckStatus::Loaded);
        assert_eq!(backend.truck_snapshot("K2").await.unwrap().status, TruckStatus::Standby);
        assert_eq!(backend.call_count(Operation::UpdateTruckStatus).await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_surfaces_failure() {
        let backend = MemoryBackend::new();
        backend.seed_truck(sample_truck("K1", "T1")).await;
        backend.fail(Operation::UpdateTruckStatus, 1).await;
        let reconciler = TruckReconciler::new(Arc::new(backend));
        let session = Session::new("tok", "T1", AccountType::Trucker);

        assert!(reconciler
            .reconcile(&session, "K1", BidStatus::Loaded, None)
            .await
            .is_err());
    }
}
