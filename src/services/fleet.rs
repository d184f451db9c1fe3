//! Gestión de la flota del transportista

use std::sync::Arc;
use validator::Validate;

use crate::clients::LoadBoardBackend;
use crate::models::{AccountType, NewTruck, Session, Truck};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct FleetService {
    backend: Arc<dyn LoadBoardBackend>,
}

impl FleetService {
    pub fn new(backend: Arc<dyn LoadBoardBackend>) -> Self {
        Self { backend }
    }

    pub async fn list_trucks(&self, session: &Session) -> AppResult<Vec<Truck>> {
        session.require(AccountType::Trucker)?;
        self.backend.trucks(session).await
    }

    pub async fn add_truck(&self, session: &Session, new_truck: &NewTruck) -> AppResult<Truck> {
        session.require(AccountType::Trucker)?;
        new_truck.validate()?;

        let truck = self.backend.add_truck(session, new_truck).await?;
        tracing::info!("🚚 Camión {} registrado ({})", truck.id, truck.truck_type);
        Ok(truck)
    }

    /// Borra un camión que no esté trabajando
    pub async fn delete_truck(&self, session: &Session, truck_id: &str) -> AppResult<()> {
        session.require(AccountType::Trucker)?;

        let trucks = self.backend.trucks(session).await?;
        let truck = trucks
            .iter()
            .find(|t| t.id == truck_id)
            .ok_or_else(|| not_found_error("Truck", truck_id))?;
        if truck.status.is_busy() {
            return Err(AppError::Conflict(format!(
                "Truck '{}' is {} and cannot be removed",
                truck_id, truck.status
            )));
        }

        self.backend.delete_truck(session, truck_id).await?;
        tracing::info!("🗑️ Camión {} eliminado", truck_id);
        Ok(())
    }
}
