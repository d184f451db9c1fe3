//! Contrato con el backend REST del marketplace
//!
//! Todo el motor habla con el backend a través de este trait, de modo que
//! los flujos se pueden probar con `MemoryBackend` sin red.

use async_trait::async_trait;

use crate::models::{
    Bid, BidStatus, LoadRequest, NewBid, NewLoadRequest, NewTruck, Session, Truck,
    TruckStatusUpdate,
};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait LoadBoardBackend: Send + Sync {
    /// Solicitudes pendientes visibles para el transportista
    async fn pending_requests(&self, session: &Session) -> AppResult<Vec<LoadRequest>>;

    async fn load_request(&self, session: &Session, request_id: &str) -> AppResult<LoadRequest>;

    async fn create_load_request(&self, session: &Session, request: &NewLoadRequest) -> AppResult<LoadRequest>;

    /// Estado espejo del registro de solicitud asociado a una puja
    async fn update_request_status(
        &self,
        session: &Session,
        request_id: &str,
        bid_id: &str,
        status: BidStatus,
    ) -> AppResult<()>;

    async fn decline_request(&self, session: &Session, request_id: &str, reason: Option<&str>) -> AppResult<()>;

    async fn trucker_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>>;

    async fn client_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>>;

    async fn request_bids(&self, session: &Session, request_id: &str) -> AppResult<Vec<Bid>>;

    async fn bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid>;

    async fn create_bid(&self, session: &Session, bid: &NewBid) -> AppResult<Bid>;

    async fn update_bid_status(&self, session: &Session, bid_id: &str, status: BidStatus) -> AppResult<()>;

    async fn accept_bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid>;

    async fn reject_bid(&self, session: &Session, bid_id: &str) -> AppResult<()>;

    /// Flota del transportista de la sesión
    async fn trucks(&self, session: &Session) -> AppResult<Vec<Truck>>;

    async fn add_truck(&self, session: &Session, truck: &NewTruck) -> AppResult<Truck>;

    async fn update_truck_status(
        &self,
        session: &Session,
        truck_id: &str,
        update: &TruckStatusUpdate,
    ) -> AppResult<()>;

    async fn delete_truck(&self, session: &Session, truck_id: &str) -> AppResult<()>;
}
