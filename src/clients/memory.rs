//! Backend en memoria
//!
//! Implementación de `LoadBoardBackend` sin red para desarrollo local
//! (`BACKEND_MODE=memory`) y para los tests. Registra cada llamada y permite
//! inyectar fallos por operación.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::LoadBoardBackend;
use crate::models::{
    AccountType, Bid, BidStatus, DriverInfo, LoadRequest, NewBid, NewLoadRequest, NewTruck,
    OwnerContact, Session, Truck, TruckStatusUpdate,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Operaciones del backend, para el registro de llamadas y la inyección de fallos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PendingRequests,
    LoadRequest,
    CreateLoadRequest,
    UpdateRequestStatus,
    DeclineRequest,
    TruckerBids,
    ClientBids,
    RequestBids,
    Bid,
    CreateBid,
    UpdateBidStatus,
    AcceptBid,
    RejectBid,
    Trucks,
    AddTruck,
    UpdateTruckStatus,
    DeleteTruck,
}

/// Fallos programados: se dejan pasar `skip` llamadas y fallan las `times` siguientes
#[derive(Debug, Clone, Copy, Default)]
struct FailurePlan {
    skip: u32,
    times: u32,
}

#[derive(Default)]
struct MemoryStore {
    requests: HashMap<String, LoadRequest>,
    bids: HashMap<String, Bid>,
    trucks: HashMap<String, Truck>,
    /// (account_id, request_id)
    declined: HashSet<(String, String)>,
    /// Estado espejo por (request_id, bid_id)
    request_mirror: HashMap<(String, String), BidStatus>,
    calls: Vec<Operation>,
    failures: HashMap<Operation, FailurePlan>,
    /// Fallos dirigidos a un identificador concreto (p.ej. un camión)
    targeted_failures: HashMap<(Operation, String), u32>,
}

impl MemoryStore {
    fn record(&mut self, op: Operation, target: Option<&str>) -> AppResult<()> {
        self.calls.push(op);

        if let Some(target) = target {
            let key = (op, target.to_string());
            if let Some(remaining) = self.targeted_failures.get_mut(&key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AppError::Transport(format!("injected failure: {:?} {}", op, target)));
                }
            }
        }

        if let Some(plan) = self.failures.get_mut(&op) {
            if plan.skip > 0 {
                plan.skip -= 1;
            } else if plan.times > 0 {
                plan.times -= 1;
                return Err(AppError::Transport(format!("injected failure: {:?}", op)));
            }
        }
        Ok(())
    }
}

/// Backend en memoria, clonable y compartible entre tareas
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_request(&self, request: LoadRequest) {
        self.store.write().await.requests.insert(request.id.clone(), request);
    }

    pub async fn seed_truck(&self, truck: Truck) {
        self.store.write().await.trucks.insert(truck.id.clone(), truck);
    }

    pub async fn seed_bid(&self, bid: Bid) {
        self.store.write().await.bids.insert(bid.id.clone(), bid);
    }

    pub async fn truck_snapshot(&self, truck_id: &str) -> Option<Truck> {
        self.store.read().await.trucks.get(truck_id).cloned()
    }

    pub async fn bid_snapshot(&self, bid_id: &str) -> Option<Bid> {
        self.store.read().await.bids.get(bid_id).cloned()
    }

    pub async fn all_bids(&self) -> Vec<Bid> {
        self.store.read().await.bids.values().cloned().collect()
    }

    pub async fn mirrored_status(&self, request_id: &str, bid_id: &str) -> Option<BidStatus> {
        self.store
            .read()
            .await
            .request_mirror
            .get(&(request_id.to_string(), bid_id.to_string()))
            .copied()
    }

    /// Llamadas registradas hasta ahora, en orden
    pub async fn calls(&self) -> Vec<Operation> {
        self.store.read().await.calls.clone()
    }

    pub async fn call_count(&self, op: Operation) -> usize {
        self.store.read().await.calls.iter().filter(|c| **c == op).count()
    }

    /// Las próximas `times` llamadas a `op` fallan con error de transporte
    pub async fn fail(&self, op: Operation, times: u32) {
        self.fail_after(op, 0, times).await;
    }

    /// Deja pasar `successes` llamadas a `op` y hace fallar las `times` siguientes
    pub async fn fail_after(&self, op: Operation, successes: u32, times: u32) {
        self.store
            .write()
            .await
            .failures
            .insert(op, FailurePlan { skip: successes, times });
    }

    /// Como `fail`, pero solo para llamadas sobre `target`
    pub async fn fail_for(&self, op: Operation, target: &str, times: u32) {
        self.store
            .write()
            .await
            .targeted_failures
            .insert((op, target.to_string()), times);
    }
}

#[async_trait]
impl LoadBoardBackend for MemoryBackend {
    async fn pending_requests(&self, session: &Session) -> AppResult<Vec<LoadRequest>> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::PendingRequests, None)?;

        let mut requests: Vec<LoadRequest> = store
            .requests
            .values()
            .filter(|r| r.status == BidStatus::Pending)
            .filter(|r| !store.declined.contains(&(session.account_id.clone(), r.id.clone())))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn load_request(&self, session: &Session, request_id: &str) -> AppResult<LoadRequest> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::LoadRequest, Some(request_id))?;
        store
            .requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| not_found_error("Load request", request_id))
    }

    async fn create_load_request(&self, session: &Session, new_request: &NewLoadRequest) -> AppResult<LoadRequest> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::CreateLoadRequest, None)?;

        let request = LoadRequest {
            id: format!("req-{}", Uuid::new_v4()),
            client_id: session.account_id.clone(),
            pickup: new_request.pickup.clone(),
            dropoff: new_request.dropoff.clone(),
            distance_km: new_request.distance_km,
            goods_type: new_request.goods_type.clone(),
            weight: new_request.weight,
            pay_terms: new_request.pay_terms.clone(),
            number_of_trucks: new_request.number_of_trucks,
            estimated_price: new_request.estimated_price,
            comments: new_request.comments.clone(),
            status: BidStatus::Pending,
            created_at: Utc::now(),
        };
        store.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn update_request_status(
        &self,
        session: &Session,
        request_id: &str,
        bid_id: &str,
        status: BidStatus,
    ) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::UpdateRequestStatus, Some(request_id))?;

        let request = store
            .requests
            .get_mut(request_id)
            .ok_or_else(|| not_found_error("Load request", request_id))?;
        request.status = status;
        store
            .request_mirror
            .insert((request_id.to_string(), bid_id.to_string()), status);
        Ok(())
    }

    async fn decline_request(&self, session: &Session, request_id: &str, _reason: Option<&str>) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::DeclineRequest, Some(request_id))?;
        store
            .declined
            .insert((session.account_id.clone(), request_id.to_string()));
        Ok(())
    }

    async fn trucker_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::TruckerBids, None)?;
        Ok(filter_bids(&store, |b| b.trucker_id == session.account_id, status))
    }

    async fn client_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::ClientBids, None)?;
        Ok(filter_bids(&store, |b| b.client_id == session.account_id, status))
    }

    async fn request_bids(&self, session: &Session, request_id: &str) -> AppResult<Vec<Bid>> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::RequestBids, Some(request_id))?;
        Ok(filter_bids(&store, |b| b.request_id == request_id, None))
    }

    async fn bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::Bid, Some(bid_id))?;
        store
            .bids
            .get(bid_id)
            .cloned()
            .ok_or_else(|| not_found_error("Bid", bid_id))
    }

    async fn create_bid(&self, session: &Session, new_bid: &NewBid) -> AppResult<Bid> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::CreateBid, Some(&new_bid.truck_id))?;

        if !store.requests.contains_key(&new_bid.request_id) {
            return Err(not_found_error("Load request", &new_bid.request_id));
        }

        let bid = Bid {
            id: format!("bid-{}", Uuid::new_v4()),
            request_id: new_bid.request_id.clone(),
            trucker_id: new_bid.trucker_id.clone(),
            truck_id: new_bid.truck_id.clone(),
            client_id: new_bid.client_id.clone(),
            negotiation_price: new_bid.negotiation_price,
            estimated_price: new_bid.estimated_price,
            load: new_bid.load.clone(),
            truck: new_bid.truck.clone(),
            status: new_bid.status,
            created_at: Utc::now(),
        };
        store.bids.insert(bid.id.clone(), bid.clone());
        Ok(bid)
    }

    async fn update_bid_status(&self, session: &Session, bid_id: &str, status: BidStatus) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::UpdateBidStatus, Some(bid_id))?;
        let bid = store
            .bids
            .get_mut(bid_id)
            .ok_or_else(|| not_found_error("Bid", bid_id))?;
        bid.status = status;
        Ok(())
    }

    async fn accept_bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::AcceptBid, Some(bid_id))?;
        let bid = store
            .bids
            .get_mut(bid_id)
            .ok_or_else(|| not_found_error("Bid", bid_id))?;
        if !bid.status.is_open() {
            return Err(AppError::Conflict(format!("Bid '{}' is already {}", bid_id, bid.status)));
        }
        bid.status = BidStatus::Accepted;
        Ok(bid.clone())
    }

    async fn reject_bid(&self, session: &Session, bid_id: &str) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::RejectBid, Some(bid_id))?;
        store
            .bids
            .remove(bid_id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Bid", bid_id))
    }

    async fn trucks(&self, session: &Session) -> AppResult<Vec<Truck>> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::Trucks, None)?;
        let mut trucks: Vec<Truck> = store
            .trucks
            .values()
            .filter(|t| session.account_type == AccountType::Admin || t.trucker_id == session.account_id)
            .cloned()
            .collect();
        trucks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(trucks)
    }

    async fn add_truck(&self, session: &Session, new_truck: &NewTruck) -> AppResult<Truck> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::AddTruck, None)?;

        let truck = Truck {
            id: format!("truck-{}", Uuid::new_v4()),
            trucker_id: session.account_id.clone(),
            truck_type: new_truck.truck_type.clone(),
            driver: DriverInfo {
                name: new_truck.driver_name.clone(),
                phone: new_truck.driver_phone.clone(),
                license_number: new_truck.license_number.clone(),
                passport_number: new_truck.passport_number.clone(),
            },
            owner: OwnerContact {
                name: new_truck.owner_name.clone(),
                phone: new_truck.owner_phone.clone(),
            },
            location: new_truck.location.clone(),
            max_weight: new_truck.max_weight,
            status: Default::default(),
            current_load: None,
        };
        store.trucks.insert(truck.id.clone(), truck.clone());
        Ok(truck)
    }

    async fn update_truck_status(
        &self,
        session: &Session,
        truck_id: &str,
        update: &TruckStatusUpdate,
    ) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::UpdateTruckStatus, Some(truck_id))?;
        let truck = store
            .trucks
            .get_mut(truck_id)
            .ok_or_else(|| not_found_error("Truck", truck_id))?;
        truck.status = update.status;
        truck.current_load = update.current_load.clone();
        Ok(())
    }

    async fn delete_truck(&self, session: &Session, truck_id: &str) -> AppResult<()> {
        session.bearer()?;
        let mut store = self.store.write().await;
        store.record(Operation::DeleteTruck, Some(truck_id))?;
        store
            .trucks
            .remove(truck_id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Truck", truck_id))
    }
}

fn filter_bids(store: &MemoryStore, owner: impl Fn(&Bid) -> bool, status: Option<BidStatus>) -> Vec<Bid> {
    let mut bids: Vec<Bid> = store
        .bids
        .values()
        .filter(|b| owner(b))
        .filter(|b| status.map_or(true, |s| b.status == s))
        .cloned()
        .collect();
    bids.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    bids
}
