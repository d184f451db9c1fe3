//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::clients::LoadBoardBackend;
use crate::config::environment::EnvironmentConfig;
use crate::services::{
    AcceptanceService, BidLifecycleController, BoardPoller, ClientBoard, FleetService, InFlightRegistry,
    LoadRequestService, NegotiationService, TransitionOutcome, TruckerBoard,
};

type Boards<T> = Arc<RwLock<HashMap<String, Arc<RwLock<T>>>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub backend: Arc<dyn LoadBoardBackend>,
    pub lifecycle: Arc<BidLifecycleController>,
    pub negotiation: Arc<NegotiationService>,
    pub acceptance: Arc<AcceptanceService>,
    pub fleet: Arc<FleetService>,
    pub load_requests: Arc<LoadRequestService>,
    pub in_flight: InFlightRegistry,
    trucker_boards: Boards<TruckerBoard>,
    client_boards: Boards<ClientBoard>,
    pollers: Arc<Mutex<HashMap<String, BoardPoller>>>,
    /// Transiciones parcialmente aplicadas, por id de puja
    partial_transitions: Arc<RwLock<HashMap<String, TransitionOutcome>>>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, backend: Arc<dyn LoadBoardBackend>) -> Self {
        Self {
            lifecycle: Arc::new(BidLifecycleController::new(
                backend.clone(),
                config.retry,
                config.partial_failure_policy,
            )),
            negotiation: Arc::new(NegotiationService::new(backend.clone())),
            acceptance: Arc::new(AcceptanceService::new(backend.clone(), config.sibling_bid_policy)),
            fleet: Arc::new(FleetService::new(backend.clone())),
            load_requests: Arc::new(LoadRequestService::new(backend.clone())),
            in_flight: InFlightRegistry::new(),
            trucker_boards: Arc::new(RwLock::new(HashMap::new())),
            client_boards: Arc::new(RwLock::new(HashMap::new())),
            pollers: Arc::new(Mutex::new(HashMap::new())),
            partial_transitions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            config,
        }
    }

    /// Tablero del transportista, creado vacío la primera vez
    pub async fn trucker_board(&self, account_id: &str) -> Arc<RwLock<TruckerBoard>> {
        board_for(&self.trucker_boards, account_id).await
    }

    pub async fn client_board(&self, account_id: &str) -> Arc<RwLock<ClientBoard>> {
        board_for(&self.client_boards, account_id).await
    }

    /// Registra el poller de la cuenta; el anterior, si lo había, se detiene
    pub async fn replace_poller(&self, account_id: &str, poller: BoardPoller) {
        let previous = self.pollers.lock().await.insert(account_id.to_string(), poller);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// `false` si la cuenta no tenía poller activo
    pub async fn stop_poller(&self, account_id: &str) -> bool {
        let poller = self.pollers.lock().await.remove(account_id);
        match poller {
            Some(poller) => {
                poller.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn record_transition(&self, outcome: &TransitionOutcome) {
        let mut partial = self.partial_transitions.write().await;
        if outcome.is_partial() {
            log::warn!("📌 Transición parcial registrada para la puja {}", outcome.bid_id);
            partial.insert(outcome.bid_id.clone(), outcome.clone());
        } else {
            partial.remove(&outcome.bid_id);
        }
    }

    pub async fn partial_transition(&self, bid_id: &str) -> Option<TransitionOutcome> {
        self.partial_transitions.read().await.get(bid_id).cloned()
    }
}

async fn board_for<T: Default>(boards: &Boards<T>, account_id: &str) -> Arc<RwLock<T>> {
    if let Some(board) = boards.read().await.get(account_id) {
        return board.clone();
    }
    boards
        .write()
        .await
        .entry(account_id.to_string())
        .or_insert_with(|| Arc::new(RwLock::new(T::default())))
        .clone()
}
