//! Flujo de negociación y asignación
//!
//! Un transportista responde a una solicitud pendiente asignando uno o más
//! de sus camiones a un precio negociado; se crea una puja por camión. También
//! puede rechazar la solicitud sin crear ninguna puja.

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::board::TruckerBoard;
use crate::clients::LoadBoardBackend;
use crate::models::{AccountType, Bid, BidStatus, LoadRequest, NewBid, Session, Truck};
use crate::utils::errors::{validation_error, AppError, AppResult};

pub const MAX_DECLINE_REASON_LEN: usize = 500;

/// Selección de camiones y precio, uno para todo el lote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub truck_ids: Vec<String>,
    pub negotiation_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFailure {
    pub truck_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub request_id: String,
    pub created: Vec<Bid>,
    pub failed: Vec<AssignmentFailure>,
}

impl AssignmentOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validación local, antes de cualquier llamada de red.
///
/// Devuelve el precio negociado ya comprobado.
pub fn validate_assignment(request: &LoadRequest, assignment: &AssignmentRequest) -> AppResult<Decimal> {
    if request.status != BidStatus::Pending {
        return Err(validation_error(format!(
            "Request '{}' is no longer pending",
            request.id
        )));
    }

    let selected = assignment.truck_ids.len();
    if selected == 0 {
        return Err(validation_error("Select at least one truck"));
    }
    if selected > request.number_of_trucks as usize {
        return Err(validation_error(format!(
            "This load needs at most {} truck(s), {} selected",
            request.number_of_trucks, selected
        )));
    }

    let unique: HashSet<&String> = assignment.truck_ids.iter().collect();
    if unique.len() != selected {
        return Err(validation_error("The same truck was selected more than once"));
    }

    match assignment.negotiation_price {
        None => Err(validation_error("Enter a negotiation price")),
        Some(price) if price <= Decimal::ZERO => Err(validation_error("Negotiation price must be greater than zero")),
        Some(price) => Ok(price),
    }
}

pub struct NegotiationService {
    backend: Arc<dyn LoadBoardBackend>,
}

impl NegotiationService {
    pub fn new(backend: Arc<dyn LoadBoardBackend>) -> Self {
        Self { backend }
    }

    /// Asigna los camiones seleccionados creando una puja `pending` por camión.
    ///
    /// `request` es la copia que tiene el llamador (p.ej. el tablero) y solo
    /// sirve para descartar selecciones imposibles sin tocar la red; la
    /// decisión se toma sobre la solicitud recién leída del backend.
    ///
    /// Los envíos se lanzan en paralelo y se esperan todos. Si ninguno
    /// prospera se devuelve el primer error.
    pub async fn assign(
        &self,
        session: &Session,
        request: &LoadRequest,
        assignment: &AssignmentRequest,
    ) -> AppResult<AssignmentOutcome> {
        session.require(AccountType::Trucker)?;
        validate_assignment(request, assignment)?;

        let (request, fleet, bids) = tokio::try_join!(
            self.backend.load_request(session, &request.id),
            self.backend.trucks(session),
            self.backend.trucker_bids(session, None)
        )?;
        let request = &request;
        let price = validate_assignment(request, assignment)?;
        let trucks = select_trucks(&fleet, &bids, &assignment.truck_ids)?;

        tracing::info!(
            "📦 Asignando {} camión(es) a la solicitud {} a {}",
            trucks.len(),
            request.id,
            price
        );

        let submissions = trucks.iter().map(|truck| {
            let new_bid = NewBid::for_truck(request, truck, price);
            async move {
                let result = self.backend.create_bid(session, &new_bid).await;
                (new_bid.truck_id, result)
            }
        });
        let results = join_all(submissions).await;

        let mut created = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for (truck_id, result) in results {
            match result {
                Ok(bid) => created.push(bid),
                Err(e) => {
                    tracing::error!("❌ Puja para el camión {} no creada: {}", truck_id, e);
                    failed.push(AssignmentFailure {
                        truck_id,
                        reason: e.user_message(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        if created.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        tracing::info!(
            "✅ Solicitud {}: {} puja(s) creada(s), {} fallida(s)",
            request.id,
            created.len(),
            failed.len()
        );
        Ok(AssignmentOutcome {
            request_id: request.id.clone(),
            created,
            failed,
        })
    }

    /// Rechaza una solicitud pendiente: desaparece de la vista del
    /// transportista y no se crea ninguna puja. El aviso al backend es
    /// best-effort. Devuelve `false` si ya estaba rechazada.
    pub async fn decline(
        &self,
        session: &Session,
        board: &mut TruckerBoard,
        request_id: &str,
        reason: Option<&str>,
    ) -> AppResult<bool> {
        session.require(AccountType::Trucker)?;
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if reason.map_or(false, |r| r.chars().count() > MAX_DECLINE_REASON_LEN) {
            return Err(validation_error(format!(
                "Reason must be at most {} characters",
                MAX_DECLINE_REASON_LEN
            )));
        }

        if board.is_declined(request_id) {
            return Ok(false);
        }
        board.decline(request_id);

        if let Err(e) = self.backend.decline_request(session, request_id, reason).await {
            tracing::warn!("⚠️ Rechazo de {} no registrado en el backend: {}", request_id, e);
        } else {
            tracing::info!("🚫 Solicitud {} rechazada", request_id);
        }
        Ok(true)
    }
}

/// Resuelve los camiones seleccionados dentro de la flota del transportista.
///
/// Un camión con una puja sin entregar no puede pujar por otra carga.
fn select_trucks(fleet: &[Truck], bids: &[Bid], truck_ids: &[String]) -> AppResult<Vec<Truck>> {
    truck_ids
        .iter()
        .map(|id| {
            let truck = fleet
                .iter()
                .find(|t| &t.id == id)
                .ok_or_else(|| AppError::Validation(format!("Truck '{}' is not part of your fleet", id)))?;
            if truck.status.is_busy() {
                return Err(AppError::Validation(format!(
                    "Truck '{}' is {} and cannot take another load",
                    id, truck.status
                )));
            }
            if let Some(bid) = bids.iter().find(|b| &b.truck_id == id && b.status.holds_truck()) {
                return Err(AppError::Validation(format!(
                    "Truck '{}' already has bid '{}' ({})",
                    id, bid.id, bid.status
                )));
            }
            Ok(truck.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fixtures::{sample_bid, sample_request, sample_truck};
    use crate::clients::{MemoryBackend, Operation};
    use crate::models::TruckStatus;

    fn trucker() -> Session {
        Session::new("tok", "T1", AccountType::Trucker)
    }

    fn assignment(ids: &[&str], price: Option<i64>) -> AssignmentRequest {
        AssignmentRequest {
            truck_ids: ids.iter().map(|s| s.to_string()).collect(),
            negotiation_price: price.map(Decimal::from),
        }
    }

    async fn setup() -> (MemoryBackend, NegotiationService, LoadRequest) {
        let backend = MemoryBackend::new();
        let request = sample_request("R1", "C1", 2);
        backend.seed_request(request.clone()).await;
        backend.seed_truck(sample_truck("K1", "T1")).await;
        backend.seed_truck(sample_truck("K2", "T1")).await;
        backend.seed_truck(sample_truck("K3", "T1")).await;
        backend.seed_truck(sample_truck("X1", "T2")).await;
        (backend.clone(), NegotiationService::new(Arc::new(backend)), request)
    }

    #[tokio::test]
    async fn test_out_of_bounds_selection_never_hits_the_network() {
        let (backend, service, request) = setup().await;

        for ids in [vec![], vec!["K1", "K2", "K3"]] {
            let result = service.assign(&trucker(), &request, &assignment(&ids, Some(500))).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert!(backend.calls().await.is_empty());
    }

    #[test]
    fn test_missing_or_invalid_price() {
        let request = sample_request("R1", "C1", 2);
        assert!(validate_assignment(&request, &assignment(&["K1"], None)).is_err());
        assert!(validate_assignment(&request, &assignment(&["K1"], Some(0))).is_err());
        assert!(validate_assignment(&request, &assignment(&["K1", "K1"], Some(10))).is_err());
        assert_eq!(
            validate_assignment(&request, &assignment(&["K1"], Some(10))).unwrap(),
            Decimal::from(10)
        );
    }

    #[test]
    fn test_only_pending_requests_accept_assignments() {
        let mut request = sample_request("R1", "C1", 2);
        request.status = BidStatus::Accepted;
        assert!(validate_assignment(&request, &assignment(&["K1"], Some(10))).is_err());
    }

    #[tokio::test]
    async fn test_two_trucks_create_two_pending_bids() {
        let (backend, service, request) = setup().await;

        let outcome = service
            .assign(&trucker(), &request, &assignment(&["K1", "K2"], Some(500)))
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.created.len(), 2);
        let trucks: HashSet<&str> = outcome.created.iter().map(|b| b.truck_id.as_str()).collect();
        assert_eq!(trucks, HashSet::from(["K1", "K2"]));
        for bid in &outcome.created {
            assert_eq!(bid.status, BidStatus::Pending);
            assert_eq!(bid.request_id, "R1");
            assert_eq!(bid.negotiation_price, Decimal::from(500));
            assert_eq!(bid.load.goods_type, request.goods_type);
        }
        assert_eq!(backend.call_count(Operation::CreateBid).await, 2);
        // La solicitud no avanza con la asignación
        assert_eq!(backend.call_count(Operation::UpdateRequestStatus).await, 0);
    }

    #[tokio::test]
    async fn test_foreign_or_busy_trucks_are_rejected() {
        let (backend, service, request) = setup().await;
        let result = service
            .assign(&trucker(), &request, &assignment(&["X1"], Some(500)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let mut busy = sample_truck("K1", "T1");
        busy.status = TruckStatus::Loaded;
        backend.seed_truck(busy).await;
        let result = service
            .assign(&trucker(), &request, &assignment(&["K1"], Some(500)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(backend.call_count(Operation::CreateBid).await, 0);
    }

    #[tokio::test]
    async fn test_partial_batch_reports_failures() {
        let (backend, service, request) = setup().await;
        backend.fail_for(Operation::CreateBid, "K2", 1).await;

        let outcome = service
            .assign(&trucker(), &request, &assignment(&["K1", "K2"], Some(500)))
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].truck_id, "K2");
    }

    #[tokio::test]
    async fn test_truck_with_undelivered_bid_cannot_bid_again() {
        let (backend, service, request) = setup().await;
        let other = sample_request("R2", "C2", 1);
        backend.seed_request(other.clone()).await;
        service
            .assign(&trucker(), &request, &assignment(&["K1"], Some(500)))
            .await
            .unwrap();

        let result = service
            .assign(&trucker(), &other, &assignment(&["K1"], Some(450)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(backend.call_count(Operation::CreateBid).await, 1);

        // Una vez entregada la carga el camión vuelve a estar libre
        let k1 = sample_truck("K1", "T1");
        for bid in backend.all_bids().await {
            backend
                .seed_bid(sample_bid(&bid.id, &request, &k1, BidStatus::Delivered))
                .await;
        }
        let outcome = service
            .assign(&trucker(), &other, &assignment(&["K1"], Some(450)))
            .await
            .unwrap();
        assert_eq!(outcome.created.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_copy_of_accepted_request_is_refused() {
        let (backend, service, request) = setup().await;
        // Copia tomada cuando la solicitud aún estaba pendiente
        let stale = request.clone();
        let mut accepted = request.clone();
        accepted.status = BidStatus::Accepted;
        backend.seed_request(accepted).await;

        let result = service
            .assign(&trucker(), &stale, &assignment(&["K1"], Some(500)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(backend.call_count(Operation::LoadRequest).await, 1);
        assert_eq!(backend.call_count(Operation::CreateBid).await, 0);
    }

    #[tokio::test]
    async fn test_decline_removes_request_without_creating_bid() {
        let (backend, service, request) = setup().await;
        let mut board = TruckerBoard::default();
        board.replace_pending(vec![request]);

        assert!(service.decline(&trucker(), &mut board, "R1", Some("Too far")).await.unwrap());
        assert!(board.pending_requests.is_empty());
        assert!(!service.decline(&trucker(), &mut board, "R1", None).await.unwrap());

        assert!(backend.all_bids().await.is_empty());
        assert_eq!(backend.call_count(Operation::DeclineRequest).await, 1);
        assert!(backend.pending_requests(&trucker()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decline_survives_backend_failure() {
        let (backend, service, request) = setup().await;
        backend.fail(Operation::DeclineRequest, 1).await;
        let mut board = TruckerBoard::default();
        board.replace_pending(vec![request]);

        assert!(service.decline(&trucker(), &mut board, "R1", None).await.unwrap());
        assert!(board.pending_requests.is_empty());
    }

    #[tokio::test]
    async fn test_decline_reason_is_bounded() {
        let (_, service, _) = setup().await;
        let mut board = TruckerBoard::default();
        let reason = "x".repeat(MAX_DECLINE_REASON_LEN + 1);

        let result = service.decline(&trucker(), &mut board, "R1", Some(&reason)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
