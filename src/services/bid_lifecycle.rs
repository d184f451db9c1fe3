//! Controlador del ciclo de vida de una puja
//!
//! Ejecuta una transición hacia delante y mantiene sincronizado el estado
//! dependiente. Orden de una transición:
//!
//! 1. estado de la puja en el backend (si falla, se aborta todo)
//! 2. copia local de la puja
//! 3. estado del camión (reconciliador)
//! 4. estado espejo del registro de solicitud
//!
//! Los pasos 3 y 4 se reintentan con backoff. Si aun así fallan, la
//! transición queda parcialmente aplicada y se informa en
//! `TransitionOutcome`; se puede reanudar (`resume`) o deshacer
//! (`compensate`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::status_registry::next_status;
use super::truck_reconciler::TruckReconciler;
use crate::clients::LoadBoardBackend;
use crate::models::{AccountType, Bid, BidStatus, Session};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::retry::RetryPolicy;

/// Qué hacer automáticamente cuando una transición queda a medias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailurePolicy {
    /// Devolver el resultado parcial al llamador
    #[default]
    Report,
    /// Deshacer la transición (estado anterior en puja, camión y espejo)
    Compensate,
}

impl FromStr for PartialFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "compensate" => Ok(Self::Compensate),
            other => Err(AppError::Config(format!("Unknown partial failure policy '{}'", other))),
        }
    }
}

/// Pasos secundarios de una transición
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    TruckReconciliation,
    RequestMirror,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Failed { reason: String, attempts: u32 },
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// Resultado visible de una transición
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub bid_id: String,
    pub request_id: String,
    pub truck_id: String,
    pub previous: BidStatus,
    pub current: BidStatus,
    pub truck_sync: StepOutcome,
    pub mirror_sync: StepOutcome,
    pub compensated: bool,
    /// Motivo por el que no se pudo deshacer la transición
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensation_error: Option<String>,
}

impl TransitionOutcome {
    /// Algún paso secundario sigue sin aplicarse
    pub fn is_partial(&self) -> bool {
        self.truck_sync.is_failed() || self.mirror_sync.is_failed()
    }

    pub fn failed_steps(&self) -> Vec<SyncStep> {
        let mut steps = Vec::new();
        if self.truck_sync.is_failed() {
            steps.push(SyncStep::TruckReconciliation);
        }
        if self.mirror_sync.is_failed() {
            steps.push(SyncStep::RequestMirror);
        }
        steps
    }
}

/// Solo las partes de la puja (o un administrador) pueden moverla
pub fn ensure_participant(session: &Session, bid: &Bid) -> AppResult<()> {
    session.bearer()?;
    let is_party = session.account_id == bid.trucker_id || session.account_id == bid.client_id;
    if is_party || session.account_type == AccountType::Admin {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("Bid '{}' belongs to another account", bid.id)))
    }
}

pub struct BidLifecycleController {
    backend: Arc<dyn LoadBoardBackend>,
    reconciler: TruckReconciler,
    retry: RetryPolicy,
    on_partial: PartialFailurePolicy,
}

impl BidLifecycleController {
    pub fn new(backend: Arc<dyn LoadBoardBackend>, retry: RetryPolicy, on_partial: PartialFailurePolicy) -> Self {
        Self {
            reconciler: TruckReconciler::new(backend.clone()),
            backend,
            retry,
            on_partial,
        }
    }

    /// La acción de avanzar solo se ofrece fuera de `pending` y si hay siguiente estado
    pub fn can_advance(bid: &Bid) -> bool {
        bid.status != BidStatus::Pending && next_status(bid.status).is_some()
    }

    /// Avanza la puja un paso. `Ok(None)` cuando no hay nada que avanzar.
    pub async fn advance(&self, session: &Session, bid: &mut Bid) -> AppResult<Option<TransitionOutcome>> {
        ensure_participant(session, bid)?;

        let Some(next) = next_status(bid.status) else {
            tracing::debug!("⏸️ Puja {} en '{}': nada que avanzar", bid.id, bid.status);
            return Ok(None);
        };

        if bid.status == BidStatus::Pending {
            return Err(AppError::Validation(
                "Pending bids move forward only when the client accepts them".to_string(),
            ));
        }

        if next == BidStatus::Loaded {
            self.ensure_truck_free(session, bid).await?;
        }

        self.transition(session, bid, next).await.map(Some)
    }

    /// Un camión lleva como mucho una carga a la vez.
    ///
    /// Solo se comprueba cuando la sesión puede ver la flota (transportista
    /// o administrador).
    async fn ensure_truck_free(&self, session: &Session, bid: &Bid) -> AppResult<()> {
        if session.account_type == AccountType::Client {
            return Ok(());
        }
        let fleet = self.backend.trucks(session).await?;
        let load = fleet
            .iter()
            .find(|t| t.id == bid.truck_id)
            .and_then(|t| t.current_load.as_ref());

        match load {
            Some(load) if load.bid_id != bid.id => {
                tracing::warn!(
                    "🚛 Camión {} ocupado con la puja {}; {} no se carga",
                    bid.truck_id,
                    load.bid_id,
                    bid.id
                );
                Err(AppError::Conflict(format!(
                    "Truck '{}' is already carrying bid '{}'",
                    bid.truck_id, load.bid_id
                )))
            }
            _ => Ok(()),
        }
    }

    async fn transition(&self, session: &Session, bid: &mut Bid, next: BidStatus) -> AppResult<TransitionOutcome> {
        let previous = bid.status;

        if let Err(e) = self.backend.update_bid_status(session, &bid.id, next).await {
            tracing::error!("❌ No se pudo mover la puja {} a '{}': {}", bid.id, next, e);
            return Err(e);
        }
        bid.status = next;

        let truck_sync = self.sync_truck(session, bid, next).await;
        let mirror_sync = self.sync_mirror(session, bid, next).await;

        let outcome = TransitionOutcome {
            bid_id: bid.id.clone(),
            request_id: bid.request_id.clone(),
            truck_id: bid.truck_id.clone(),
            previous,
            current: next,
            truck_sync,
            mirror_sync,
            compensated: false,
            compensation_error: None,
        };

        if !outcome.is_partial() {
            tracing::info!("✅ Puja {}: '{}' -> '{}'", bid.id, previous, next);
            return Ok(outcome);
        }

        tracing::warn!(
            "⚠️ Puja {} movida a '{}' con pasos pendientes: {:?}",
            bid.id,
            next,
            outcome.failed_steps()
        );

        match self.on_partial {
            PartialFailurePolicy::Report => Ok(outcome),
            PartialFailurePolicy::Compensate => self.compensate(session, bid, &outcome).await,
        }
    }

    async fn sync_truck(&self, session: &Session, bid: &Bid, status: BidStatus) -> StepOutcome {
        let load = bid.current_load();
        let result = self
            .retry
            .run("sincronización de camión", || {
                self.reconciler.reconcile(session, &bid.truck_id, status, Some(&load))
            })
            .await;
        to_step_outcome(result)
    }

    async fn sync_mirror(&self, session: &Session, bid: &Bid, status: BidStatus) -> StepOutcome {
        let result = self
            .retry
            .run("estado espejo de la solicitud", || {
                self.backend
                    .update_request_status(session, &bid.request_id, &bid.id, status)
            })
            .await;
        if let Err((e, _)) = &result {
            tracing::error!("❌ Estado espejo de {} sin actualizar: {}", bid.request_id, e);
        }
        to_step_outcome(result)
    }

    /// Reintenta solo los pasos que fallaron en `outcome`
    pub async fn resume(&self, session: &Session, bid: &Bid, outcome: &TransitionOutcome) -> AppResult<TransitionOutcome> {
        ensure_participant(session, bid)?;
        if bid.id != outcome.bid_id || bid.status != outcome.current {
            return Err(AppError::Conflict(format!(
                "Bid '{}' is no longer at '{}'",
                bid.id, outcome.current
            )));
        }

        let truck_sync = if outcome.truck_sync.is_failed() {
            self.sync_truck(session, bid, outcome.current).await
        } else {
            StepOutcome::Applied
        };
        let mirror_sync = if outcome.mirror_sync.is_failed() {
            self.sync_mirror(session, bid, outcome.current).await
        } else {
            StepOutcome::Applied
        };

        let resumed = TransitionOutcome {
            truck_sync,
            mirror_sync,
            compensation_error: None,
            ..outcome.clone()
        };
        if resumed.is_partial() {
            tracing::warn!("⚠️ Puja {} sigue parcialmente aplicada", bid.id);
        } else {
            tracing::info!("✅ Puja {}: transición completada al reanudar", bid.id);
        }
        Ok(resumed)
    }

    /// Acción compensatoria: devuelve puja, camión y espejo al estado anterior.
    ///
    /// Si la puja no se puede devolver a su estado anterior, el resultado es
    /// el de `outcome` (sigue parcial, se puede reanudar) con
    /// `compensation_error` informado.
    pub async fn compensate(
        &self,
        session: &Session,
        bid: &mut Bid,
        outcome: &TransitionOutcome,
    ) -> AppResult<TransitionOutcome> {
        ensure_participant(session, bid)?;
        let previous = outcome.previous;

        let reverted = self
            .retry
            .run("compensación de puja", || {
                self.backend.update_bid_status(session, &bid.id, previous)
            })
            .await;
        if let Err((e, attempts)) = reverted {
            tracing::error!(
                "❌ No se pudo compensar la puja {} tras {} intento(s): {}",
                bid.id,
                attempts,
                e
            );
            return Ok(TransitionOutcome {
                compensated: false,
                compensation_error: Some(e.to_string()),
                ..outcome.clone()
            });
        }
        bid.status = previous;

        // Solo se deshace lo que llegó a aplicarse
        let truck_sync = if outcome.truck_sync.is_failed() {
            StepOutcome::Applied
        } else {
            self.sync_truck(session, bid, previous).await
        };
        let mirror_sync = if outcome.mirror_sync.is_failed() {
            StepOutcome::Applied
        } else {
            self.sync_mirror(session, bid, previous).await
        };

        tracing::warn!("↩️ Puja {} devuelta a '{}'", bid.id, previous);
        Ok(TransitionOutcome {
            current: previous,
            truck_sync,
            mirror_sync,
            compensated: true,
            compensation_error: None,
            ..outcome.clone()
        })
    }
}

pub(crate) fn to_step_outcome<T>(result: Result<T, (AppError, u32)>) -> StepOutcome {
    match result {
        Ok(_) => StepOutcome::Applied,
        Err((e, attempts)) => StepOutcome::Failed {
            reason: e.to_string(),
            attempts,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fixtures::{sample_bid, sample_request, sample_truck};
    use crate::clients::{MemoryBackend, Operation};
    use crate::models::TruckStatus;
    use std::time::Duration;

    fn trucker() -> Session {
        Session::new("tok", "T1", AccountType::Trucker)
    }

    async fn setup(status: BidStatus, policy: PartialFailurePolicy) -> (MemoryBackend, BidLifecycleController, Bid) {
        let backend = MemoryBackend::new();
        let request = sample_request("R1", "C1", 1);
        let truck = sample_truck("K1", "T1");
        let bid = sample_bid("B1", &request, &truck, status);
        backend.seed_request(request).await;
        backend.seed_truck(truck).await;
        backend.seed_bid(bid.clone()).await;

        let controller = BidLifecycleController::new(
            Arc::new(backend.clone()),
            RetryPolicy::new(2, Duration::ZERO),
            policy,
        );
        (backend, controller, bid)
    }

    #[test]
    fn test_can_advance_guard() {
        let request = sample_request("R1", "C1", 1);
        let truck = sample_truck("K1", "T1");
        let guard = |status| BidLifecycleController::can_advance(&sample_bid("B1", &request, &truck, status));

        assert!(!guard(BidStatus::Bid));
        assert!(!guard(BidStatus::Pending));
        assert!(guard(BidStatus::Accepted));
        assert!(guard(BidStatus::Loaded));
        assert!(guard(BidStatus::InTransit));
        assert!(!guard(BidStatus::Delivered));
    }

    #[tokio::test]
    async fn test_advance_follows_canonical_order_to_delivered() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        let session = trucker();

        let mut seen = vec![bid.status];
        while let Some(outcome) = controller.advance(&session, &mut bid).await.unwrap() {
            assert!(!outcome.is_partial());
            assert_eq!(outcome.current, bid.status);
            seen.push(bid.status);
        }

        assert_eq!(
            seen,
            vec![BidStatus::Accepted, BidStatus::Loaded, BidStatus::InTransit, BidStatus::Delivered]
        );
        assert_eq!(backend.bid_snapshot("B1").await.unwrap().status, BidStatus::Delivered);
        assert_eq!(backend.mirrored_status("R1", "B1").await, Some(BidStatus::Delivered));
    }

    #[tokio::test]
    async fn test_advance_is_noop_at_bid_and_delivered() {
        for status in [BidStatus::Bid, BidStatus::Delivered] {
            let (backend, controller, mut bid) = setup(status, PartialFailurePolicy::Report).await;
            assert!(controller.advance(&trucker(), &mut bid).await.unwrap().is_none());
            assert_eq!(bid.status, status);
            assert_eq!(backend.call_count(Operation::UpdateBidStatus).await, 0);
        }
    }

    #[tokio::test]
    async fn test_pending_is_not_advanced_generically() {
        let (backend, controller, mut bid) = setup(BidStatus::Pending, PartialFailurePolicy::Report).await;
        let result = controller.advance(&trucker(), &mut bid).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(backend.call_count(Operation::UpdateBidStatus).await, 0);
    }

    #[tokio::test]
    async fn test_truck_follows_bid_status() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        let session = trucker();

        controller.advance(&session, &mut bid).await.unwrap();
        let truck = backend.truck_snapshot("K1").await.unwrap();
        assert_eq!(truck.status, TruckStatus::Loaded);
        assert_eq!(truck.current_load.map(|l| l.bid_id), Some("B1".to_string()));

        controller.advance(&session, &mut bid).await.unwrap();
        assert_eq!(backend.truck_snapshot("K1").await.unwrap().status, TruckStatus::Loaded);

        controller.advance(&session, &mut bid).await.unwrap();
        let truck = backend.truck_snapshot("K1").await.unwrap();
        assert_eq!(truck.status, TruckStatus::Standby);
        assert!(truck.current_load.is_none());
    }

    #[tokio::test]
    async fn test_primary_write_failure_aborts_everything() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        backend.fail(Operation::UpdateBidStatus, 1).await;

        assert!(controller.advance(&trucker(), &mut bid).await.is_err());
        assert_eq!(bid.status, BidStatus::Accepted);
        assert_eq!(backend.call_count(Operation::UpdateTruckStatus).await, 0);
        assert_eq!(backend.call_count(Operation::UpdateRequestStatus).await, 0);
    }

    #[tokio::test]
    async fn test_transient_secondary_failure_is_retried() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        backend.fail(Operation::UpdateTruckStatus, 1).await;

        let outcome = controller.advance(&trucker(), &mut bid).await.unwrap().unwrap();
        assert!(!outcome.is_partial());
        assert_eq!(backend.call_count(Operation::UpdateTruckStatus).await, 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_and_resumable() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        backend.fail(Operation::UpdateRequestStatus, 2).await;
        let session = trucker();

        let outcome = controller.advance(&session, &mut bid).await.unwrap().unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.failed_steps(), vec![SyncStep::RequestMirror]);
        assert_eq!(bid.status, BidStatus::Loaded);
        assert_eq!(backend.bid_snapshot("B1").await.unwrap().status, BidStatus::Loaded);
        assert_eq!(backend.mirrored_status("R1", "B1").await, None);

        let resumed = controller.resume(&session, &bid, &outcome).await.unwrap();
        assert!(!resumed.is_partial());
        assert_eq!(backend.mirrored_status("R1", "B1").await, Some(BidStatus::Loaded));
        // El camión ya estaba sincronizado: no se vuelve a tocar
        assert_eq!(backend.call_count(Operation::UpdateTruckStatus).await, 1);
    }

    #[tokio::test]
    async fn test_compensate_policy_reverts_transition() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Compensate).await;
        backend.fail(Operation::UpdateRequestStatus, 2).await;

        let outcome = controller.advance(&trucker(), &mut bid).await.unwrap().unwrap();

        assert!(outcome.compensated);
        assert!(!outcome.is_partial());
        assert_eq!(outcome.current, BidStatus::Accepted);
        assert_eq!(bid.status, BidStatus::Accepted);
        assert_eq!(backend.bid_snapshot("B1").await.unwrap().status, BidStatus::Accepted);
        assert_eq!(backend.truck_snapshot("K1").await.unwrap().status, TruckStatus::Standby);
    }

    #[tokio::test]
    async fn test_failed_revert_keeps_transition_partial_and_resumable() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Compensate).await;
        backend.fail(Operation::UpdateRequestStatus, 2).await;
        // La escritura hacia delante pasa; las dos de compensación fallan
        backend.fail_after(Operation::UpdateBidStatus, 1, 2).await;
        let session = trucker();

        let outcome = controller.advance(&session, &mut bid).await.unwrap().unwrap();

        assert!(!outcome.compensated);
        assert!(outcome.compensation_error.is_some());
        assert!(outcome.is_partial());
        assert_eq!(outcome.current, BidStatus::Loaded);
        assert_eq!(bid.status, BidStatus::Loaded);
        assert_eq!(backend.bid_snapshot("B1").await.unwrap().status, BidStatus::Loaded);

        let resumed = controller.resume(&session, &bid, &outcome).await.unwrap();
        assert!(!resumed.is_partial());
        assert!(resumed.compensation_error.is_none());
        assert_eq!(backend.mirrored_status("R1", "B1").await, Some(BidStatus::Loaded));
    }

    #[tokio::test]
    async fn test_truck_carrying_another_bid_is_not_loaded_again() {
        let (backend, controller, mut first) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        let other = sample_request("R2", "C2", 1);
        let truck = sample_truck("K1", "T1");
        let mut second = sample_bid("B2", &other, &truck, BidStatus::Accepted);
        backend.seed_request(other).await;
        backend.seed_bid(second.clone()).await;
        let session = trucker();

        controller.advance(&session, &mut first).await.unwrap();
        let result = controller.advance(&session, &mut second).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(second.status, BidStatus::Accepted);
        assert_eq!(backend.bid_snapshot("B2").await.unwrap().status, BidStatus::Accepted);
        let truck = backend.truck_snapshot("K1").await.unwrap();
        assert_eq!(truck.current_load.map(|l| l.bid_id), Some("B1".to_string()));

        // Entregada la primera, la segunda ya puede cargarse
        controller.advance(&session, &mut first).await.unwrap();
        controller.advance(&session, &mut first).await.unwrap();
        let outcome = controller.advance(&session, &mut second).await.unwrap().unwrap();
        assert_eq!(outcome.current, BidStatus::Loaded);
    }

    #[tokio::test]
    async fn test_outsider_cannot_advance() {
        let (backend, controller, mut bid) = setup(BidStatus::Accepted, PartialFailurePolicy::Report).await;
        let outsider = Session::new("tok", "T9", AccountType::Trucker);

        assert!(matches!(
            controller.advance(&outsider, &mut bid).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(backend.calls().await.is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Compensate".parse::<PartialFailurePolicy>().unwrap(), PartialFailurePolicy::Compensate);
        assert!("rollback".parse::<PartialFailurePolicy>().is_err());
    }
}
