//! Aceptación de pujas por el cliente

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::bid_lifecycle::{to_step_outcome, StepOutcome};
use super::board::ClientBoard;
use crate::clients::LoadBoardBackend;
use crate::models::{AccountType, Bid, BidStatus, Session};
use crate::utils::errors::{AppError, AppResult};

/// Qué pasa con las otras pujas abiertas de la misma solicitud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingBidPolicy {
    #[default]
    Keep,
    Reject,
}

impl FromStr for SiblingBidPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::Config(format!("Unknown sibling bid policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceOutcome {
    pub accepted: Bid,
    pub mirror_sync: StepOutcome,
    pub rejected_siblings: Vec<String>,
    pub sibling_failures: Vec<String>,
}

pub struct AcceptanceService {
    backend: Arc<dyn LoadBoardBackend>,
    policy: SiblingBidPolicy,
}

impl AcceptanceService {
    pub fn new(backend: Arc<dyn LoadBoardBackend>, policy: SiblingBidPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> SiblingBidPolicy {
        self.policy
    }

    /// Acepta la puja `bid_id` y la mueve de `available` a `accepted`.
    ///
    /// Una solicitud acepta como mucho una puja por camión pedido
    /// (`number_of_trucks`): con todos los huecos cubiertos se devuelve
    /// conflicto sin escribir nada.
    pub async fn accept(&self, session: &Session, bid_id: &str, board: &mut ClientBoard) -> AppResult<AcceptanceOutcome> {
        session.require(AccountType::Client)?;

        let bid = match board.find(bid_id) {
            Some(bid) => bid.clone(),
            None => self.backend.bid(session, bid_id).await?,
        };
        if session.account_type != AccountType::Admin && bid.client_id != session.account_id {
            return Err(AppError::Unauthorized(format!("Bid '{}' belongs to another client", bid_id)));
        }

        let (request, siblings) = tokio::try_join!(
            self.backend.load_request(session, &bid.request_id),
            self.backend.request_bids(session, &bid.request_id)
        )?;

        // El tablero puede ir por detrás del backend
        let status = siblings
            .iter()
            .find(|b| b.id == bid.id)
            .map_or(bid.status, |b| b.status);
        if !status.is_open() {
            return Err(AppError::Conflict(format!("Bid '{}' is already {}", bid_id, status)));
        }

        let slots = request.number_of_trucks as usize;
        let taken = siblings
            .iter()
            .filter(|b| b.id != bid.id && !b.status.is_open())
            .count();
        if taken >= slots {
            return Err(AppError::Conflict(format!(
                "Request '{}' already has {} accepted bid(s) for {} truck(s)",
                bid.request_id, taken, slots
            )));
        }

        let mut accepted = self.backend.accept_bid(session, bid_id).await.map_err(|e| {
            tracing::error!("❌ Error aceptando la puja {}: {}", bid_id, e);
            e
        })?;
        accepted.status = BidStatus::Accepted;

        let mirror = self
            .backend
            .update_request_status(session, &accepted.request_id, &accepted.id, BidStatus::Accepted)
            .await
            .map_err(|e| (e, 1));
        if let Err((e, _)) = &mirror {
            tracing::warn!("⚠️ Estado espejo de {} sin actualizar: {}", accepted.request_id, e);
        }
        let mirror_sync = to_step_outcome(mirror);

        let filled = taken + 1 >= slots;
        let (rejected_siblings, sibling_failures) = match self.policy {
            SiblingBidPolicy::Reject if filled => {
                let open: Vec<&Bid> = siblings
                    .iter()
                    .filter(|b| b.id != accepted.id && b.status.is_open())
                    .collect();
                self.reject_siblings(session, &open).await
            }
            _ => (Vec::new(), Vec::new()),
        };

        board.remove_available(&rejected_siblings);
        board.mark_accepted(accepted.clone());

        tracing::info!(
            "🤝 Puja {} aceptada para la solicitud {} ({} hermana(s) rechazada(s))",
            accepted.id,
            accepted.request_id,
            rejected_siblings.len()
        );
        Ok(AcceptanceOutcome {
            accepted,
            mirror_sync,
            rejected_siblings,
            sibling_failures,
        })
    }

    async fn reject_siblings(&self, session: &Session, open: &[&Bid]) -> (Vec<String>, Vec<String>) {
        let results = join_all(open.iter().map(|bid| async move {
            (bid.id.clone(), self.backend.reject_bid(session, &bid.id).await)
        }))
        .await;

        let mut rejected = Vec::new();
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => rejected.push(id),
                Err(e) => {
                    tracing::warn!("⚠️ Puja hermana {} no rechazada: {}", id, e);
                    failed.push(id);
                }
            }
        }
        (rejected, failed)
    }
}
