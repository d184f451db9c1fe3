//! Vistas locales del tablero
//!
//! Copia en memoria de lo que ve cada cuenta: solicitudes pendientes y pujas
//! del transportista, pujas disponibles y aceptadas del cliente.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Bid, LoadRequest};

/// Tablero del transportista
#[derive(Debug, Clone, Default, Serialize)]
pub struct TruckerBoard {
    pub pending_requests: Vec<LoadRequest>,
    pub bids: Vec<Bid>,
    /// Rechazadas en esta sesión; no reaparecen al refrescar
    #[serde(skip)]
    declined: HashSet<String>,
}

impl TruckerBoard {
    pub fn replace_pending(&mut self, requests: Vec<LoadRequest>) {
        self.pending_requests = requests
            .into_iter()
            .filter(|r| !self.declined.contains(&r.id))
            .collect();
    }

    pub fn replace_bids(&mut self, bids: Vec<Bid>) {
        self.bids = bids;
    }

    /// Quita la solicitud de la vista; `false` si ya no estaba
    pub fn decline(&mut self, request_id: &str) -> bool {
        let newly_declined = self.declined.insert(request_id.to_string());
        let before = self.pending_requests.len();
        self.pending_requests.retain(|r| r.id != request_id);
        newly_declined || before != self.pending_requests.len()
    }

    pub fn is_declined(&self, request_id: &str) -> bool {
        self.declined.contains(request_id)
    }

    pub fn pending_request(&self, request_id: &str) -> Option<&LoadRequest> {
        self.pending_requests.iter().find(|r| r.id == request_id)
    }

    pub fn add_bids(&mut self, bids: impl IntoIterator<Item = Bid>) {
        self.bids.extend(bids);
    }

    /// Sustituye la copia local de una puja (tras una transición)
    pub fn upsert_bid(&mut self, bid: &Bid) {
        match self.bids.iter_mut().find(|b| b.id == bid.id) {
            Some(existing) => *existing = bid.clone(),
            None => self.bids.push(bid.clone()),
        }
    }
}

/// Tablero del cliente
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientBoard {
    pub available: Vec<Bid>,
    pub accepted: Vec<Bid>,
}

impl ClientBoard {
    /// Reparte las pujas: abiertas a `available`, el resto a `accepted`
    pub fn replace(&mut self, bids: Vec<Bid>) {
        let (available, accepted): (Vec<Bid>, Vec<Bid>) =
            bids.into_iter().partition(|b| b.status.is_open());
        self.available = available;
        self.accepted = accepted;
    }

    pub fn find(&self, bid_id: &str) -> Option<&Bid> {
        self.available
            .iter()
            .chain(self.accepted.iter())
            .find(|b| b.id == bid_id)
    }

    pub fn mark_accepted(&mut self, bid: Bid) {
        self.available.retain(|b| b.id != bid.id);
        self.accepted.retain(|b| b.id != bid.id);
        self.accepted.push(bid);
    }

    /// Sustituye la copia local de una puja y la coloca en la vista que le toca
    pub fn upsert_bid(&mut self, bid: &Bid) {
        self.available.retain(|b| b.id != bid.id);
        self.accepted.retain(|b| b.id != bid.id);
        if bid.status.is_open() {
            self.available.push(bid.clone());
        } else {
            self.accepted.push(bid.clone());
        }
    }

    pub fn remove_available(&mut self, bid_ids: &[String]) {
        self.available.retain(|b| !bid_ids.contains(&b.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fixtures::{sample_bid, sample_request, sample_truck};
    use crate::models::BidStatus;

    #[test]
    fn test_declined_requests_stay_hidden_after_refresh() {
        let mut board = TruckerBoard::default();
        board.replace_pending(vec![sample_request("R1", "C1", 1), sample_request("R2", "C1", 1)]);

        assert!(board.decline("R1"));
        assert!(!board.decline("R1"));

        board.replace_pending(vec![sample_request("R1", "C1", 1), sample_request("R2", "C1", 1)]);
        assert_eq!(board.pending_requests.len(), 1);
        assert_eq!(board.pending_requests[0].id, "R2");
    }

    #[test]
    fn test_client_board_partition_and_accept() {
        let request = sample_request("R7", "C1", 2);
        let truck = sample_truck("K1", "T1");
        let mut board = ClientBoard::default();
        board.replace(vec![
            sample_bid("B1", &request, &truck, BidStatus::Pending),
            sample_bid("B2", &request, &truck, BidStatus::Loaded),
        ]);
        assert_eq!(board.available.len(), 1);
        assert_eq!(board.accepted.len(), 1);

        let mut accepted = board.find("B1").cloned().unwrap();
        accepted.status = BidStatus::Accepted;
        board.mark_accepted(accepted);

        assert!(board.available.is_empty());
        assert!(board.accepted.iter().any(|b| b.id == "B1"));
    }

    #[test]
    fn test_client_board_upsert_replaces_stale_copy() {
        let request = sample_request("R7", "C1", 1);
        let truck = sample_truck("K1", "T1");
        let mut board = ClientBoard::default();
        board.replace(vec![sample_bid("B1", &request, &truck, BidStatus::Accepted)]);

        board.upsert_bid(&sample_bid("B1", &request, &truck, BidStatus::Loaded));

        assert!(board.available.is_empty());
        assert_eq!(board.accepted.len(), 1);
        assert_eq!(board.find("B1").map(|b| b.status), Some(BidStatus::Loaded));
    }
}
