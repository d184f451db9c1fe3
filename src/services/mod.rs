//! Services module
//!
//! Lógica de negocio del tablero de cargas. Los servicios trabajan sobre un
//! `LoadBoardBackend` compartido y reciben la sesión en cada llamada.

pub mod acceptance;
pub mod bid_lifecycle;
pub mod board;
pub mod board_poller;
pub mod fleet;
pub mod in_flight;
pub mod load_request_service;
pub mod negotiation;
pub mod status_registry;
pub mod truck_reconciler;

pub use acceptance::{AcceptanceOutcome, AcceptanceService, SiblingBidPolicy};
pub use bid_lifecycle::{BidLifecycleController, PartialFailurePolicy, StepOutcome, TransitionOutcome};
pub use board::{ClientBoard, TruckerBoard};
pub use board_poller::{BoardPoller, SharedBoard};
pub use fleet::FleetService;
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use load_request_service::LoadRequestService;
pub use negotiation::{AssignmentOutcome, AssignmentRequest, NegotiationService};
pub use truck_reconciler::TruckReconciler;
