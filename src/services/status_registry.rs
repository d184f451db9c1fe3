//! Registro de estados
//!
//! Fuente única del orden canónico del ciclo de vida, de sus metadatos de
//! presentación y del siguiente paso permitido para cada estado.

use serde::Serialize;

use crate::models::BidStatus;

/// Orden canónico; cada estado aparece exactamente una vez
pub const CANONICAL_ORDER: [BidStatus; 6] = [
    BidStatus::Bid,
    BidStatus::Pending,
    BidStatus::Accepted,
    BidStatus::Loaded,
    BidStatus::InTransit,
    BidStatus::Delivered,
];

/// Metadatos de presentación de un estado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDescriptor {
    pub label: &'static str,
    pub color_class: &'static str,
    pub next_status: Option<BidStatus>,
}

pub const UNKNOWN_STATUS: StatusDescriptor = StatusDescriptor {
    label: "Unknown Status",
    color_class: "bg-gray-300",
    next_status: None,
};

/// Siguiente estado permitido; `None` para `bid` y `delivered`
pub const fn next_status(status: BidStatus) -> Option<BidStatus> {
    match status {
        BidStatus::Bid => None,
        BidStatus::Pending => Some(BidStatus::Accepted),
        BidStatus::Accepted => Some(BidStatus::Loaded),
        BidStatus::Loaded => Some(BidStatus::InTransit),
        BidStatus::InTransit => Some(BidStatus::Delivered),
        BidStatus::Delivered => None,
    }
}

pub const fn descriptor(status: BidStatus) -> StatusDescriptor {
    let (label, color_class) = match status {
        BidStatus::Bid => ("Bid Placed", "bg-gray-500"),
        BidStatus::Pending => ("Pending", "bg-yellow-500"),
        BidStatus::Accepted => ("Accepted", "bg-blue-500"),
        BidStatus::Loaded => ("Loaded", "bg-indigo-500"),
        BidStatus::InTransit => ("In Transit", "bg-purple-500"),
        BidStatus::Delivered => ("Delivered", "bg-green-500"),
    };
    StatusDescriptor {
        label,
        color_class,
        next_status: next_status(status),
    }
}

/// Describe un estado tal como llega del backend; nunca falla
pub fn describe(raw: &str) -> StatusDescriptor {
    raw.parse::<BidStatus>()
        .map(descriptor)
        .unwrap_or(UNKNOWN_STATUS)
}

pub fn progress_index(status: BidStatus) -> usize {
    CANONICAL_ORDER
        .iter()
        .position(|s| *s == status)
        .unwrap_or_default()
}

/// Porcentaje completado: 0 en `bid`, 100 en `delivered`
pub fn progress_percent(status: BidStatus) -> f64 {
    progress_index(status) as f64 / (CANONICAL_ORDER.len() - 1) as f64 * 100.0
}
