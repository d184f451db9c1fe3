use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Bid, BidStatus};
use crate::services::status_registry::{describe, progress_index, progress_percent};
use crate::services::{AssignmentRequest, TransitionOutcome};
use crate::utils::errors::AppResult;

/// Envoltorio estándar de las respuestas
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// Body de asignación de camiones
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTrucksBody {
    pub truck_ids: Vec<String>,
    pub negotiation_price: Option<Decimal>,
}

impl From<AssignTrucksBody> for AssignmentRequest {
    fn from(body: AssignTrucksBody) -> Self {
        Self {
            truck_ids: body.truck_ids,
            negotiation_price: body.negotiation_price,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeclineBody {
    pub reason: Option<String>,
}

/// `?status=` en los listados de pujas
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn parse(&self) -> AppResult<Option<BidStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPollingBody {
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfoResponse {
    pub status: String,
    pub label: &'static str,
    pub color_class: &'static str,
    pub next_status: Option<BidStatus>,
    pub progress_index: Option<usize>,
    pub progress_percent: Option<f64>,
}

impl StatusInfoResponse {
    /// Un estado desconocido se describe igualmente, sin progreso
    pub fn from_raw(raw: &str) -> Self {
        let descriptor = describe(raw);
        let status = raw.parse::<BidStatus>().ok();
        Self {
            status: status.map_or_else(|| raw.to_string(), |s| s.as_str().to_string()),
            label: descriptor.label,
            color_class: descriptor.color_class,
            next_status: descriptor.next_status,
            progress_index: status.map(progress_index),
            progress_percent: status.map(progress_percent),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub bid: Bid,
    /// `None` si la puja ya estaba en un estado final
    pub transition: Option<TransitionOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingResponse {
    pub account_id: String,
    pub running: bool,
    pub interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_info_for_known_and_unknown() {
        let info = StatusInfoResponse::from_raw("In Transit");
        assert_eq!(info.status, "in transit");
        assert_eq!(info.label, "In Transit");
        assert_eq!(info.next_status, Some(BidStatus::Delivered));
        assert_eq!(info.progress_index, Some(4));

        let info = StatusInfoResponse::from_raw("cancelled");
        assert_eq!(info.label, "Unknown Status");
        assert_eq!(info.color_class, "bg-gray-300");
        assert_eq!(info.progress_percent, None);
    }

    #[test]
    fn test_status_query() {
        assert_eq!(StatusQuery::default().parse().unwrap(), None);
        let query = StatusQuery {
            status: Some("accepted".to_string()),
        };
        assert_eq!(query.parse().unwrap(), Some(BidStatus::Accepted));
        let query = StatusQuery {
            status: Some("lost".to_string()),
        };
        assert!(query.parse().is_err());
    }

    #[test]
    fn test_assign_body_uses_camel_case() {
        let body: AssignTrucksBody =
            serde_json::from_str(r#"{"truckIds":["K1","K2"],"negotiationPrice":"500"}"#).unwrap();
        let request = AssignmentRequest::from(body);
        assert_eq!(request.truck_ids.len(), 2);
        assert_eq!(request.negotiation_price, Some(Decimal::from(500)));
    }
}
