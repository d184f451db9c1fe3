//! Cliente HTTP para el backend del marketplace
//!
//! Implementa `LoadBoardBackend` sobre reqwest. Cada llamada lleva el token
//! bearer de la sesión y un timeout; una sesión sin token no sale a la red.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::backend::LoadBoardBackend;
use crate::models::{
    Bid, BidStatus, LoadRequest, NewBid, NewLoadRequest, NewTruck, Session, Truck,
    TruckStatusUpdate,
};
use crate::utils::errors::{AppError, AppResult};

/// Cliente HTTP para la API REST de solicitudes, pujas y camiones
#[derive(Clone)]
pub struct RestBackendClient {
    client: Client,
    base_url: String,
}

impl RestBackendClient {
    /// Crear nuevo cliente HTTP con URL base y timeout configurables
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("LoadBoard/1.0")
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, session: &Session) -> AppResult<RequestBuilder> {
        let token = session.bearer()?;
        let url = format!("{}{}", self.base_url, path);
        log::debug!("🌐 {} {}", method, url);

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> AppResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("❌ Backend respondió {}: {}", status, body);

        Err(match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthenticated(body),
            StatusCode::FORBIDDEN => AppError::Unauthorized(body),
            StatusCode::NOT_FOUND => AppError::NotFound(body),
            StatusCode::CONFLICT => AppError::Conflict(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(body),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AppError::Timeout(body),
            _ => AppError::Backend {
                status: status.as_u16(),
                message: body,
            },
        })
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn status_query(status: Option<BidStatus>) -> Vec<(&'static str, &'static str)> {
    status.map(|s| vec![("status", s.as_str())]).unwrap_or_default()
}

#[async_trait]
impl LoadBoardBackend for RestBackendClient {
    async fn pending_requests(&self, session: &Session) -> AppResult<Vec<LoadRequest>> {
        let request = self.request(Method::GET, "/requests/pending", session)?;
        self.send_json(request).await
    }

    async fn load_request(&self, session: &Session, request_id: &str) -> AppResult<LoadRequest> {
        let request = self.request(Method::GET, &format!("/requests/{}", segment(request_id)), session)?;
        self.send_json(request).await
    }

    async fn create_load_request(&self, session: &Session, new_request: &NewLoadRequest) -> AppResult<LoadRequest> {
        let request = self.request(Method::POST, "/requests", session)?.json(new_request);
        self.send_json(request).await
    }

    async fn update_request_status(
        &self,
        session: &Session,
        request_id: &str,
        bid_id: &str,
        status: BidStatus,
    ) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("/requests/{}/status", segment(request_id)), session)?
            .json(&json!({ "status": status, "bidId": bid_id }));
        self.send_empty(request).await
    }

    async fn decline_request(&self, session: &Session, request_id: &str, reason: Option<&str>) -> AppResult<()> {
        let request = self
            .request(Method::POST, &format!("/requests/{}/decline", segment(request_id)), session)?
            .json(&json!({ "reason": reason }));
        self.send_empty(request).await
    }

    async fn trucker_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>> {
        let request = self
            .request(Method::GET, "/bids/trucker", session)?
            .query(&status_query(status));
        self.send_json(request).await
    }

    async fn client_bids(&self, session: &Session, status: Option<BidStatus>) -> AppResult<Vec<Bid>> {
        let request = self
            .request(Method::GET, "/bids/client", session)?
            .query(&status_query(status));
        self.send_json(request).await
    }

    async fn request_bids(&self, session: &Session, request_id: &str) -> AppResult<Vec<Bid>> {
        let request = self.request(Method::GET, &format!("/requests/{}/bids", segment(request_id)), session)?;
        self.send_json(request).await
    }

    async fn bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid> {
        let request = self.request(Method::GET, &format!("/bids/{}", segment(bid_id)), session)?;
        self.send_json(request).await
    }

    async fn create_bid(&self, session: &Session, bid: &NewBid) -> AppResult<Bid> {
        let request = self.request(Method::POST, "/bids", session)?.json(bid);
        self.send_json(request).await
    }

    async fn update_bid_status(&self, session: &Session, bid_id: &str, status: BidStatus) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("/bids/{}/status", segment(bid_id)), session)?
            .json(&json!({ "status": status }));
        self.send_empty(request).await
    }

    async fn accept_bid(&self, session: &Session, bid_id: &str) -> AppResult<Bid> {
        let request = self.request(Method::POST, &format!("/bids/{}/accept", segment(bid_id)), session)?;
        self.send_json(request).await
    }

    async fn reject_bid(&self, session: &Session, bid_id: &str) -> AppResult<()> {
        let request = self.request(Method::POST, &format!("/bids/{}/reject", segment(bid_id)), session)?;
        self.send_empty(request).await
    }

    async fn trucks(&self, session: &Session) -> AppResult<Vec<Truck>> {
        let request = self.request(Method::GET, "/trucks", session)?;
        self.send_json(request).await
    }

    async fn add_truck(&self, session: &Session, truck: &NewTruck) -> AppResult<Truck> {
        let request = self.request(Method::POST, "/trucks", session)?.json(truck);
        self.send_json(request).await
    }

    async fn update_truck_status(
        &self,
        session: &Session,
        truck_id: &str,
        update: &TruckStatusUpdate,
    ) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("/trucks/{}/status", segment(truck_id)), session)?
            .json(update);
        self.send_empty(request).await
    }

    async fn delete_truck(&self, session: &Session, truck_id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("/trucks/{}", segment(truck_id)), session)?;
        self.send_empty(request).await
    }
}
