//! HTTP client for the shipment REST API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::api::dto::{
    CreateShipmentRequest, HealthResponse, SetStatusRequest, ShipmentEnvelope,
    ShipmentListResponse,
};
use crate::domain::entities::{Shipment, ShipmentFilter, ShipmentStatus};
use crate::domain::repositories::StatusSource;
use crate::error::{AppError, ErrorBody};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message} ({status}, {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { message } => AppError::not_found(message, json!({})),
            ClientError::Api {
                status: 400,
                message,
                ..
            } => AppError::bad_request(message, json!({})),
            ClientError::Api {
                status: 401,
                message,
                ..
            } => AppError::unauthorized(message, json!({})),
            other => AppError::internal(other.to_string(), json!({})),
        }
    }
}

/// Talks to a running shipment service.
///
/// Admin calls need `token`; [`ApiClient::get`] and [`ApiClient::health`] work
/// without one.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            http: Client::new(),
            base,
            token,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.error.code, body.error.message),
            Err(_) => (
                "unknown".to_string(),
                status.canonical_reason().unwrap_or("Request failed").to_string(),
            ),
        };

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound { message });
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        Self::send(self.request(Method::GET, &["health"])).await
    }

    pub async fn create(&self, request: &CreateShipmentRequest) -> Result<Shipment, ClientError> {
        let envelope: ShipmentEnvelope =
            Self::send(self.request(Method::POST, &["api", "shipments"]).json(request)).await?;
        Ok(envelope.shipment)
    }

    pub async fn get(&self, tracking: &str) -> Result<Shipment, ClientError> {
        let envelope: ShipmentEnvelope =
            Self::send(self.request(Method::GET, &["api", "shipments", tracking])).await?;
        Ok(envelope.shipment)
    }

    pub async fn list(&self, filter: &ShipmentFilter) -> Result<ShipmentListResponse, ClientError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(q) = filter.query.as_deref() {
            query.push(("q", q));
        }
        if let Some(status) = filter.status {
            query.push(("status", status.as_str()));
        }

        Self::send(self.request(Method::GET, &["api", "shipments"]).query(&query)).await
    }

    pub async fn advance(&self, tracking: &str) -> Result<Shipment, ClientError> {
        let envelope: ShipmentEnvelope = Self::send(self.request(
            Method::POST,
            &["api", "shipments", tracking, "advance"],
        ))
        .await?;
        Ok(envelope.shipment)
    }

    pub async fn set_status(
        &self,
        tracking: &str,
        status: ShipmentStatus,
        note: Option<String>,
    ) -> Result<Shipment, ClientError> {
        let body = SetStatusRequest {
            status: status.to_string(),
            note,
        };
        let envelope: ShipmentEnvelope = Self::send(
            self.request(Method::PUT, &["api", "shipments", tracking, "status"])
                .json(&body),
        )
        .await?;
        Ok(envelope.shipment)
    }

    pub async fn delete(&self, tracking: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &["api", "shipments", tracking])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(&self, tracking: &str) -> Result<Shipment, AppError> {
        Ok(self.get(tracking).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(ApiClient::new("not a url", None).is_err());
        assert!(ApiClient::new("ftp://example.com", None).is_err());
        assert!(ApiClient::new("http://localhost:3000", None).is_ok());
    }

    #[test]
    fn test_url_escapes_segments() {
        let client = ApiClient::new("http://localhost:3000/", None).unwrap();
        let url = client.url(&["api", "shipments", "SHP 1/2"]);
        assert_eq!(url.as_str(), "http://localhost:3000/api/shipments/SHP%201%2F2");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = ApiClient::new("http://example.com/ship", None).unwrap();
        let url = client.url(&["health"]);
        assert_eq!(url.as_str(), "http://example.com/ship/health");
    }

    #[test]
    fn test_client_error_maps_to_app_error() {
        let err: AppError = ClientError::NotFound {
            message: "Shipment not found".to_string(),
        }
        .into();
        assert!(err.is_not_found());

        let err: AppError = ClientError::Api {
            status: 401,
            code: "unauthorized".to_string(),
            message: "Unauthorized".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Unauthorized { .. }));

        // Statuses the service never sends on purpose become internal errors.
        let err: AppError = ClientError::Api {
            status: 409,
            code: "conflict".to_string(),
            message: "Conflict".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.to_error_info().code, "internal_error");
    }
}
