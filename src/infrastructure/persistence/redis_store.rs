//! Redis-backed shipment store.

use crate::domain::entities::Shipment;
use crate::domain::repositories::ShipmentStore;
use crate::error::AppError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::json;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

/// Attempts made to reach Redis at startup before giving up.
const CONNECT_ATTEMPTS: usize = 5;

/// Stores the whole collection as one JSON string under a single key.
///
/// Uses `ConnectionManager` for connection reuse and transparent reconnects.
pub struct RedisShipmentStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisShipmentStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// Connection attempts are retried with jittered exponential backoff.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `key` - key holding the collection, normally `shipments:v1`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the URL is invalid or Redis stays
    /// unreachable after every attempt.
    pub async fn connect(redis_url: &str, key: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::open(redis_url).map_err(|e| {
            AppError::internal("Failed to create Redis client", json!({"reason": e.to_string()}))
        })?;

        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(std::time::Duration::from_secs(5))
            .map(jitter)
            .take(CONNECT_ATTEMPTS - 1);

        let conn = Retry::spawn(strategy, || {
            let client = client.clone();
            async move {
                let mut manager = ConnectionManager::new(client).await.inspect_err(|e| {
                    warn!("Redis connection attempt failed: {}", e);
                })?;
                manager.ping::<()>().await?;
                Ok::<_, redis::RedisError>(manager)
            }
        })
        .await
        .map_err(|e| {
            error!("Giving up on Redis: {}", e);
            AppError::internal("Failed to connect to Redis", json!({"reason": e.to_string()}))
        })?;

        info!("✓ Connected to Redis");

        Ok(Self {
            conn,
            key: key.into(),
        })
    }
}

#[async_trait]
impl ShipmentStore for RedisShipmentStore {
    async fn load(&self) -> Result<Vec<Shipment>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&self.key).await.map_err(|e| {
            AppError::internal("Redis GET failed", json!({"key": self.key, "reason": e.to_string()}))
        })?;

        let Some(raw) = raw else {
            debug!("No shipments stored under {}", self.key);
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| {
            AppError::internal(
                "Stored shipments are corrupt",
                json!({"key": self.key, "reason": e.to_string()}),
            )
        })
    }

    async fn save(&self, shipments: &[Shipment]) -> Result<(), AppError> {
        let payload = serde_json::to_string(shipments).map_err(|e| {
            AppError::internal("Failed to encode shipments", json!({"reason": e.to_string()}))
        })?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&self.key, payload).await.map_err(|e| {
            error!("Redis SET error for {}: {}", self.key, e);
            AppError::internal("Redis SET failed", json!({"key": self.key, "reason": e.to_string()}))
        })?;

        debug!("Saved {} shipments to {}", shipments.len(), self.key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
