//! JSON file shipment store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::entities::Shipment;
use crate::domain::repositories::ShipmentStore;
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::json;
use tokio::fs;
use tracing::{debug, error, info};

/// Persists the collection as a pretty-printed JSON array in one file.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so a crash mid-write never leaves a truncated collection behind.
pub struct FileShipmentStore {
    path: PathBuf,
}

impl FileShipmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, message: &str, e: std::io::Error) -> AppError {
        error!("{} {}: {}", message, self.path.display(), e);
        AppError::internal(
            message,
            json!({"path": self.path.display().to_string(), "reason": e.to_string()}),
        )
    }
}

#[async_trait]
impl ShipmentStore for FileShipmentStore {
    async fn load(&self) -> Result<Vec<Shipment>, AppError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} does not exist yet, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error("Failed to read shipments file", e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            AppError::internal(
                "Stored shipments are corrupt",
                json!({"path": self.path.display().to_string(), "reason": e.to_string()}),
            )
        })
    }

    async fn save(&self, shipments: &[Shipment]) -> Result<(), AppError> {
        let payload = serde_json::to_vec_pretty(shipments).map_err(|e| {
            AppError::internal("Failed to encode shipments", json!({"reason": e.to_string()}))
        })?;

        fs::create_dir_all(self.parent_dir())
            .await
            .map_err(|e| self.io_error("Failed to create shipments directory", e))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, payload)
            .await
            .map_err(|e| self.io_error("Failed to write shipments file", e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error("Failed to replace shipments file", e))?;

        debug!("Saved {} shipments to {}", shipments.len(), self.path.display());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        fs::metadata(self.parent_dir())
            .await
            .is_ok_and(|meta| meta.is_dir())
    }
}
