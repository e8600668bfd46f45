//! Device position acquisition seam.
//!
//! The OS location stack is an external collaborator; the flows only
//! need a provider capability plus a hard timeout so a stuck provider
//! degrades into a recoverable fault instead of hanging the caller.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::DevicePosition;

/// Acquisition options handed to the provider.
#[derive(Debug, Clone, Copy)]
pub struct PositionRequest {
    /// Ask the platform for the most precise fix it can produce.
    pub high_accuracy: bool,
    /// Hard deadline for the whole acquisition.
    pub timeout: Duration,
    /// Oldest cached fix the provider may serve.
    pub max_age: Duration,
}

impl Default for PositionRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(5),
        }
    }
}

/// Source of device positions.
///
/// Platform integrations implement this; the CLI fulfils it with
/// explicitly supplied coordinates and tests use scripted providers.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Check (and where the platform allows, request) permission to
    /// read the device location.
    async fn ensure_permission(&self) -> Result<()>;

    /// Produce one position fix honoring the request options.
    async fn current_position(&self, request: &PositionRequest) -> Result<DevicePosition>;
}

/// Acquire one fix, permission check first, with the deadline applied
/// outside the provider.
pub async fn acquire_position<P>(provider: &P, request: &PositionRequest) -> Result<DevicePosition>
where
    P: LocationProvider + ?Sized,
{
    provider.ensure_permission().await?;
    let position = timeout(request.timeout, provider.current_position(request))
        .await
        .map_err(|_| {
            warn!(timeout_secs = request.timeout.as_secs(), "position acquisition timed out");
            AppError::location_unavailable(format!(
                "no position fix within {}s",
                request.timeout.as_secs()
            ))
        })??;
    debug!(
        latitude = position.latitude,
        longitude = position.longitude,
        "position acquired"
    );
    Ok(position)
}

/// Provider backed by fixed coordinates, for callers that already
/// know where they are (CLI flags, kiosk installs).
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    pub position: DevicePosition,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: DevicePosition {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl LocationProvider for FixedPosition {
    async fn ensure_permission(&self) -> Result<()> {
        Ok(())
    }

    async fn current_position(&self, _request: &PositionRequest) -> Result<DevicePosition> {
        Ok(self.position)
    }
}
