//! Trait describing the backend gateway and its error taxonomy.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{
    Alert, BinId, BinSnapshot, HealthReport, NavigationPlan, OptimizedRoute, Prediction,
};

/// Health status the backend reports when it is usable.
pub const HEALTHY_STATUS: &str = "healthy";

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the monitoring backend.
pub enum GatewayError {
    /// Request failed, returned a non-success status, or the body was malformed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Health probe answered with an unexpected status.
    #[error("Backend unhealthy (status: {status})")]
    Unhealthy {
        /// Status the backend reported.
        status: String,
    },
    /// Backend does not know the requested bin.
    #[error("Bin not found: {0}")]
    BinNotFound(BinId),
    /// Backend address cannot carry a request path.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
/// Read-only operations offered by the monitoring backend.
///
/// All operations are idempotent GETs, so concurrent identical calls are safe.
pub trait BackendPort: Send + Sync {
    /// Probe liveness.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unhealthy`] when the status is not [`HEALTHY_STATUS`],
    /// or [`GatewayError::Network`] when the request fails.
    async fn health(&self) -> Result<HealthReport, GatewayError>;

    /// Fetch the full bin list with system statistics.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the request fails.
    async fn bins(&self) -> Result<BinSnapshot, GatewayError>;

    /// Ask the optimizer for a collection route.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the request fails.
    async fn optimize_route(&self) -> Result<OptimizedRoute, GatewayError>;

    /// Fetch navigation data toward one bin.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BinNotFound`] for unknown bins, or another
    /// [`GatewayError`] when the request fails.
    async fn navigate(&self, bin: &BinId) -> Result<NavigationPlan, GatewayError>;

    /// Fetch fill prediction and risk for one bin.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BinNotFound`] for unknown bins, or another
    /// [`GatewayError`] when the request fails.
    async fn predict(&self, bin: &BinId) -> Result<Prediction, GatewayError>;

    /// Fetch active alerts.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the request fails.
    async fn alerts(&self) -> Result<Vec<Alert>, GatewayError>;
}
