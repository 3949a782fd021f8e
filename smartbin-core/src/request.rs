//! Backend requests a dashboard issues, and the responses they come back with.

use crate::model::{
    Alert, BinId, BinSnapshot, HealthReport, NavigationPlan, OptimizedRoute, Prediction,
};
use crate::ports::{BackendPort, GatewayError};

/// Where a bin refresh was asked for; they report differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    /// The user pressed refresh.
    Manual,
    /// The periodic timer fired.
    Periodic,
}

/// One backend round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Health check followed by the first bin load.
    Connect,
    /// Reload the bin list.
    Refresh(RefreshOrigin),
    /// Compute an optimized route.
    OptimizeRoute,
    /// Fetch navigation data toward a bin.
    Navigate(BinId),
    /// Fetch the fill prediction of a bin.
    Predict(BinId),
    /// Fetch active alerts.
    Alerts,
}

/// Outcome of a [`Request`], applied by [`crate::service::Dashboard::apply`].
#[derive(Debug)]
pub enum Response {
    /// Result of [`Request::Connect`].
    Connected(Result<(HealthReport, BinSnapshot), GatewayError>),
    /// Result of [`Request::Refresh`].
    Refreshed(RefreshOrigin, Result<BinSnapshot, GatewayError>),
    /// Result of [`Request::OptimizeRoute`].
    RouteOptimized(Result<OptimizedRoute, GatewayError>),
    /// Result of [`Request::Navigate`].
    NavigationPlanned(BinId, Result<NavigationPlan, GatewayError>),
    /// Result of [`Request::Predict`].
    Predicted(BinId, Result<Prediction, GatewayError>),
    /// Result of [`Request::Alerts`].
    AlertsLoaded(Result<Vec<Alert>, GatewayError>),
}

impl Request {
    /// Run the request against `port`. Never fails; errors travel inside the response.
    pub async fn send(self, port: &dyn BackendPort) -> Response {
        match self {
            Request::Connect => Response::Connected(connect(port).await),
            Request::Refresh(origin) => Response::Refreshed(origin, port.bins().await),
            Request::OptimizeRoute => Response::RouteOptimized(port.optimize_route().await),
            Request::Navigate(bin) => {
                let result = port.navigate(&bin).await;
                Response::NavigationPlanned(bin, result)
            }
            Request::Predict(bin) => {
                let result = port.predict(&bin).await;
                Response::Predicted(bin, result)
            }
            Request::Alerts => Response::AlertsLoaded(port.alerts().await),
        }
    }
}

pub(crate) async fn connect(
    port: &dyn BackendPort,
) -> Result<(HealthReport, BinSnapshot), GatewayError> {
    let health = port.health().await?;
    let snapshot = port.bins().await?;
    Ok((health, snapshot))
}
