//! Application context tying the registry, map, simulator, and notifications together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::model::{
    Alert, BinId, BinSnapshot, ConnectionStatus, Coordinate, HealthReport, NavigationPlan,
    OptimizedRoute, Prediction,
};
use crate::map::MapLayers;
use crate::navigation::{NavigationSimulator, TickOutcome};
use crate::notify::{Notifications, Severity};
use crate::ports::{BackendPort, GatewayError};
use crate::registry::BinRegistry;
use crate::request::{self, RefreshOrigin, Request, Response};
use crate::scheduler::{AppEvent, SessionId, TickHandle, spawn_ticker};

/// Period of the automatic registry refresh.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(30);
/// Depot the backend routes from.
pub const DEFAULT_DEPOT: Coordinate = Coordinate::new(40.7128, -74.0060);

#[derive(Debug, Clone, Copy)]
/// Settings for a [`Dashboard`].
pub struct DashboardConfig {
    /// Starting position of the simulated vehicle.
    pub depot: Coordinate,
    /// Period of the automatic registry refresh.
    pub refresh_period: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            depot: DEFAULT_DEPOT,
            refresh_period: DEFAULT_REFRESH_PERIOD,
        }
    }
}

/// Everything a front end shows, plus the operations that change it.
///
/// Constructed once at startup and driven from a single event loop. Backend
/// work either runs inline through the async operations, or in the background
/// through [`Dashboard::dispatch`], whose response comes back as
/// [`AppEvent::Completed`]. Timer events and responses are both fed through
/// [`Dashboard::handle_event`]. Failures never escape an operation; they are
/// logged and turned into notifications, leaving prior state untouched.
pub struct Dashboard {
    port: Arc<dyn BackendPort>,
    events: UnboundedSender<AppEvent>,
    config: DashboardConfig,

    connection: ConnectionStatus,
    health: Option<HealthReport>,
    registry: BinRegistry,
    route: Option<OptimizedRoute>,
    navigation: NavigationSimulator,
    navigation_plan: Option<NavigationPlan>,
    prediction: Option<Prediction>,
    alerts: Vec<Alert>,
    map: MapLayers,
    notifications: Notifications,
    refresh_timer: Option<TickHandle>,
    in_flight: usize,
}

/// User operation that needs the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Reload bins, or connect when not connected yet.
    Refresh,
    /// Request an optimized route.
    OptimizeRoute,
    /// Navigate to the selected bin.
    NavigateToSelected,
    /// Predict the fill level of the selected bin.
    PredictSelected,
    /// Load active alerts.
    LoadAlerts,
}

impl Dashboard {
    /// Create an idle dashboard; timers send their events to `events`.
    #[must_use]
    pub fn new(
        port: Arc<dyn BackendPort>,
        events: UnboundedSender<AppEvent>,
        config: DashboardConfig,
    ) -> Self {
        Self {
            navigation: NavigationSimulator::new(config.depot, events.clone()),
            map: MapLayers::new(config.depot),
            port,
            events,
            config,
            connection: ConnectionStatus::Unknown,
            health: None,
            registry: BinRegistry::new(),
            route: None,
            navigation_plan: None,
            prediction: None,
            alerts: Vec::new(),
            notifications: Notifications::default(),
            refresh_timer: None,
            in_flight: 0,
        }
    }

    /// Check backend health, load bins, and start the periodic refresh.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] that aborted initialization; the connection
    /// status is set to [`ConnectionStatus::Error`] and one notification is shown.
    pub async fn initialize(&mut self) -> Result<(), GatewayError> {
        let result = request::connect(self.port.as_ref()).await;
        self.on_connected(result)
    }

    /// Run `action`, awaiting the backend inline.
    pub async fn perform(&mut self, action: UserAction) {
        if let Some(request) = self.request_for(action) {
            self.run(request).await;
        }
    }

    /// Start `action` in the background.
    ///
    /// The response arrives on the event channel as [`AppEvent::Completed`];
    /// timers keep ticking meanwhile. Must be called inside a tokio runtime.
    pub fn dispatch(&mut self, action: UserAction) {
        if let Some(request) = self.request_for(action) {
            self.spawn_request(request);
        }
    }

    /// Backend requests started by [`Dashboard::dispatch`] and not yet applied.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.in_flight
    }

    /// User-requested refresh; retries initialization while disconnected.
    pub async fn refresh_now(&mut self) {
        self.perform(UserAction::Refresh).await;
    }

    /// React to a timer event or a finished background request.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::NavigationTick(id) => self.on_navigation_tick(id),
            AppEvent::RefreshDue => self.on_refresh_due(),
            AppEvent::Completed(response) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.apply(*response);
            }
        }
    }

    /// Fold a backend response into the dashboard state.
    pub fn apply(&mut self, response: Response) {
        match response {
            Response::Connected(result) => {
                if self.on_connected(result).is_err() {
                    debug!("connection attempt failed");
                }
            }
            Response::Refreshed(origin, result) => self.on_refreshed(origin, result),
            Response::RouteOptimized(result) => self.on_route(result),
            Response::NavigationPlanned(bin, result) => self.on_navigation_plan(&bin, result),
            Response::Predicted(bin, result) => self.on_prediction(&bin, result),
            Response::AlertsLoaded(result) => self.on_alerts(result),
        }
    }

    fn request_for(&mut self, action: UserAction) -> Option<Request> {
        match action {
            UserAction::Refresh if self.connection != ConnectionStatus::Connected => {
                Some(Request::Connect)
            }
            UserAction::Refresh => Some(Request::Refresh(RefreshOrigin::Manual)),
            UserAction::OptimizeRoute => Some(Request::OptimizeRoute),
            UserAction::NavigateToSelected => self
                .selected_or_warn("Select a bin before navigating")
                .map(Request::Navigate),
            UserAction::PredictSelected => self
                .selected_or_warn("Select a bin to predict")
                .map(Request::Predict),
            UserAction::LoadAlerts => Some(Request::Alerts),
        }
    }

    fn selected_or_warn(&mut self, message: &str) -> Option<BinId> {
        let selected = self.registry.selected_id().cloned();
        if selected.is_none() {
            self.notifications.push(Severity::Warning, message);
        }
        selected
    }

    async fn run(&mut self, request: Request) {
        let response = request.send(self.port.as_ref()).await;
        self.apply(response);
    }

    fn spawn_request(&mut self, request: Request) {
        debug!(?request, "backend request started");
        self.in_flight += 1;
        let port = Arc::clone(&self.port);
        let events = self.events.clone();
        tokio::spawn(async move {
            let response = request.send(port.as_ref()).await;
            if events.send(AppEvent::Completed(Box::new(response))).is_err() {
                debug!("event receiver closed, dropping backend response");
            }
        });
    }

    fn on_connected(
        &mut self,
        result: Result<(HealthReport, BinSnapshot), GatewayError>,
    ) -> Result<(), GatewayError> {
        let (health, snapshot) = match result {
            Ok(connected) => connected,
            Err(err) => {
                warn!(error = %err, "backend initialization failed");
                self.connection = ConnectionStatus::Error;
                self.notifications
                    .push(Severity::Error, format!("Cannot connect to backend: {err}"));
                return Err(err);
            }
        };
        info!(database = ?health.database, "backend healthy");
        self.health = Some(health);

        self.registry.replace(snapshot);
        self.connection = ConnectionStatus::Connected;
        self.sync_map();

        // Replacing an old handle aborts its timer.
        self.refresh_timer = Some(spawn_ticker(
            self.config.refresh_period,
            || AppEvent::RefreshDue,
            self.events.clone(),
        ));
        self.notifications.push(
            Severity::Success,
            format!("Connected, {} bins loaded", self.registry.stats().total),
        );
        Ok(())
    }

    fn on_refresh_due(&mut self) {
        if self.navigation.is_active() {
            debug!("periodic refresh skipped during navigation");
            return;
        }
        self.spawn_request(Request::Refresh(RefreshOrigin::Periodic));
    }

    fn on_refreshed(&mut self, origin: RefreshOrigin, result: Result<BinSnapshot, GatewayError>) {
        match (origin, result) {
            (RefreshOrigin::Periodic, Ok(_)) if self.navigation.is_active() => {
                debug!("periodic refresh dropped, navigation started meanwhile");
            }
            (origin, Ok(snapshot)) => {
                self.registry.replace(snapshot);
                self.sync_map();
                if origin == RefreshOrigin::Manual {
                    self.notifications.push(
                        Severity::Success,
                        format!("Refreshed {} bins", self.registry.stats().total),
                    );
                }
            }
            (RefreshOrigin::Manual, Err(err)) => {
                warn!(error = %err, "manual refresh failed");
                self.notifications
                    .push(Severity::Error, format!("Refresh failed: {err}"));
            }
            (RefreshOrigin::Periodic, Err(err)) => {
                warn!(error = %err, "periodic refresh failed");
                self.notifications
                    .push(Severity::Warning, format!("Auto-refresh failed: {err}"));
            }
        }
    }

    fn on_navigation_tick(&mut self, id: SessionId) {
        match self.navigation.tick(id) {
            TickOutcome::Ignored => {}
            TickOutcome::Moved { position, .. } => self.map.move_current_location(position),
            TickOutcome::Arrived { destination } => {
                self.map.move_current_location(self.navigation.position());
                self.map.clear_direct_route();
                self.navigation_plan = None;
                self.notifications.push(
                    Severity::Success,
                    format!("Arrived at {} ({})", destination.id, destination.location),
                );

                if let Some(selected) = self.registry.selected_id().cloned()
                    && self.registry.apply_collection_patch(&selected)
                {
                    info!(bin_id = %selected, "bin marked collected until next refresh");
                    self.sync_map();
                }
            }
        }
    }

    /// Set or clear the selected bin; unknown ids are ignored.
    pub fn select_bin(&mut self, id: Option<&BinId>) {
        self.registry.select(id);
        self.map.show_popup(self.registry.selected_id());
    }

    /// Request an optimized route and draw it.
    pub async fn optimize_route(&mut self) {
        self.perform(UserAction::OptimizeRoute).await;
    }

    fn on_route(&mut self, result: Result<OptimizedRoute, GatewayError>) {
        match result {
            Ok(route) => {
                self.map.draw_route(&route.stops);
                let (severity, message) = if route.stops.is_empty() {
                    (Severity::Info, "No bins need collection right now".to_owned())
                } else {
                    (
                        Severity::Success,
                        format!(
                            "Route optimized: {} stops, {:.1} km",
                            route.summary.total_stops, route.summary.total_distance_km
                        ),
                    )
                };
                info!(stops = route.stops.len(), "route optimized");
                self.route = Some(route);
                self.notifications.push(severity, message);
            }
            Err(err) => {
                warn!(error = %err, "route optimization failed");
                self.notifications
                    .push(Severity::Error, format!("Route optimization failed: {err}"));
            }
        }
    }

    /// Forget the current route.
    pub fn clear_route(&mut self) {
        if self.route.take().is_some() {
            self.map.clear_route();
            self.notifications.push(Severity::Info, "Route cleared");
        }
    }

    /// Start navigating to the selected bin.
    pub async fn navigate_to_selected(&mut self) {
        self.perform(UserAction::NavigateToSelected).await;
    }

    /// Fetch navigation data for `bin` and start the simulation toward it.
    pub async fn navigate_to(&mut self, bin: &BinId) {
        self.run(Request::Navigate(bin.clone())).await;
    }

    fn on_navigation_plan(&mut self, bin: &BinId, result: Result<NavigationPlan, GatewayError>) {
        let plan = match result {
            Ok(plan) => plan,
            Err(err) => {
                warn!(bin_id = %bin, error = %err, "navigation request failed");
                self.notifications
                    .push(Severity::Error, format!("Navigation failed: {err}"));
                return;
            }
        };

        let Some(target) = plan.target_bin.position() else {
            warn!(bin_id = %bin, "navigation target has no coordinates");
            self.notifications.push(
                Severity::Warning,
                format!("Bin {bin} has no location to navigate to"),
            );
            return;
        };

        self.stop_navigation();
        match self
            .navigation
            .start(plan.target_bin.clone(), plan.estimated_travel_minutes)
        {
            Ok(_) => {
                self.map.show_direct_route(target);
                self.notifications.push(
                    Severity::Info,
                    format!(
                        "Navigating to {} · {:.1} km · {} min",
                        plan.target_bin.location, plan.distance_km, plan.estimated_travel_minutes
                    ),
                );
                self.navigation_plan = Some(plan);
            }
            Err(err) => {
                warn!(error = %err, "navigation could not start");
                self.notifications.push(Severity::Warning, err.to_string());
            }
        }
    }

    /// Cancel the running navigation; does nothing when idle.
    pub fn stop_navigation(&mut self) {
        let Some(session) = self.navigation.stop() else {
            return;
        };
        self.map.clear_direct_route();
        self.navigation_plan = None;
        self.notifications.push(
            Severity::Warning,
            format!("Navigation to {} cancelled", session.destination.location),
        );
    }

    /// Fetch the fill prediction for the selected bin.
    pub async fn predict_selected(&mut self) {
        self.perform(UserAction::PredictSelected).await;
    }

    /// Fetch the fill prediction for `bin`.
    pub async fn predict(&mut self, bin: &BinId) {
        self.run(Request::Predict(bin.clone())).await;
    }

    fn on_prediction(&mut self, bin: &BinId, result: Result<Prediction, GatewayError>) {
        match result {
            Ok(prediction) => {
                self.notifications.push(
                    Severity::Info,
                    format!(
                        "{bin}: full in {:.1} h, risk {:.2}",
                        prediction.hours_to_full, prediction.risk.overall_score
                    ),
                );
                self.prediction = Some(prediction);
            }
            Err(err) => {
                warn!(bin_id = %bin, error = %err, "prediction failed");
                self.notifications
                    .push(Severity::Error, format!("Prediction failed: {err}"));
            }
        }
    }

    /// Fetch active alerts.
    pub async fn load_alerts(&mut self) {
        self.perform(UserAction::LoadAlerts).await;
    }

    fn on_alerts(&mut self, result: Result<Vec<Alert>, GatewayError>) {
        match result {
            Ok(alerts) => {
                let severity = if alerts.is_empty() {
                    Severity::Success
                } else {
                    Severity::Warning
                };
                self.notifications
                    .push(severity, format!("{} active alerts", alerts.len()));
                self.alerts = alerts;
            }
            Err(err) => {
                warn!(error = %err, "loading alerts failed");
                self.notifications
                    .push(Severity::Error, format!("Loading alerts failed: {err}"));
            }
        }
    }

    /// Drop notifications that timed out.
    pub fn expire_notifications(&mut self, now: Instant) {
        self.notifications.expire(now);
    }

    /// Cancel every timer.
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.refresh_timer.take() {
            timer.cancel();
        }
        if self.navigation.stop().is_some() {
            self.map.clear_direct_route();
        }
        info!("dashboard shut down");
    }

    fn sync_map(&mut self) {
        self.map.sync_bins(self.registry.bins());
        self.map.show_popup(self.registry.selected_id());
    }

    /// Result of the last health check.
    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Last health report.
    #[must_use]
    pub fn health(&self) -> Option<&HealthReport> {
        self.health.as_ref()
    }

    /// Bin registry.
    #[must_use]
    pub fn registry(&self) -> &BinRegistry {
        &self.registry
    }

    /// Current optimized route.
    #[must_use]
    pub fn route(&self) -> Option<&OptimizedRoute> {
        self.route.as_ref()
    }

    /// Navigation simulator.
    #[must_use]
    pub fn navigation(&self) -> &NavigationSimulator {
        &self.navigation
    }

    /// Navigation data of the running session.
    #[must_use]
    pub fn navigation_plan(&self) -> Option<&NavigationPlan> {
        self.navigation_plan.as_ref()
    }

    /// Last prediction.
    #[must_use]
    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    /// Last loaded alerts.
    #[must_use]
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Map layers.
    #[must_use]
    pub fn map(&self) -> &MapLayers {
        &self.map
    }

    /// Visible notifications.
    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Visible notifications, for manual dismissal.
    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }
}
