//! Dashboard behavior against an in-memory backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use smartbin_core::model::{
    Alert, AlertSeverity, Bin, BinId, BinSnapshot, BinStatus, ConnectionStatus, Coordinate,
    HealthReport, NavigationPlan, OptimizedRoute, Prediction, RiskAssessment, RiskLevel,
    RouteStop, RouteSummary, SensorReadings, WasteCategory,
};
use smartbin_core::notify::Severity;
use smartbin_core::ports::{BackendPort, GatewayError};
use smartbin_core::scheduler::AppEvent;
use smartbin_core::service::{Dashboard, DashboardConfig, UserAction};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time;

#[derive(Default)]
struct FakeBackend {
    healthy: bool,
    bins: Mutex<Vec<Bin>>,
    fail_bins: Mutex<bool>,
    route: Vec<RouteStop>,
    travel_minutes: u32,
}

fn offline() -> GatewayError {
    GatewayError::Unhealthy {
        status: "offline".to_owned(),
    }
}

#[async_trait]
impl BackendPort for FakeBackend {
    async fn health(&self) -> Result<HealthReport, GatewayError> {
        if !self.healthy {
            return Err(offline());
        }
        Ok(HealthReport {
            status: "healthy".to_owned(),
            database: Some("in-memory".to_owned()),
            ml_model: None,
            bins_count: None,
        })
    }

    async fn bins(&self) -> Result<BinSnapshot, GatewayError> {
        if *self.fail_bins.lock().expect("lock") {
            return Err(offline());
        }
        Ok(BinSnapshot {
            bins: self.bins.lock().expect("lock").clone(),
            system_stats: None,
        })
    }

    async fn optimize_route(&self) -> Result<OptimizedRoute, GatewayError> {
        Ok(OptimizedRoute {
            stops: self.route.clone(),
            summary: RouteSummary {
                total_stops: u32::try_from(self.route.len()).unwrap_or(u32::MAX),
                total_distance_km: 5.4,
                estimated_time_minutes: 42,
                fuel_savings_percent: 29.0,
                high_priority_stops: None,
            },
            algorithm: None,
        })
    }

    async fn navigate(&self, bin: &BinId) -> Result<NavigationPlan, GatewayError> {
        let target_bin = self
            .bins
            .lock()
            .expect("lock")
            .iter()
            .find(|candidate| &candidate.id == bin)
            .cloned()
            .ok_or_else(|| GatewayError::BinNotFound(bin.clone()))?;
        Ok(NavigationPlan {
            target_bin,
            distance_km: 3.1,
            estimated_travel_minutes: self.travel_minutes,
            predicted_fill_on_arrival: 80.0,
            justification: None,
            traffic: None,
        })
    }

    async fn predict(&self, bin: &BinId) -> Result<Prediction, GatewayError> {
        Ok(Prediction {
            bin_id: bin.clone(),
            hours_to_80_percent: 0.0,
            hours_to_90_percent: 4.5,
            hours_to_full: 12.0,
            daily_fill_rate_percent: Some(8.0),
            predicted_collection: None,
            risk: RiskAssessment {
                overall_score: 0.72,
                level: RiskLevel::High,
                recommendations: vec!["Schedule collection within 24 hours".to_owned()],
            },
        })
    }

    async fn alerts(&self) -> Result<Vec<Alert>, GatewayError> {
        Ok(vec![Alert {
            id: "ALERT_B1".to_owned(),
            bin_id: BinId::from("B1"),
            severity: AlertSeverity::High,
            message: "General waste requires attention".to_owned(),
            location: "Downtown".to_owned(),
            fill_level: Some(90.0),
            priority_score: Some(0.9),
            category: WasteCategory::General,
        }])
    }
}

fn bin(id: &str, priority_score: f64, fill_level: f64, coordinates: Coordinate) -> Bin {
    Bin {
        id: BinId::from(id),
        location: format!("{id} street"),
        address: None,
        coordinates: Some(coordinates),
        category: WasteCategory::General,
        fill_level,
        priority_score,
        status: BinStatus::Alert,
        sensors: SensorReadings::default(),
        hazard_score: None,
        predicted_full: None,
        last_update: None,
    }
}

fn backend() -> FakeBackend {
    FakeBackend {
        healthy: true,
        bins: Mutex::new(vec![
            bin("B1", 0.9, 85.0, Coordinate::new(41.0, -73.0)),
            bin("B2", 0.3, 20.0, Coordinate::new(40.5, -74.2)),
        ]),
        travel_minutes: 2,
        ..FakeBackend::default()
    }
}

fn dashboard(backend: FakeBackend) -> (Dashboard, UnboundedReceiver<AppEvent>, Arc<FakeBackend>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let backend = Arc::new(backend);
    let config = DashboardConfig {
        depot: Coordinate::new(40.0, -74.0),
        refresh_period: Duration::from_secs(30),
    };
    let port: Arc<dyn BackendPort> = Arc::<FakeBackend>::clone(&backend);
    (Dashboard::new(port, sender, config), receiver, backend)
}

fn tick_current_session(dash: &mut Dashboard, ticks: usize) {
    for _ in 0..ticks {
        let Some(id) = dash.navigation().session().map(|session| session.id) else {
            return;
        };
        dash.handle_event(AppEvent::NavigationTick(id));
    }
}

/// Feed queued events into the dashboard until a background request completes.
async fn settle(dash: &mut Dashboard, events: &mut UnboundedReceiver<AppEvent>) {
    while let Some(event) = events.recv().await {
        let completed = matches!(event, AppEvent::Completed(_));
        dash.handle_event(event);
        if completed {
            return;
        }
    }
}

async fn let_timers_run() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn initialize_loads_bins_sorted_by_priority() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");

    assert_eq!(dash.connection(), ConnectionStatus::Connected);
    let ids: Vec<&str> = dash
        .registry()
        .sorted_by_priority()
        .map(|bin| bin.id.0.as_str())
        .collect();
    assert_eq!(ids, ["B1", "B2"]);
    assert_eq!(dash.map().markers().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unhealthy_backend_sets_error_status_once() {
    let mut unhealthy = backend();
    unhealthy.healthy = false;
    let (mut dash, _events, _backend) = dashboard(unhealthy);

    assert!(dash.initialize().await.is_err());
    assert_eq!(dash.connection(), ConnectionStatus::Error);
    assert_eq!(dash.notifications().items().len(), 1);
    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Error)
    );
    assert!(dash.registry().bins().is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_halfway_then_arrival_resets_selected_bin() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    let target = BinId::from("B1");
    dash.select_bin(Some(&target));
    dash.navigate_to_selected().await;
    assert!(dash.navigation().is_active());
    assert!(dash.map().direct_route().is_some());

    tick_current_session(&mut dash, 60);
    let position = dash.map().current_location();
    assert!((position.lat - 40.5).abs() < 1e-9, "lat {}", position.lat);
    assert!((position.lng + 73.5).abs() < 1e-9, "lng {}", position.lng);

    tick_current_session(&mut dash, 60);
    assert!(!dash.navigation().is_active());
    assert!(dash.map().direct_route().is_none());
    let collected = dash.registry().get(&target).expect("bin present");
    assert!(collected.fill_level.abs() < f64::EPSILON);
    assert_eq!(collected.status, BinStatus::Normal);
    assert!(dash.registry().is_provisional(&target));
}

#[tokio::test(start_paused = true)]
async fn next_refresh_overrides_collection_patch() {
    let (mut dash, mut events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    let target = BinId::from("B1");
    dash.select_bin(Some(&target));
    dash.navigate_to_selected().await;
    tick_current_session(&mut dash, 120);

    dash.handle_event(AppEvent::RefreshDue);
    settle(&mut dash, &mut events).await;
    let bin = dash.registry().get(&target).expect("bin present");
    assert!((bin.fill_level - 85.0).abs() < f64::EPSILON, "server value wins");
    assert!(!dash.registry().is_provisional(&target));
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_is_skipped_while_navigating() {
    let (mut dash, mut events, backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.select_bin(Some(&BinId::from("B2")));
    dash.navigate_to_selected().await;

    backend.bins.lock().expect("lock").clear();
    dash.handle_event(AppEvent::RefreshDue);
    assert_eq!(dash.pending_requests(), 0, "no request while navigating");
    assert_eq!(dash.registry().bins().len(), 2);

    dash.stop_navigation();
    dash.handle_event(AppEvent::RefreshDue);
    assert_eq!(dash.pending_requests(), 1);
    settle(&mut dash, &mut events).await;
    assert_eq!(dash.pending_requests(), 0);
    assert!(dash.registry().bins().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_periodic_refresh_keeps_previous_bins() {
    let (mut dash, mut events, backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    *backend.fail_bins.lock().expect("lock") = true;

    dash.handle_event(AppEvent::RefreshDue);
    settle(&mut dash, &mut events).await;
    assert_eq!(dash.registry().bins().len(), 2);
    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Warning)
    );
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_without_touching_bins() {
    let (mut dash, mut events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    let target = BinId::from("B1");
    dash.select_bin(Some(&target));
    dash.navigate_to_selected().await;
    tick_current_session(&mut dash, 10);

    dash.stop_navigation();
    assert!(!dash.navigation().is_active());
    assert!(dash.map().direct_route().is_none());
    assert!(
        dash.registry()
            .get(&target)
            .is_some_and(|bin| (bin.fill_level - 85.0).abs() < f64::EPSILON)
    );

    time::advance(Duration::from_secs(5)).await;
    let_timers_run().await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, AppEvent::NavigationTick(_)),
            "navigation timer fired after stop"
        );
    }

    let notes_before = dash.notifications().items().len();
    dash.stop_navigation();
    assert_eq!(dash.notifications().items().len(), notes_before, "idle stop is silent");
}

#[tokio::test(start_paused = true)]
async fn empty_route_draws_no_polyline() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.optimize_route().await;

    assert!(dash.route().is_some_and(|route| route.stops.is_empty()));
    assert!(dash.map().route().is_none());
}

#[tokio::test(start_paused = true)]
async fn route_is_drawn_from_vehicle_position() {
    let mut with_route = backend();
    with_route.route = vec![RouteStop {
        stop_number: 1,
        bin_id: BinId::from("B1"),
        location: "B1 street".to_owned(),
        coordinates: Some(Coordinate::new(41.0, -73.0)),
        category: WasteCategory::General,
        fill_level: 85.0,
        priority_score: 0.9,
        distance_from_previous_km: 2.3,
        travel_time_minutes: 6,
        collection_time_minutes: 15,
        estimated_arrival: Some("10:20".to_owned()),
        predicted_fill_on_arrival: Some(85.05),
    }];
    let (mut dash, _events, _backend) = dashboard(with_route);
    dash.initialize().await.expect("initialize");
    dash.optimize_route().await;

    let layer = dash.map().route().expect("route layer");
    assert_eq!(layer.polyline.first(), Some(&Coordinate::new(40.0, -74.0)));
    assert_eq!(layer.stops.len(), 1);

    dash.clear_route();
    assert!(dash.map().route().is_none());
}

#[tokio::test(start_paused = true)]
async fn navigate_without_selection_warns() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.navigate_to_selected().await;

    assert!(!dash.navigation().is_active());
    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Warning)
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_bin_navigation_reports_error() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.navigate_to(&BinId::from("NOPE")).await;

    assert!(!dash.navigation().is_active());
    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Error)
    );
}

#[tokio::test(start_paused = true)]
async fn prediction_and_alerts_are_stored() {
    let (mut dash, _events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.select_bin(Some(&BinId::from("B2")));
    dash.predict_selected().await;
    dash.load_alerts().await;

    assert_eq!(
        dash.prediction().map(|prediction| prediction.bin_id.clone()),
        Some(BinId::from("B2"))
    );
    assert_eq!(dash.alerts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_refresh_timer() {
    let (mut dash, mut events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    dash.shutdown();

    time::advance(Duration::from_secs(90)).await;
    let_timers_run().await;
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn refresh_fires_after_full_period_only() {
    let (mut dash, mut events, _backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");

    time::advance(Duration::from_secs(29)).await;
    let_timers_run().await;
    assert!(events.try_recv().is_err(), "refresh fired before 30 s");

    time::advance(Duration::from_secs(1)).await;
    let_timers_run().await;
    assert!(matches!(events.try_recv(), Ok(AppEvent::RefreshDue)));
    assert!(events.try_recv().is_err(), "one refresh per period");

    dash.shutdown();
    time::advance(Duration::from_secs(90)).await;
    let_timers_run().await;
    assert!(events.try_recv().is_err(), "refresh fired after shutdown");
}

#[tokio::test(start_paused = true)]
async fn navigating_to_bin_without_coordinates_keeps_running_session() {
    let (mut dash, _events, backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    let mut unplaced = bin("B3", 0.5, 60.0, Coordinate::new(0.0, 0.0));
    unplaced.coordinates = None;
    backend.bins.lock().expect("lock").push(unplaced);

    dash.select_bin(Some(&BinId::from("B1")));
    dash.navigate_to_selected().await;
    tick_current_session(&mut dash, 5);
    let session = dash.navigation().session().map(|session| session.id);
    let position = dash.map().current_location();
    assert!(session.is_some());

    dash.navigate_to(&BinId::from("B3")).await;

    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Warning)
    );
    assert!(dash.navigation().is_active());
    assert_eq!(dash.navigation().session().map(|session| session.id), session);
    assert_eq!(
        dash.map().direct_route().map(|layer| layer.to),
        Some(Coordinate::new(41.0, -73.0))
    );
    assert_eq!(dash.map().current_location(), position);
    assert!(
        dash.navigation_plan()
            .is_some_and(|plan| plan.target_bin.id == BinId::from("B1"))
    );
}

#[tokio::test(start_paused = true)]
async fn dispatched_refresh_applies_when_completed() {
    let (mut dash, mut events, backend) = dashboard(backend());
    dash.initialize().await.expect("initialize");
    backend.bins.lock().expect("lock").pop();

    dash.dispatch(UserAction::Refresh);
    assert_eq!(dash.pending_requests(), 1);
    assert_eq!(dash.registry().bins().len(), 2, "applied only on completion");

    settle(&mut dash, &mut events).await;
    assert_eq!(dash.pending_requests(), 0);
    assert_eq!(dash.registry().bins().len(), 1);
    assert_eq!(
        dash.notifications().latest().map(|note| note.severity),
        Some(Severity::Success)
    );
}

#[tokio::test(start_paused = true)]
async fn dispatch_without_connection_connects() {
    let (mut dash, mut events, _backend) = dashboard(backend());

    dash.dispatch(UserAction::Refresh);
    settle(&mut dash, &mut events).await;

    assert_eq!(dash.connection(), ConnectionStatus::Connected);
    assert_eq!(dash.registry().bins().len(), 2);
}
