//! Gateway implementation for the SmartWaste monitoring backend REST API.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use smartbin_core::{
    model::{
        Alert, AlertSeverity, Bin, BinId, BinSnapshot, BinStatus, Coordinate, HealthReport,
        NavigationPlan, OptimizedRoute, Prediction, RiskAssessment, RiskLevel, RouteStop,
        RouteSummary, SensorReadings, SystemStats, TrafficInfo, WasteCategory,
    },
    ports::{BackendPort, GatewayError, HEALTHY_STATUS},
};

/// Address of a backend started locally with its defaults.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Response from /api/health
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    database: Option<String>,
    #[serde(default, rename = "mlModel")]
    ml_model: Option<String>,
    #[serde(default, rename = "binsCount")]
    bins_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct WireCoordinates {
    lat: f64,
    lng: f64,
}

impl From<WireCoordinates> for Coordinate {
    fn from(wire: WireCoordinates) -> Self {
        Coordinate::new(wire.lat, wire.lng)
    }
}

/// Nested sensor block some bins carry.
#[derive(Debug, Default, Deserialize)]
struct WireSensorData {
    #[serde(default)]
    gas_reading: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
}

/// Bin record as stored by the backend (mixed camelCase and snake_case).
#[derive(Debug, Deserialize)]
struct WireBin {
    id: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    coordinates: Option<WireCoordinates>,

    /// Human vocabulary, e.g. "Organic Waste".
    #[serde(default, rename = "type")]
    typ: Option<String>,
    /// Derived slug, e.g. "organic".
    #[serde(default)]
    waste_type: Option<String>,

    #[serde(default, rename = "fillLevel", alias = "fill_level")]
    fill_level: f64,
    #[serde(default)]
    priority_score: f64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "hazardScore")]
    hazard_score: Option<f64>,
    #[serde(default)]
    predicted_full_time: Option<String>,
    #[serde(default, rename = "lastUpdate")]
    last_update: Option<String>,

    #[serde(default, rename = "batteryLevel")]
    battery_level: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    sensor_data: Option<WireSensorData>,
}

impl From<WireBin> for Bin {
    fn from(wire: WireBin) -> Self {
        // waste_type is the backend's own normalization, so it wins over type
        let category = wire
            .waste_type
            .as_deref()
            .or(wire.typ.as_deref())
            .map_or(WasteCategory::General, WasteCategory::normalize);
        let sensor_data = wire.sensor_data.unwrap_or_default();

        Bin {
            id: BinId(wire.id),
            location: wire.location,
            address: wire.address,
            coordinates: wire.coordinates.map(Coordinate::from),
            category,
            fill_level: wire.fill_level,
            priority_score: wire.priority_score,
            status: wire
                .status
                .as_deref()
                .map_or(BinStatus::Normal, BinStatus::parse),
            sensors: SensorReadings {
                gas_ppm: sensor_data.gas_reading,
                weight_kg: wire.weight.or(sensor_data.weight),
                temperature_c: wire.temperature,
                battery_percent: wire.battery_level,
                humidity_percent: sensor_data.humidity,
            },
            hazard_score: wire.hazard_score,
            predicted_full: wire.predicted_full_time,
            last_update: wire.last_update.as_deref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSystemStats {
    #[serde(default)]
    total_bins: Option<usize>,
    #[serde(default)]
    active_bins: Option<usize>,
    #[serde(default, rename = "fuelSavingsPercent")]
    fuel_savings_percent: Option<f64>,
    #[serde(default, rename = "collectionEfficiency")]
    collection_efficiency: Option<f64>,
}

/// Response from /api/bins
#[derive(Debug, Deserialize)]
struct BinsResponse {
    bins: Vec<WireBin>,
    #[serde(default)]
    system_stats: Option<WireSystemStats>,
}

#[derive(Debug, Deserialize)]
struct WireRouteStop {
    stop_number: u32,
    bin_id: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    coordinates: Option<WireCoordinates>,
    #[serde(default)]
    waste_type: Option<String>,
    #[serde(default)]
    fill_level: f64,
    #[serde(default)]
    priority_score: f64,
    #[serde(default)]
    distance_from_previous: f64,
    #[serde(default)]
    travel_time_minutes: u32,
    #[serde(default)]
    collection_time_minutes: u32,
    #[serde(default)]
    estimated_arrival: Option<String>,
    #[serde(default)]
    predicted_fill_on_arrival: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireRouteSummary {
    #[serde(default)]
    total_stops: u32,
    #[serde(default)]
    total_distance_km: f64,
    #[serde(default)]
    estimated_time_minutes: u32,
    #[serde(default)]
    fuel_savings_percent: f64,
    #[serde(default)]
    high_priority_stops: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireOptimizationInfo {
    #[serde(default)]
    algorithm: Option<String>,
}

/// Response from /api/route/optimize
#[derive(Debug, Deserialize)]
struct RouteResponse {
    route: Vec<WireRouteStop>,
    #[serde(default)]
    summary: WireRouteSummary,
    #[serde(default)]
    optimization_info: Option<WireOptimizationInfo>,
}

#[derive(Debug, Deserialize)]
struct WireNavigation {
    #[serde(default)]
    distance_km: f64,
    estimated_travel_time_minutes: u32,
    #[serde(default)]
    predicted_fill_on_arrival: f64,
    #[serde(default)]
    priority_justification: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTrafficInfo {
    #[serde(default)]
    estimated_delay: u32,
    #[serde(default)]
    route_status: String,
}

/// Response from /api/navigate/{binId}
#[derive(Debug, Deserialize)]
struct NavigateResponse {
    target_bin: WireBin,
    navigation: WireNavigation,
    #[serde(default)]
    traffic_info: Option<WireTrafficInfo>,
}

#[derive(Debug, Deserialize)]
struct WirePredictions {
    hours_to_80_percent: f64,
    hours_to_90_percent: f64,
    hours_to_full: f64,
    #[serde(default)]
    daily_fill_rate_percent: Option<f64>,
    #[serde(default)]
    predicted_collection_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRiskAssessment {
    overall_risk_score: f64,
    risk_level: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Response from /api/predict/{binId}
#[derive(Debug, Deserialize)]
struct PredictResponse {
    bin_id: String,
    predictions: WirePredictions,
    risk_assessment: WireRiskAssessment,
}

#[derive(Debug, Deserialize)]
struct WireAlert {
    id: String,
    #[serde(rename = "binId")]
    bin_id: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    location: String,
    #[serde(default, rename = "fillLevel")]
    fill_level: Option<f64>,
    #[serde(default, rename = "priorityScore")]
    priority_score: Option<f64>,
    #[serde(default, rename = "wasteType")]
    waste_type: Option<String>,
}

/// Response from /api/alerts
#[derive(Debug, Deserialize)]
struct AlertsResponse {
    alerts: Vec<WireAlert>,
}

/// [`BackendPort`] talking to the SmartWaste backend over HTTP.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the backend at `base_url`, e.g. `http://127.0.0.1:5000`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Backend address without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{path}", self.base_url))
    }

    /// `path` followed by the bin id as one percent-encoded segment.
    fn get_bin(&self, path: &str, bin: &BinId) -> Result<RequestBuilder, GatewayError> {
        let raw = format!("{}{path}", self.base_url);
        let mut url =
            Url::parse(&raw).map_err(|err| GatewayError::InvalidUrl(format!("{raw}: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(raw.clone()))?
            .push(&bin.0);
        Ok(self.client.get(url))
    }
}

#[async_trait]
impl BackendPort for HttpGateway {
    async fn health(&self) -> Result<HealthReport, GatewayError> {
        let resp = fetch_json::<HealthResponse>(self.get("/api/health")).await?;
        if resp.status != HEALTHY_STATUS {
            return Err(GatewayError::Unhealthy {
                status: resp.status,
            });
        }
        Ok(HealthReport {
            status: resp.status,
            database: resp.database,
            ml_model: resp.ml_model,
            bins_count: resp.bins_count,
        })
    }

    async fn bins(&self) -> Result<BinSnapshot, GatewayError> {
        let resp = fetch_json::<BinsResponse>(self.get("/api/bins")).await?;
        debug!(count = resp.bins.len(), "bins fetched");

        Ok(BinSnapshot {
            bins: resp.bins.into_iter().map(Bin::from).collect(),
            system_stats: resp.system_stats.map(|stats| SystemStats {
                total_bins: stats.total_bins,
                active_bins: stats.active_bins,
                fuel_savings_percent: stats.fuel_savings_percent,
                collection_efficiency: stats.collection_efficiency,
            }),
        })
    }

    async fn optimize_route(&self) -> Result<OptimizedRoute, GatewayError> {
        let resp = fetch_json::<RouteResponse>(self.get("/api/route/optimize")).await?;

        let stops = resp
            .route
            .into_iter()
            .map(|stop| RouteStop {
                stop_number: stop.stop_number,
                bin_id: BinId(stop.bin_id),
                location: stop.location,
                coordinates: stop.coordinates.map(Coordinate::from),
                category: stop
                    .waste_type
                    .as_deref()
                    .map_or(WasteCategory::General, WasteCategory::normalize),
                fill_level: stop.fill_level,
                priority_score: stop.priority_score,
                distance_from_previous_km: stop.distance_from_previous,
                travel_time_minutes: stop.travel_time_minutes,
                collection_time_minutes: stop.collection_time_minutes,
                estimated_arrival: stop.estimated_arrival,
                predicted_fill_on_arrival: stop.predicted_fill_on_arrival,
            })
            .collect();

        Ok(OptimizedRoute {
            stops,
            summary: RouteSummary {
                total_stops: resp.summary.total_stops,
                total_distance_km: resp.summary.total_distance_km,
                estimated_time_minutes: resp.summary.estimated_time_minutes,
                fuel_savings_percent: resp.summary.fuel_savings_percent,
                high_priority_stops: resp.summary.high_priority_stops,
            },
            algorithm: resp.optimization_info.and_then(|info| info.algorithm),
        })
    }

    async fn navigate(&self, bin: &BinId) -> Result<NavigationPlan, GatewayError> {
        let resp =
            fetch_bin_json::<NavigateResponse>(self.get_bin("/api/navigate", bin)?, bin).await?;

        Ok(NavigationPlan {
            target_bin: Bin::from(resp.target_bin),
            distance_km: resp.navigation.distance_km,
            estimated_travel_minutes: resp.navigation.estimated_travel_time_minutes,
            predicted_fill_on_arrival: resp.navigation.predicted_fill_on_arrival,
            justification: resp.navigation.priority_justification,
            traffic: resp.traffic_info.map(|traffic| TrafficInfo {
                estimated_delay_minutes: traffic.estimated_delay,
                route_status: traffic.route_status,
            }),
        })
    }

    async fn predict(&self, bin: &BinId) -> Result<Prediction, GatewayError> {
        let resp =
            fetch_bin_json::<PredictResponse>(self.get_bin("/api/predict", bin)?, bin).await?;
        let predictions = resp.predictions;
        let risk = resp.risk_assessment;

        Ok(Prediction {
            bin_id: BinId(resp.bin_id),
            hours_to_80_percent: predictions.hours_to_80_percent,
            hours_to_90_percent: predictions.hours_to_90_percent,
            hours_to_full: predictions.hours_to_full,
            daily_fill_rate_percent: predictions.daily_fill_rate_percent,
            predicted_collection: predictions
                .predicted_collection_date
                .as_deref()
                .and_then(parse_timestamp),
            risk: RiskAssessment {
                overall_score: risk.overall_risk_score,
                level: RiskLevel::parse(&risk.risk_level),
                recommendations: risk.recommendations,
            },
        })
    }

    async fn alerts(&self) -> Result<Vec<Alert>, GatewayError> {
        let resp = fetch_json::<AlertsResponse>(self.get("/api/alerts")).await?;

        Ok(resp
            .alerts
            .into_iter()
            .map(|alert| Alert {
                id: alert.id,
                bin_id: BinId(alert.bin_id),
                severity: map_severity(&alert.severity),
                message: alert.message,
                location: alert.location,
                fill_level: alert.fill_level,
                priority_score: alert.priority_score,
                category: alert
                    .waste_type
                    .as_deref()
                    .map_or(WasteCategory::General, WasteCategory::normalize),
            })
            .collect())
    }
}

fn map_severity(raw: &str) -> AlertSeverity {
    match raw.to_lowercase().as_str() {
        "critical" => AlertSeverity::Critical,
        "high" => AlertSeverity::High,
        _ => AlertSeverity::Info,
    }
}

/// Accepts the backend's ISO timestamps with or without fraction/`Z`, and `%Y-%m-%d %H:%M`.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M"))
        .ok()
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
    req.send()
        .await
        .map_err(GatewayError::from)?
        .error_for_status()
        .map_err(GatewayError::from)?
        .json()
        .await
        .map_err(GatewayError::from)
}

// Same as fetch_json, but a 404 means the backend does not know the bin.
async fn fetch_bin_json<T: DeserializeOwned>(
    req: RequestBuilder,
    bin: &BinId,
) -> Result<T, GatewayError> {
    let resp = req.send().await.map_err(GatewayError::from)?;
    if resp.status() == StatusCode::NOT_FOUND {
        return Err(GatewayError::BinNotFound(bin.clone()));
    }
    resp.error_for_status()
        .map_err(GatewayError::from)?
        .json()
        .await
        .map_err(GatewayError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slashes() {
        let gateway = HttpGateway::new(Client::new(), "http://localhost:5000//");
        assert_eq!(gateway.base_url(), "http://localhost:5000");
    }

    #[test]
    fn parses_backend_timestamps() {
        assert!(parse_timestamp("2024-05-01T10:20:30.123456").is_some());
        assert!(parse_timestamp("2024-05-01T10:20:30Z").is_some());
        assert!(parse_timestamp("2024-05-01 10:20").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn waste_type_wins_over_type() {
        let wire = WireBin {
            id: "BIN003".to_owned(),
            location: "Market Street".to_owned(),
            address: None,
            coordinates: None,
            typ: Some("General Waste".to_owned()),
            waste_type: Some("organic".to_owned()),
            fill_level: 92.0,
            priority_score: 0.81,
            status: Some("alert".to_owned()),
            hazard_score: Some(7.0),
            predicted_full_time: Some("12h".to_owned()),
            last_update: None,
            battery_level: Some(95.0),
            temperature: Some(28.5),
            weight: None,
            sensor_data: Some(WireSensorData {
                gas_reading: Some(640.0),
                humidity: Some(55.0),
                weight: Some(55.2),
            }),
        };
        let bin = Bin::from(wire);
        assert_eq!(bin.category, WasteCategory::Biodegradable);
        assert_eq!(bin.status, BinStatus::Alert);
        assert_eq!(bin.sensors.weight_kg, Some(55.2));
        assert_eq!(bin.sensors.gas_ppm, Some(640.0));
    }

    #[test]
    fn maps_alert_severity() {
        assert_eq!(map_severity("Critical"), AlertSeverity::Critical);
        assert_eq!(map_severity("high"), AlertSeverity::High);
        assert_eq!(map_severity("low"), AlertSeverity::Info);
    }
}
