//! Domain data structures for bins, routes, navigation plans, and predictions.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Identifier for a monitored bin, e.g. `BIN003`.
pub struct BinId(pub String);

impl fmt::Display for BinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for BinId {
    fn from(raw: &str) -> Self {
        BinId(raw.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Geographic point in decimal degrees.
pub struct Coordinate {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both axes are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Linear interpolation toward `target`, each axis independently.
    ///
    /// `fraction` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(&self, target: Coordinate, fraction: f64) -> Coordinate {
        let fraction = fraction.clamp(0.0, 1.0);
        Coordinate {
            lat: self.lat + fraction * (target.lat - self.lat),
            lng: self.lng + fraction * (target.lng - self.lng),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Waste categories a bin can hold.
pub enum WasteCategory {
    /// Residual/general waste.
    General,
    /// Recyclables.
    Recyclable,
    /// Organic waste.
    Biodegradable,
    /// Hazardous material requiring special handling.
    Hazardous,
}

impl WasteCategory {
    /// Normalize any backend spelling into a category.
    ///
    /// Accepts the human vocabulary ("General Waste", "Recycling", "Organic Waste",
    /// "Hazardous"), the internal one (general/recyclable/biodegradable/hazardous),
    /// and the backend's derived slugs (recycling/organic). Anything else is general.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let tag = raw.trim().to_lowercase().replace(['_', '-'], " ");
        match tag.as_str() {
            "recycling" | "recyclable" | "recyclables" => WasteCategory::Recyclable,
            "organic waste" | "organic" | "biodegradable" => WasteCategory::Biodegradable,
            "hazardous" | "hazardous waste" => WasteCategory::Hazardous,
            _ => WasteCategory::General,
        }
    }

    /// Internal slug.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            WasteCategory::General => "general",
            WasteCategory::Recyclable => "recyclable",
            WasteCategory::Biodegradable => "biodegradable",
            WasteCategory::Hazardous => "hazardous",
        }
    }

    /// Human readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WasteCategory::General => "General Waste",
            WasteCategory::Recyclable => "Recycling",
            WasteCategory::Biodegradable => "Organic Waste",
            WasteCategory::Hazardous => "Hazardous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Operational status reported for a bin.
pub enum BinStatus {
    /// Nothing to report.
    Normal,
    /// Filling up or mildly hazardous.
    Warning,
    /// Needs attention soon.
    Alert,
    /// Needs attention now.
    Critical,
    /// Sensor not reporting.
    Offline,
    /// Any other backend-specific status.
    Other(String),
}

impl BinStatus {
    /// Parse a backend status string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "normal" | "ok" => BinStatus::Normal,
            "warning" => BinStatus::Warning,
            "alert" => BinStatus::Alert,
            "critical" => BinStatus::Critical,
            "offline" => BinStatus::Offline,
            _ => BinStatus::Other(raw.trim().to_owned()),
        }
    }
}

impl fmt::Display for BinStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BinStatus::Normal => "normal",
            BinStatus::Warning => "warning",
            BinStatus::Alert => "alert",
            BinStatus::Critical => "critical",
            BinStatus::Offline => "offline",
            BinStatus::Other(other) => other.as_str(),
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Optional sensor readings attached to a bin.
pub struct SensorReadings {
    /// Gas concentration in ppm.
    pub gas_ppm: Option<f64>,
    /// Content weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Temperature in degrees Celsius.
    pub temperature_c: Option<f64>,
    /// Sensor battery charge in percent.
    pub battery_percent: Option<f64>,
    /// Relative humidity in percent.
    pub humidity_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A monitored waste bin.
pub struct Bin {
    /// Unique identifier.
    pub id: BinId,
    /// Short location label, e.g. "Market Street".
    pub location: String,
    /// Street address, when known.
    pub address: Option<String>,
    /// Position; missing when the backend has none.
    pub coordinates: Option<Coordinate>,
    /// Normalized waste category.
    pub category: WasteCategory,
    /// Fill level in percent (0–100).
    pub fill_level: f64,
    /// Collection priority (0.0–1.0).
    pub priority_score: f64,
    /// Reported status.
    pub status: BinStatus,
    /// Sensor readings.
    pub sensors: SensorReadings,
    /// Backend hazard score (0–10).
    pub hazard_score: Option<f64>,
    /// Predicted time until full, as reported (e.g. "12h").
    pub predicted_full: Option<String>,
    /// Timestamp of the last sensor update.
    pub last_update: Option<NaiveDateTime>,
}

impl Bin {
    /// Coordinates when present and valid.
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        self.coordinates.filter(Coordinate::is_valid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Statistics reported by the backend alongside the bin list.
pub struct SystemStats {
    /// Total bins known to the backend.
    pub total_bins: Option<usize>,
    /// Bins not offline.
    pub active_bins: Option<usize>,
    /// Estimated fuel savings of optimized routing, in percent.
    pub fuel_savings_percent: Option<f64>,
    /// Collection efficiency, in percent.
    pub collection_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// One full bin list as returned by the backend.
pub struct BinSnapshot {
    /// Bins in backend order.
    pub bins: Vec<Bin>,
    /// Backend statistics, when provided.
    pub system_stats: Option<SystemStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single stop of an optimized route.
pub struct RouteStop {
    /// 1-based position in the route.
    pub stop_number: u32,
    /// Bin collected at this stop.
    pub bin_id: BinId,
    /// Location label.
    pub location: String,
    /// Stop position.
    pub coordinates: Option<Coordinate>,
    /// Category of the bin.
    pub category: WasteCategory,
    /// Fill level when the route was computed.
    pub fill_level: f64,
    /// Priority score when the route was computed.
    pub priority_score: f64,
    /// Distance from the previous stop in kilometers.
    pub distance_from_previous_km: f64,
    /// Driving time from the previous stop.
    pub travel_time_minutes: u32,
    /// Time spent collecting.
    pub collection_time_minutes: u32,
    /// Wall-clock arrival estimate, "HH:MM".
    pub estimated_arrival: Option<String>,
    /// Expected fill level on arrival.
    pub predicted_fill_on_arrival: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Totals for an optimized route.
pub struct RouteSummary {
    /// Number of stops.
    pub total_stops: u32,
    /// Total distance in kilometers.
    pub total_distance_km: f64,
    /// Total driving and collection time.
    pub estimated_time_minutes: u32,
    /// Estimated fuel savings in percent.
    pub fuel_savings_percent: f64,
    /// Stops with priority above 0.7.
    pub high_priority_stops: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Route returned by the backend optimizer.
pub struct OptimizedRoute {
    /// Stops in visiting order.
    pub stops: Vec<RouteStop>,
    /// Route totals.
    pub summary: RouteSummary,
    /// Name of the optimization algorithm, if reported.
    pub algorithm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Traffic conditions on the way to a bin.
pub struct TrafficInfo {
    /// Expected delay in minutes.
    pub estimated_delay_minutes: u32,
    /// Status label such as `light_traffic`.
    pub route_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Navigation data toward a single bin.
pub struct NavigationPlan {
    /// Snapshot of the destination bin.
    pub target_bin: Bin,
    /// Road distance in kilometers.
    pub distance_km: f64,
    /// Estimated driving time.
    pub estimated_travel_minutes: u32,
    /// Expected fill level on arrival.
    pub predicted_fill_on_arrival: f64,
    /// Why this bin was picked.
    pub justification: Option<String>,
    /// Traffic conditions, when known.
    pub traffic: Option<TrafficInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Coarse risk bucket.
pub enum RiskLevel {
    /// Normal monitoring.
    Low,
    /// Collection needed soon.
    Medium,
    /// Collection needed now.
    High,
    /// Unrecognized level.
    Other(String),
}

impl RiskLevel {
    /// Parse a backend risk level.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Other(raw.trim().to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Risk evaluation for a bin.
pub struct RiskAssessment {
    /// Overall score (0.0–1.0).
    pub overall_score: f64,
    /// Risk bucket.
    pub level: RiskLevel,
    /// Recommended actions.
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Fill-level prediction and risk for a bin.
pub struct Prediction {
    /// Bin the prediction is about.
    pub bin_id: BinId,
    /// Hours until the bin reaches 80 %.
    pub hours_to_80_percent: f64,
    /// Hours until the bin reaches 90 %.
    pub hours_to_90_percent: f64,
    /// Hours until the bin is full.
    pub hours_to_full: f64,
    /// Daily fill rate in percent.
    pub daily_fill_rate_percent: Option<f64>,
    /// Suggested collection time.
    pub predicted_collection: Option<NaiveDateTime>,
    /// Risk evaluation.
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Severity of a backend alert.
pub enum AlertSeverity {
    /// Hazardous bins requiring attention.
    Critical,
    /// Bins near overflow.
    High,
    /// Anything else.
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Active alert reported by the backend.
pub struct Alert {
    /// Alert identifier.
    pub id: String,
    /// Affected bin.
    pub bin_id: BinId,
    /// Severity.
    pub severity: AlertSeverity,
    /// Human readable message.
    pub message: String,
    /// Location label of the bin.
    pub location: String,
    /// Fill level at alert time.
    pub fill_level: Option<f64>,
    /// Priority of the bin at alert time.
    pub priority_score: Option<f64>,
    /// Waste category of the bin.
    pub category: WasteCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Result of a backend health probe.
pub struct HealthReport {
    /// Reported status, `healthy` when all is well.
    pub status: String,
    /// Storage mode, e.g. `firestore` or `in-memory`.
    pub database: Option<String>,
    /// ML model availability.
    pub ml_model: Option<String>,
    /// Number of bins known to the backend.
    pub bins_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Outcome of the last health check.
pub enum ConnectionStatus {
    /// Backend answered healthy.
    Connected,
    /// Backend unreachable or unhealthy.
    Error,
    /// No health check yet.
    #[default]
    Unknown,
}
