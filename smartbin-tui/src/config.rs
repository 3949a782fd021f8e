use std::{path::PathBuf, time::Duration};

use clap::{Parser, value_parser};
use smartbin_core::{model::Coordinate, service::DashboardConfig};

/// Monitor waste bins and simulate collection trips from the terminal.
#[derive(Debug, Parser)]
#[command(name = "smartbin", version, about)]
pub(crate) struct Config {
    /// Base address of the SmartWaste backend.
    #[arg(long, env = "SMARTBIN_BACKEND_URL", default_value = smartbin_gateway::DEFAULT_BASE_URL)]
    pub(crate) backend_url: String,

    /// Seconds between automatic bin refreshes.
    #[arg(long, env = "SMARTBIN_REFRESH_SECS", default_value_t = 30, value_parser = value_parser!(u64).range(1..))]
    pub(crate) refresh_secs: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "SMARTBIN_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub(crate) request_timeout_secs: u64,

    /// Latitude of the depot the vehicle starts from.
    #[arg(long, env = "SMARTBIN_DEPOT_LAT", default_value_t = 40.7128, allow_negative_numbers = true)]
    pub(crate) depot_lat: f64,

    /// Longitude of the depot the vehicle starts from.
    #[arg(long, env = "SMARTBIN_DEPOT_LNG", default_value_t = -74.006, allow_negative_numbers = true)]
    pub(crate) depot_lng: f64,

    /// File receiving the log output (the terminal belongs to the UI).
    #[arg(long, env = "SMARTBIN_LOG_FILE", default_value = "smartbin.log")]
    pub(crate) log_file: PathBuf,
}

impl Config {
    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub(crate) fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            depot: Coordinate::new(self.depot_lat, self.depot_lng),
            refresh_period: Duration::from_secs(self.refresh_secs),
        }
    }
}
