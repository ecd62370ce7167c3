use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::engine::DEFAULT_BOOKING_ATTEMPTS;

/// Ten years. Anything longer makes the delayed count meaningless.
pub const MAX_DELAY_THRESHOLD_DAYS: i64 = 3650;

#[derive(Debug, Clone, Parser)]
#[command(name = "courier-node", about = "Courier shipment tracking service")]
pub struct Cli {
    /// Address the HTTP API listens on.
    #[arg(long, env = "COURIER_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// PostgreSQL connection string. Without one, shipments are kept in
    /// memory and lost on restart.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Upper bound on any single store operation, in milliseconds.
    #[arg(long, env = "COURIER_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Age after which an undelivered shipment counts as delayed.
    #[arg(
        long,
        env = "COURIER_DELAY_DAYS",
        default_value_t = 3,
        value_parser = clap::value_parser!(i64).range(0..=MAX_DELAY_THRESHOLD_DAYS)
    )]
    pub delay_threshold_days: i64,

    /// Tracking codes drawn per booking before a collision is reported.
    #[arg(
        long,
        env = "COURIER_BOOKING_ATTEMPTS",
        default_value_t = DEFAULT_BOOKING_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub booking_attempts: u32,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            delay_threshold: chrono::Duration::days(self.delay_threshold_days),
            booking_attempts: self.booking_attempts,
        }
    }
}

/// Knobs the service layer needs, independent of how they were supplied.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub store_timeout: Duration,
    pub delay_threshold: chrono::Duration,
    pub booking_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2000),
            delay_threshold: courier_common::dashboard::default_delay_threshold(),
            booking_attempts: DEFAULT_BOOKING_ATTEMPTS,
        }
    }
}
