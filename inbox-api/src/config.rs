use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

use inbox_common::ticket::{TicketPriority, TicketStatus};

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3302")]
    pub port: u16,

    #[envconfig(from = "PROMETHEUS_BIND_PORT", default = "9102")]
    pub prometheus_port: u16,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    #[envconfig(from = "TICKETS_PATH", default = "data/processed/tickets.json")]
    pub tickets_path: String,

    #[envconfig(from = "METRICS_PATH", default = "data/processed/metrics.json")]
    pub metrics_path: String,

    #[envconfig(
        from = "WEBHOOK_URL",
        default = "http://localhost:5678/webhook/ticket-updated"
    )]
    pub webhook_url: String,

    #[envconfig(default = "3")]
    pub max_attempts: u32,

    #[envconfig(default = "5000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(default = "1024")]
    pub max_concurrent_deliveries: usize,

    #[envconfig(nested = true)]
    pub retry_policy: RetryPolicyConfig,

    // The qualifying-transition predicate is product policy, not code.
    #[envconfig(from = "NOTIFY_ON_PRIORITY", default = "high")]
    pub notify_on_priority: TicketPriority,

    #[envconfig(from = "NOTIFY_ON_STATUS", default = "closed")]
    pub notify_on_status: TicketStatus,
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn prometheus_bind(&self) -> String {
        format!("{}:{}", self.host, self.prometheus_port)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl std::fmt::Display for ParseEnvMsDurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "expected a duration in whole milliseconds")
    }
}

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[derive(Envconfig, Clone)]
pub struct RetryPolicyConfig {
    #[envconfig(default = "2")]
    pub backoff_coefficient: u32,

    #[envconfig(default = "1000")]
    pub initial_interval: EnvMsDuration,

    #[envconfig(default = "100000")]
    pub maximum_interval: EnvMsDuration,
}
