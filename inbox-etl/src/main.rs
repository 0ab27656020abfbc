//! Batch job: normalize raw transaction rows into tickets and publish the
//! aggregated dashboard metrics.

use envconfig::Envconfig;

use inbox_etl::config::Config;
use inbox_etl::error::EtlError;

fn main() -> Result<(), EtlError> {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("failed to load configuration from env");

    inbox_etl::job::run(&config)
}
