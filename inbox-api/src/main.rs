use envconfig::Envconfig;

use inbox_api::config::Config;
use inbox_api::server;
use inbox_common::metrics::prometheus_router;

async fn shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("failed to load configuration from env");

    if config.export_prometheus {
        let bind = config.prometheus_bind();
        tokio::task::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .expect("failed to bind prometheus address");
            axum::serve(listener, prometheus_router())
                .await
                .expect("failed to start serving metrics");
        });
    }

    let listener = tokio::net::TcpListener::bind(config.bind())
        .await
        .expect("failed to bind server address");

    match server::serve(config, listener, shutdown()).await {
        Ok(_) => {}
        Err(e) => tracing::error!("failed to start inbox-api http server, {}", e),
    }
}
