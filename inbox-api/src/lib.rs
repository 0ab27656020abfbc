pub mod api;
pub mod config;
pub mod dashboard;
pub mod router;
pub mod server;
pub mod snapshot;
pub mod store;
pub mod tickets;
pub mod transition;
