pub mod metrics;
pub mod retry;
pub mod snapshot;
pub mod ticket;
