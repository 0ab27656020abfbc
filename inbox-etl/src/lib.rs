pub mod aggregator;
pub mod config;
pub mod error;
pub mod job;
pub mod normalizer;
pub mod publish;
pub mod record;
