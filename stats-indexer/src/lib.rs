pub mod config;
pub mod error;
pub mod metrics_consts;
pub mod models;
pub mod pipelines;
pub mod server;
pub mod sinks;
