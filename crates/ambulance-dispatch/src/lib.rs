pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod telemetry;
pub mod workflows;
