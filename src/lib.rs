pub mod assessment;
pub mod config;
pub mod environment;
pub mod history;
pub mod logging;
pub mod monitor;
pub mod risk;
pub mod telemetry;
