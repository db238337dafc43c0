pub mod config;
pub mod inspect;
pub mod simulate;
pub mod telemetry;
