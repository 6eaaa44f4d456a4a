// Domain layer - Sensor samples, rolling window and view models
pub mod connectivity;
pub mod dashboard;
pub mod sample;
pub mod series_buffer;
pub mod stats;
pub mod telemetry;
