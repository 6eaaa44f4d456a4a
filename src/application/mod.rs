// Application layer - Poll loop, history fetches and view assembly
pub mod dashboard_service;
pub mod history_service;
pub mod poll_loop;
pub mod sensor_api;
pub mod streaming_service;
