// Presentation layer - HTTP routes for the dashboard front end
pub mod app_state;
pub mod handlers;
pub mod live_stream;
