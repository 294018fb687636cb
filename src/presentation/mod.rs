// Presentation layer - HTTP surface over the live dashboard
pub mod app_state;
pub mod handlers;
