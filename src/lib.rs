pub mod api;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod notifications;
pub mod seed;
pub mod store;
