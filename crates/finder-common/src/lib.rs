pub mod autocomplete;
pub mod booking;
pub mod config;
pub mod error;
pub mod filter;
pub mod generation;
pub mod geolocation;
pub mod intake;
pub mod mcp_api;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod presentation;
pub mod results;
pub mod search_api;
