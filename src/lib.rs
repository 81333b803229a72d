pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
