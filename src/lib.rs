pub mod analytics;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod routes;
pub mod storage;
