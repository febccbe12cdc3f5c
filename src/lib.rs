pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fault;
pub mod secrets;
pub mod store;
pub mod views;
