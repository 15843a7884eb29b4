pub mod assemble;
pub mod cache;
pub mod cities;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod models;
pub mod refresh;
pub mod services;
pub mod session;
pub mod token_server;
pub mod views;
