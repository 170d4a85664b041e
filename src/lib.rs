pub mod api;
pub mod auth;
pub mod authorization;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observer;
pub mod search;
pub mod server;
pub mod services;
pub mod state;

pub use server::app;
pub use state::AppState;
