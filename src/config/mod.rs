// src/config/mod.rs
//! Process configuration (environment driven, `.env` aware via `dotenvy` in main).

pub mod server;

pub use server::{LogFormat, ServiceConfig};
