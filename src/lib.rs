//! # Notion Bridge API Library
//!
//! This library provides the core functionality for the Notion Bridge API
//! service: webhook ingestion, the in-process event bus, Notion OAuth, and
//! the HTTP surface that ties them together.

pub mod auth;
pub mod bus;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod notion;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod webhooks;
pub use migration;
