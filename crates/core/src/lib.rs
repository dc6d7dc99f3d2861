//! Core types and shared functionality for rostercache.
//!
//! This crate provides:
//! - Cache storage with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheStorage, HttpResponse, MemoryStorage, StoreSummary};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
