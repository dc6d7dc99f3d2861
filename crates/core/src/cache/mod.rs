//! Named, versioned response stores.
//!
//! This module provides the durable key-response storage shared by the
//! interceptor, the lifecycle hooks and the warmer:
//!
//! - SQLite backend via tokio-rusqlite, with WAL mode and migrations
//! - Request identity keys hashed from the GET URL
//! - The injectable [`CacheStorage`] trait and an in-memory implementation

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod response;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use response::HttpResponse;
pub use storage::{CacheStorage, StoreSummary};
