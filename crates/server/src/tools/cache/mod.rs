//! Cache inspection tools.

pub mod stores;

pub use stores::{CacheStoresOutput, stores_impl};
