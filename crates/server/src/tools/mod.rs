//! MCP tool implementations.
//!
//! This module contains all tools exposed by the rostercache server.

pub mod cache;
pub mod shell_fetch;
pub mod shell_register;
pub mod shell_warm;

#[cfg(test)]
pub(crate) mod testing;

pub use shell_fetch::{ShellFetchParams, fetch_impl};
pub use shell_register::register_impl;
pub use shell_warm::{ShellWarmParams, warm_impl};
