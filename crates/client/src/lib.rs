//! Offline caching agent for the roster gallery.
//!
//! The [`Agent`] intercepts the page's reads and serves each one with the
//! strategy its [`Classification`] calls for. The [`Warmer`] fills the
//! dynamic store on demand, outside the interception path.

pub mod agent;
pub mod best_effort;
pub mod classify;
pub mod fetch;
pub mod lifecycle;
pub mod request;
pub mod scope;
pub mod strategy;
pub mod warm;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use agent::{Agent, AgentState, Registration};
pub use best_effort::BestEffort;
pub use classify::{Classification, Strategy, classify};
pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use lifecycle::{ActivationReport, InstallReport};
pub use request::{Destination, Method, Request, parse_method};
pub use scope::Scope;
pub use strategy::{Interceptor, Outcome, Served, ServedBy};
pub use warm::{WarmReport, Warmer, working_set};
