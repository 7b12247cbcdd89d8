//! Loop Services - clients for the external routing engine and planner model
//!
//! Both map transport problems to `RouteError::NetworkFailure` at the trait
//! boundary so the core never sees HTTP details.

pub mod cache;
pub mod ollama;
pub mod ors;

pub use cache::CachedRouteClient;
pub use ollama::OllamaPlanner;
pub use ors::OrsClient;
