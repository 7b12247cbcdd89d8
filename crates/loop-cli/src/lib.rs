//! Loop CLI - command line tools for the loop route planner.
//!
//! Binaries:
//! - plan_loop: generate and fit one loop against OpenRouteService

pub mod report;

pub use report::render_outcome;
