//! Shared library surface for the loop server and its tests.

pub mod api;
pub mod config;
pub mod state;
