//! Allocation Engine library crate.
//!
//! This crate exposes the weighted cost-allocation engine and API
//! components as reusable modules.  External applications may depend
//! on the `allocation_engine` crate and call into `engine::allocate`
//! directly or embed the API via `api::build_router`.

pub mod api;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod settings;
