//! Entry point for the allocation engine binary.
//!
//! Running this binary starts an HTTP server exposing the pricing
//! API.  The directory containing per-company settings overrides may
//! be specified via the `ALLOC_SETTINGS_DIR` environment variable; if
//! unset the server looks for a `settings` folder relative to the
//! current working directory.  `ALLOC_BIND_ADDR` overrides the bind
//! address (default `127.0.0.1:3000`).

use allocation_engine::{api, logging, settings::AllocationOptions};
use anyhow::Result;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let settings_dir =
        PathBuf::from(std::env::var("ALLOC_SETTINGS_DIR").unwrap_or_else(|_| "settings".into()));
    let addr = std::env::var("ALLOC_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    api::serve(&addr, settings_dir, AllocationOptions::default()).await
}
