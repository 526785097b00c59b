//! Financial settings and allocation policy knobs.
//!
//! Each company carries a `financial_settings` record; the engine only
//! needs the profit margin from it.  The HTTP layer can additionally
//! load per-company overrides from a directory of JSON files so that
//! requests which omit `settings` still pick up the margin configured
//! for their `company_id`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_PROFIT_MARGIN: f64 = 20.0;

/// Per-company financial settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FinancialSettings {
    /// Profit margin as a percentage (20 means +20%).
    #[serde(default = "default_margin")]
    pub profit_margin: f64,
}

fn default_margin() -> f64 {
    DEFAULT_PROFIT_MARGIN
}

impl Default for FinancialSettings {
    fn default() -> Self {
        FinancialSettings {
            profit_margin: DEFAULT_PROFIT_MARGIN,
        }
    }
}

/// Which allocation model to run.
///
/// The system evolved from a plain weight split to the advanced model;
/// both are kept.  `Simplified` fixes the tariff and SLA multipliers to
/// 1.0 and disables the staffing-shortage penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    #[default]
    Advanced,
    Simplified,
}

/// Policy for a client binding that references a service name missing
/// from the catalog.  Historically these were dropped without a trace;
/// `Skip` keeps that behavior but logs it, `Reject` fails the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownServicePolicy {
    #[default]
    Skip,
    Reject,
}

/// Options controlling one allocation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationOptions {
    pub mode: AllocationMode,
    pub unknown_services: UnknownServicePolicy,
}

impl AllocationOptions {
    pub fn simplified() -> Self {
        AllocationOptions {
            mode: AllocationMode::Simplified,
            ..Default::default()
        }
    }
}

/// One settings-override file: a company id plus its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySettings {
    pub company: String,
    #[serde(flatten)]
    pub settings: FinancialSettings,
}

/// Load per-company settings overrides from a directory.
///
/// Scans `path` for `.json` files and parses each as a
/// [`CompanySettings`] document.  Files that fail to parse are logged
/// and skipped.  A missing directory yields an empty map.
pub fn load_settings_from_dir(path: &Path) -> Result<HashMap<String, FinancialSettings>> {
    let mut overrides = HashMap::new();
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let data = std::fs::read_to_string(entry.path())?;
            match serde_json::from_str::<CompanySettings>(&data) {
                Ok(doc) => {
                    overrides.insert(doc.company, doc.settings);
                }
                Err(err) => {
                    warn!(path = %entry.path().display(), %err, "skipping unparsable settings file");
                }
            }
        }
    }
    Ok(overrides)
}
