//! Data models for the allocation engine.
//!
//! The `models` module defines the serialisable structs and enums that
//! make up a company snapshot (employees, expenses, services, client
//! assignments) and the pricing result produced from it.  Input
//! documents use the snake_case field names of the original service
//! records; the pricing result serialises in camelCase to match the
//! wire shape the legacy front end consumes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::settings::FinancialSettings;

/// A recurring company expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub name: String,
    /// Amount paid once per `period`.
    pub amount: f64,
    /// Number of periods the amount covers.  The caller is expected to
    /// keep this positive; zero degrades to 1 rather than dividing by
    /// zero.
    #[serde(default = "default_period")]
    pub period: u32,
    #[serde(default)]
    pub period_type: PeriodType,
}

fn default_period() -> u32 {
    1
}

/// Billing period granularity for an [`Expense`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    Months,
    Years,
}

impl Expense {
    /// The expense normalised to a monthly amount.
    pub fn monthly_amount(&self) -> f64 {
        let periods = self.period.max(1) as f64;
        match self.period_type {
            PeriodType::Months => self.amount / periods,
            PeriodType::Years => self.amount / (periods * 12.0),
        }
    }
}

/// An employee on the company payroll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    /// Monthly salary.
    pub salary: f64,
    /// Skill tags matched against a service's required specializations.
    #[serde(default)]
    pub specializations: HashSet<String>,
    /// Names of catalog services this employee supports directly.
    #[serde(default)]
    pub supported_services: HashSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
}

/// Delivery model of a catalog service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ServiceType {
    SaaS,
    IaaS,
    PaaS,
}

/// A service in the company catalog.  Names are unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Complexity weight, nominally 1–5.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub required_specializations: HashSet<String>,
}

fn default_weight() -> f64 {
    1.0
}

/// One equipment category in a client's metadata.
///
/// Three wire shapes have accumulated over the life of the system: a
/// simple `{count, weight}` leaf, a map of named items, and a bare
/// number from the oldest documents (count with an implied weight of
/// 1).  The variants are resolved once via [`EquipmentCategory::leaves`];
/// the engine never branches on the raw shape.  Anything else is
/// malformed and contributes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EquipmentCategory {
    Simple { count: f64, weight: f64 },
    Items(BTreeMap<String, EquipmentItem>),
    Legacy(f64),
    Malformed(serde_json::Value),
}

/// A named item inside a complex equipment category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EquipmentItem {
    Detailed {
        count: f64,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    Legacy(f64),
    Malformed(serde_json::Value),
}

/// A canonical `{count, weight}` leaf resolved from any category shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquipmentLeaf {
    pub count: f64,
    pub weight: f64,
}

impl EquipmentCategory {
    /// Resolves the category into canonical leaves, applying the
    /// legacy-format defaults.
    pub fn leaves(&self) -> Vec<EquipmentLeaf> {
        match self {
            EquipmentCategory::Simple { count, weight } => vec![EquipmentLeaf {
                count: *count,
                weight: *weight,
            }],
            EquipmentCategory::Items(items) => items
                .values()
                .filter_map(|item| match item {
                    EquipmentItem::Detailed { count, weight } => Some(EquipmentLeaf {
                        count: *count,
                        weight: *weight,
                    }),
                    EquipmentItem::Legacy(count) => Some(EquipmentLeaf {
                        count: *count,
                        weight: 1.0,
                    }),
                    EquipmentItem::Malformed(_) => None,
                })
                .collect(),
            EquipmentCategory::Legacy(count) => vec![EquipmentLeaf {
                count: *count,
                weight: 1.0,
            }],
            EquipmentCategory::Malformed(_) => Vec::new(),
        }
    }
}

/// A client's subscription entry for one catalog service.  The
/// capitalised keys are the legacy document shape; only entries with
/// `Use == 1` count toward weight, and pricing always uses the catalog
/// weight rather than the one stored on the binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientServiceBinding {
    #[serde(rename = "Use", default)]
    pub use_flag: i64,
    #[serde(rename = "Weight", default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(rename = "Quality", default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(
        rename = "Description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl ClientServiceBinding {
    pub fn is_active(&self) -> bool {
        self.use_flag == 1
    }
}

/// A client assigned to the company, with its equipment metadata,
/// service subscriptions and pricing multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAssignment {
    pub name: String,
    /// Equipment metadata keyed by category name.
    #[serde(default)]
    pub metadata: BTreeMap<String, EquipmentCategory>,
    /// Service bindings keyed by catalog service name.
    #[serde(default)]
    pub services: BTreeMap<String, ClientServiceBinding>,
    #[serde(default = "default_multiplier")]
    pub tariff_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub sla_multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// Input to the allocation engine: a snapshot of one company's data,
/// assembled by the caller.  The engine holds no state between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub clients: Vec<ClientAssignment>,
    /// Financial settings for the run; defaults apply when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FinancialSettings>,
}

/// Per-client pricing breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPrice {
    pub name: String,
    pub equipment_weight: f64,
    pub services_weight: f64,
    /// `equipment_weight + services_weight`.
    pub base_weight: f64,
    pub tariff_multiplier: f64,
    pub sla_multiplier: f64,
    /// `base_weight × tariff_multiplier × sla_multiplier`.
    pub adjusted_weight: f64,
    /// `adjusted_weight × cost_per_unit`, before margin.
    pub base_cost: f64,
    /// `base_cost × (1 + margin)`.
    pub final_price: f64,
    /// Share of the total system weight, in percent.
    pub weight_percentage: f64,
}

/// Aggregate figures over one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub client_count: usize,
}

/// The result of one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub client_prices: Vec<ClientPrice>,
    pub total_monthly_costs: f64,
    pub total_system_weight: f64,
    pub cost_per_unit: f64,
    pub profit_margin: f64,
    pub summary: AllocationSummary,
}

/// Weight of a client's active services plus the per-employee load
/// distribution computed alongside it.  The load map is telemetry for
/// inspection and tests; it does not feed into pricing.
#[derive(Debug, Clone, Default)]
pub struct ServicesWeight {
    pub total_weight: f64,
    pub specialist_load: HashMap<String, f64>,
}
