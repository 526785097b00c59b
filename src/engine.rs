//! Weighted cost-allocation engine.
//!
//! The `engine` module turns an [`AllocationInput`] snapshot into a
//! [`PricingResult`].  It uses the [`rayon`] crate to parallelise the
//! per-client weight computations across CPU cores; the aggregation
//! and pricing steps are sequential.  The computation is pure: it
//! reads the snapshot, mutates nothing, and holds no state between
//! calls.

use crate::error::{AllocationError, NO_COST_INPUTS, NO_SYSTEM_WEIGHT};
use crate::models::{
    AllocationInput, AllocationSummary, ClientAssignment, ClientPrice, EquipmentCategory, Employee,
    Expense, PricingResult, Service, ServicesWeight,
};
use crate::settings::{AllocationMode, AllocationOptions, UnknownServicePolicy};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Weight multiplier applied to a service no employee can support.
/// Uncovered services are modeled as more expensive to run.
pub const STAFFING_SHORTAGE_PENALTY: f64 = 1.5;

/// Total equipment weight of a client's metadata: the sum of
/// `count × weight` over every resolved leaf.  Malformed entries
/// resolve to no leaves and contribute zero; the result never fails.
pub fn equipment_weight(metadata: &BTreeMap<String, EquipmentCategory>) -> f64 {
    metadata
        .values()
        .flat_map(EquipmentCategory::leaves)
        .map(|leaf| leaf.count * leaf.weight)
        .sum()
}

/// Total weight of a client's active service bindings, plus the
/// per-employee load distribution.
///
/// For each binding with `Use == 1` the catalog service is looked up by
/// name; unknown names follow `options.unknown_services`.  An employee
/// is available for a service when their `supported_services` contain
/// the service name or their specializations intersect the service's
/// required specializations.  A service with no available employee is
/// charged at [`STAFFING_SHORTAGE_PENALTY`] times its weight (advanced
/// mode only); otherwise the full weight counts and is split evenly
/// across the available employees in `specialist_load`.
pub fn services_weight(
    client: &ClientAssignment,
    catalog: &HashMap<&str, &Service>,
    employees: &[Employee],
    options: &AllocationOptions,
) -> Result<ServicesWeight, AllocationError> {
    let mut out = ServicesWeight::default();
    for (service_name, binding) in &client.services {
        if !binding.is_active() {
            continue;
        }
        let service = match catalog.get(service_name.as_str()) {
            Some(service) => *service,
            None => match options.unknown_services {
                UnknownServicePolicy::Skip => {
                    warn!(
                        client = %client.name,
                        service = %service_name,
                        "binding references a service missing from the catalog, skipping"
                    );
                    continue;
                }
                UnknownServicePolicy::Reject => {
                    return Err(AllocationError::UnknownServiceReference {
                        client: client.name.clone(),
                        service: service_name.clone(),
                    });
                }
            },
        };
        let available: Vec<&Employee> = employees
            .iter()
            .filter(|employee| {
                employee.supported_services.contains(&service.name)
                    || !employee
                        .specializations
                        .is_disjoint(&service.required_specializations)
            })
            .collect();
        if available.is_empty() {
            let penalty = match options.mode {
                AllocationMode::Advanced => STAFFING_SHORTAGE_PENALTY,
                AllocationMode::Simplified => 1.0,
            };
            out.total_weight += service.weight * penalty;
        } else {
            out.total_weight += service.weight;
            let share = service.weight / available.len() as f64;
            for employee in &available {
                *out
                    .specialist_load
                    .entry(employee.name.clone())
                    .or_insert(0.0) += share;
            }
        }
    }
    Ok(out)
}

struct ClientWeight {
    equipment: f64,
    services: ServicesWeight,
    tariff: f64,
    sla: f64,
}

impl ClientWeight {
    fn base(&self) -> f64 {
        self.equipment + self.services.total_weight
    }

    fn adjusted(&self) -> f64 {
        self.base() * self.tariff * self.sla
    }
}

/// Apportions the company's total monthly cost across its clients in
/// proportion to their adjusted infrastructure weight and applies the
/// profit margin.
///
/// Fails with [`AllocationError::InsufficientData`] when the snapshot
/// carries no cost inputs or no client weight; both divisions in the
/// algorithm are guarded by those checks and can never produce NaN or
/// infinity.
pub fn allocate(
    input: &AllocationInput,
    options: &AllocationOptions,
) -> Result<PricingResult, AllocationError> {
    let total_monthly_costs: f64 = input.employees.iter().map(|e| e.salary).sum::<f64>()
        + input.expenses.iter().map(Expense::monthly_amount).sum::<f64>();
    if total_monthly_costs <= 0.0 {
        return Err(AllocationError::InsufficientData(NO_COST_INPUTS));
    }

    let catalog: HashMap<&str, &Service> = input
        .services
        .iter()
        .map(|service| (service.name.as_str(), service))
        .collect();

    // Per-client weights are independent of each other
    let weights: Vec<ClientWeight> = input
        .clients
        .par_iter()
        .map(|client| {
            let (tariff, sla) = match options.mode {
                AllocationMode::Advanced => (client.tariff_multiplier, client.sla_multiplier),
                AllocationMode::Simplified => (1.0, 1.0),
            };
            Ok(ClientWeight {
                equipment: equipment_weight(&client.metadata),
                services: services_weight(client, &catalog, &input.employees, options)?,
                tariff,
                sla,
            })
        })
        .collect::<Result<_, AllocationError>>()?;

    let total_system_weight: f64 = weights.iter().map(ClientWeight::adjusted).sum();
    if total_system_weight <= 0.0 {
        return Err(AllocationError::InsufficientData(NO_SYSTEM_WEIGHT));
    }

    let cost_per_unit = total_monthly_costs / total_system_weight;
    let profit_margin = input.settings.unwrap_or_default().profit_margin;
    let client_prices: Vec<ClientPrice> = input
        .clients
        .iter()
        .zip(&weights)
        .map(|(client, weight)| {
            let adjusted_weight = weight.adjusted();
            let base_cost = adjusted_weight * cost_per_unit;
            ClientPrice {
                name: client.name.clone(),
                equipment_weight: weight.equipment,
                services_weight: weight.services.total_weight,
                base_weight: weight.base(),
                tariff_multiplier: weight.tariff,
                sla_multiplier: weight.sla,
                adjusted_weight,
                base_cost,
                final_price: base_cost * (1.0 + profit_margin / 100.0),
                weight_percentage: adjusted_weight / total_system_weight * 100.0,
            }
        })
        .collect();

    let total_revenue: f64 = client_prices.iter().map(|c| c.final_price).sum();
    Ok(PricingResult {
        summary: AllocationSummary {
            total_revenue,
            total_profit: total_revenue - total_monthly_costs,
            client_count: input.clients.len(),
        },
        client_prices,
        total_monthly_costs,
        total_system_weight,
        cost_per_unit,
        profit_margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientServiceBinding, ServiceType};
    use serde_json::json;

    fn category(value: serde_json::Value) -> EquipmentCategory {
        serde_json::from_value(value).unwrap()
    }

    fn catalog_service(name: &str, weight: f64, specs: &[&str]) -> Service {
        Service {
            name: name.into(),
            service_type: ServiceType::SaaS,
            weight,
            quality: "Medium".into(),
            required_specializations: specs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn employee(name: &str, specs: &[&str], supported: &[&str]) -> Employee {
        Employee {
            name: name.into(),
            salary: 10_000.0,
            specializations: specs.iter().map(|s| s.to_string()).collect(),
            supported_services: supported.iter().map(|s| s.to_string()).collect(),
            hourly_rate: None,
        }
    }

    fn client_with_services(names_active: &[(&str, i64)]) -> ClientAssignment {
        ClientAssignment {
            name: "client".into(),
            metadata: BTreeMap::new(),
            services: names_active
                .iter()
                .map(|(name, active)| {
                    (
                        name.to_string(),
                        ClientServiceBinding {
                            use_flag: *active,
                            weight: None,
                            service_type: None,
                            quality: None,
                            description: None,
                        },
                    )
                })
                .collect(),
            tariff_multiplier: 1.0,
            sla_multiplier: 1.0,
        }
    }

    #[test]
    fn equipment_weight_sums_all_category_shapes() {
        let mut metadata = BTreeMap::new();
        metadata.insert("servers".into(), category(json!({"count": 2, "weight": 3.0})));
        metadata.insert(
            "network".into(),
            category(json!({
                "switches": {"count": 4, "weight": 0.5},
                "printers": 3
            })),
        );
        metadata.insert("workstations".into(), category(json!(5)));
        // 2*3 + (4*0.5 + 3*1) + 5*1
        assert_eq!(equipment_weight(&metadata), 16.0);
    }

    #[test]
    fn equipment_weight_ignores_malformed_entries() {
        let mut metadata = BTreeMap::new();
        metadata.insert("bad".into(), category(json!("not equipment")));
        metadata.insert(
            "mixed".into(),
            category(json!({"ok": {"count": 1, "weight": 2.0}, "junk": null})),
        );
        assert_eq!(equipment_weight(&metadata), 2.0);
    }

    #[test]
    fn equipment_weight_of_empty_metadata_is_zero() {
        assert_eq!(equipment_weight(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn item_without_weight_defaults_to_one() {
        let cat = category(json!({"phones": {"count": 7}}));
        let leaves = cat.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].count * leaves[0].weight, 7.0);
    }

    #[test]
    fn inactive_bindings_do_not_count() {
        let services = vec![catalog_service("monitoring", 3.0, &[])];
        let catalog: HashMap<&str, &Service> =
            services.iter().map(|s| (s.name.as_str(), s)).collect();
        let client = client_with_services(&[("monitoring", 0)]);
        let out = services_weight(&client, &catalog, &[], &AllocationOptions::default()).unwrap();
        assert_eq!(out.total_weight, 0.0);
        assert!(out.specialist_load.is_empty());
    }

    #[test]
    fn uncovered_service_pays_shortage_penalty() {
        let services = vec![catalog_service("backup", 4.0, &["storage"])];
        let catalog: HashMap<&str, &Service> =
            services.iter().map(|s| (s.name.as_str(), s)).collect();
        let client = client_with_services(&[("backup", 1)]);
        let nobody = [employee("bob", &["networking"], &[])];
        let out =
            services_weight(&client, &catalog, &nobody, &AllocationOptions::default()).unwrap();
        assert_eq!(out.total_weight, 4.0 * STAFFING_SHORTAGE_PENALTY);
        assert!(out.specialist_load.is_empty());
    }

    #[test]
    fn simplified_mode_disables_penalty() {
        let services = vec![catalog_service("backup", 4.0, &["storage"])];
        let catalog: HashMap<&str, &Service> =
            services.iter().map(|s| (s.name.as_str(), s)).collect();
        let client = client_with_services(&[("backup", 1)]);
        let out =
            services_weight(&client, &catalog, &[], &AllocationOptions::simplified()).unwrap();
        assert_eq!(out.total_weight, 4.0);
    }

    #[test]
    fn covered_service_splits_load_evenly() {
        let services = vec![catalog_service("helpdesk", 3.0, &["support"])];
        let catalog: HashMap<&str, &Service> =
            services.iter().map(|s| (s.name.as_str(), s)).collect();
        let client = client_with_services(&[("helpdesk", 1)]);
        let staff = [
            employee("ann", &["support"], &[]),
            employee("bob", &[], &["helpdesk"]),
            employee("cid", &["devops"], &[]),
        ];
        let out =
            services_weight(&client, &catalog, &staff, &AllocationOptions::default()).unwrap();
        assert_eq!(out.total_weight, 3.0);
        assert_eq!(out.specialist_load.len(), 2);
        assert_eq!(out.specialist_load["ann"], 1.5);
        assert_eq!(out.specialist_load["bob"], 1.5);
    }

    #[test]
    fn unknown_service_is_skipped_by_default() {
        let catalog = HashMap::new();
        let client = client_with_services(&[("ghost", 1)]);
        let out = services_weight(&client, &catalog, &[], &AllocationOptions::default()).unwrap();
        assert_eq!(out.total_weight, 0.0);
    }

    #[test]
    fn unknown_service_rejected_under_strict_policy() {
        let catalog = HashMap::new();
        let client = client_with_services(&[("ghost", 1)]);
        let options = AllocationOptions {
            unknown_services: UnknownServicePolicy::Reject,
            ..Default::default()
        };
        let err = services_weight(&client, &catalog, &[], &options).unwrap_err();
        assert_eq!(
            err,
            AllocationError::UnknownServiceReference {
                client: "client".into(),
                service: "ghost".into(),
            }
        );
    }

    #[test]
    fn service_weight_counted_once_per_binding() {
        let services = vec![
            catalog_service("mail", 2.0, &[]),
            catalog_service("vpn", 1.0, &[]),
        ];
        let catalog: HashMap<&str, &Service> =
            services.iter().map(|s| (s.name.as_str(), s)).collect();
        let client = client_with_services(&[("mail", 1), ("vpn", 1)]);
        let staff = [employee("ann", &[], &["mail", "vpn"])];
        let out =
            services_weight(&client, &catalog, &staff, &AllocationOptions::default()).unwrap();
        assert_eq!(out.total_weight, 3.0);
        assert_eq!(out.specialist_load["ann"], 3.0);
    }
}
