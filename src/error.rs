//! Error taxonomy for the allocation engine.

use thiserror::Error;

/// Errors an allocation run can surface to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The snapshot cannot support an allocation at all.  Non-retryable;
    /// the message tells the operator what to configure.
    #[error("insufficient data for allocation: {0}")]
    InsufficientData(&'static str),

    /// A client binding references a service name absent from the
    /// catalog.  Only raised under [`UnknownServicePolicy::Reject`];
    /// the default policy skips the binding.
    ///
    /// [`UnknownServicePolicy::Reject`]: crate::settings::UnknownServicePolicy::Reject
    #[error("client {client} references unknown service {service}")]
    UnknownServiceReference { client: String, service: String },
}

pub const NO_COST_INPUTS: &str = "configure employees and expenses before calculating prices";
pub const NO_SYSTEM_WEIGHT: &str = "assign equipment or services to clients before calculating prices";
