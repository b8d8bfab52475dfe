//! Catalog line-item definitions attached to every generated quote.
//!
//! The five included services are upserted into the external product catalog
//! by stable SKU (find-by-SKU, create-if-absent) so repeated proposal runs
//! reuse the same records instead of duplicating them.

/// A reusable priced line-item definition, keyed by a stable SKU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub sku: &'static str,
    pub name: &'static str,
}

pub const INCLUDED_SERVICES: [ServiceDefinition; 5] = [
    ServiceDefinition { sku: "SRV-ONBOARD", name: "Guided onboarding and data migration" },
    ServiceDefinition { sku: "SRV-BILLING", name: "Carrier invoice audit and billing automation" },
    ServiceDefinition { sku: "SRV-ANALYTIC", name: "Order and fulfilment analytics workspace" },
    ServiceDefinition { sku: "SRV-TICKETS", name: "Delivery ticketing and dispute resolution" },
    ServiceDefinition { sku: "SRV-REVIEW", name: "Priority support and quarterly business review" },
];

/// The primary subscription line; priced per the matched volume tier.
pub const SUBSCRIPTION_SKU: &str = "SUB-PLATFORM";
pub const SUBSCRIPTION_NAME: &str = "Platform subscription (monthly)";
