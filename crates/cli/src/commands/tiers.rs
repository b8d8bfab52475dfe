use serde_json::json;

use proforma_core::tiers::{ENTERPRISE_MIN_VOLUME, PRICING_TIERS, ROI_TIERS};

use crate::commands::CommandResult;

/// Purely informational; reads the compiled-in tables and touches no config
/// or network.
pub fn run() -> CommandResult {
    let pricing: Vec<_> = PRICING_TIERS
        .iter()
        .map(|tier| {
            json!({
                "ceiling": tier.ceiling,
                "original_usd": tier.original_usd,
                "discounted_usd": tier.discounted_usd,
                "discount_percent": tier.discount_percent,
            })
        })
        .collect();

    let roi: Vec<_> = ROI_TIERS
        .iter()
        .map(|tier| {
            let allocation = tier.allocation();
            json!({
                "floor": tier.floor,
                "analytics_hours": allocation.analytics_hours,
                "billing_hours": allocation.billing_hours,
                "ticket_hours": allocation.ticket_hours,
            })
        })
        .collect();

    CommandResult::success_with_data(
        "tiers",
        format!(
            "{} pricing tiers, {} roi tiers; automated quoting stops at volume {}",
            PRICING_TIERS.len(),
            ROI_TIERS.len(),
            ENTERPRISE_MIN_VOLUME
        ),
        json!({
            "enterprise_min_volume": ENTERPRISE_MIN_VOLUME,
            "pricing_tiers": pricing,
            "roi_tiers": roi,
        }),
    )
}
