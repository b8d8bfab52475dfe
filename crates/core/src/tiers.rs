//! Volume tier tables and the two classification engines.
//!
//! Both engines classify the same monthly order volume but with different
//! boundary semantics: pricing matches the first tier whose ceiling is at or
//! above the volume, ROI matches the tier with the greatest floor at or below
//! it. The asymmetry is carried by the existing tier data; the two matchers
//! stay separate, explicitly named functions so a change to one can never
//! silently move classifications in the other.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::TierError;

/// Monthly order volume at or above which automated quoting is disabled and
/// the deal routes to manual handling.
pub const ENTERPRISE_MIN_VOLUME: u32 = 700_000;

/// One row of the pricing table. Prices are whole-dollar list values; the
/// fields stay integers so the table can live in a `const` (`Decimal` has no
/// const constructor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingTier {
    pub ceiling: u32,
    pub original_usd: u32,
    pub discounted_usd: u32,
    pub discount_percent: u8,
}

impl PricingTier {
    pub fn original_price(&self) -> Decimal {
        Decimal::from(self.original_usd)
    }

    pub fn discounted_price(&self) -> Decimal {
        Decimal::from(self.discounted_usd)
    }

    pub fn quote(&self) -> PricingQuote {
        PricingQuote {
            original_price: self.original_price(),
            discounted_price: self.discounted_price(),
            discount_percent: self.discount_percent,
        }
    }
}

/// Ascending by ceiling, non-overlapping, covering `[0, 699_999]`. Volumes in
/// the open gap up to [`ENTERPRISE_MIN_VOLUME`] fall back to the last row.
pub const PRICING_TIERS: [PricingTier; 9] = [
    PricingTier { ceiling: 1_000, original_usd: 1_500, discounted_usd: 750, discount_percent: 50 },
    PricingTier { ceiling: 5_000, original_usd: 2_000, discounted_usd: 1_000, discount_percent: 50 },
    PricingTier { ceiling: 10_000, original_usd: 2_500, discounted_usd: 1_375, discount_percent: 45 },
    PricingTier { ceiling: 25_000, original_usd: 3_000, discounted_usd: 1_800, discount_percent: 40 },
    PricingTier { ceiling: 50_000, original_usd: 3_500, discounted_usd: 2_205, discount_percent: 37 },
    PricingTier { ceiling: 100_000, original_usd: 4_500, discounted_usd: 3_000, discount_percent: 33 },
    PricingTier { ceiling: 250_000, original_usd: 5_500, discounted_usd: 3_850, discount_percent: 30 },
    PricingTier { ceiling: 500_000, original_usd: 7_000, discounted_usd: 5_250, discount_percent: 25 },
    PricingTier { ceiling: 699_999, original_usd: 9_000, discounted_usd: 7_200, discount_percent: 20 },
];

/// One row of the ROI table. Hours-saved allocations are stored in minutes so
/// the table stays `const`; every value converts exactly back to hours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiTier {
    pub floor: u32,
    pub analytics_minutes: u32,
    pub billing_minutes: u32,
    pub ticket_minutes: u32,
}

impl RoiTier {
    pub fn allocation(&self) -> HoursAllocation {
        HoursAllocation {
            analytics_hours: minutes_to_hours(self.analytics_minutes),
            billing_hours: minutes_to_hours(self.billing_minutes),
            ticket_hours: minutes_to_hours(self.ticket_minutes),
        }
    }
}

/// Ascending by floor. The adjacent `9_999` / `10_000` rows carry identical
/// allocations on purpose; the table is business data, not something to
/// deduplicate.
pub const ROI_TIERS: [RoiTier; 10] = [
    RoiTier { floor: 0, analytics_minutes: 300, billing_minutes: 1_050, ticket_minutes: 105 },
    RoiTier { floor: 1_000, analytics_minutes: 450, billing_minutes: 1_560, ticket_minutes: 156 },
    RoiTier { floor: 2_500, analytics_minutes: 600, billing_minutes: 2_100, ticket_minutes: 210 },
    RoiTier { floor: 9_999, analytics_minutes: 900, billing_minutes: 3_150, ticket_minutes: 525 },
    RoiTier { floor: 10_000, analytics_minutes: 900, billing_minutes: 3_150, ticket_minutes: 525 },
    RoiTier { floor: 25_000, analytics_minutes: 1_050, billing_minutes: 4_200, ticket_minutes: 1_050 },
    RoiTier { floor: 50_000, analytics_minutes: 1_200, billing_minutes: 5_250, ticket_minutes: 1_575 },
    RoiTier { floor: 100_000, analytics_minutes: 1_500, billing_minutes: 6_300, ticket_minutes: 2_100 },
    RoiTier { floor: 250_000, analytics_minutes: 1_800, billing_minutes: 8_400, ticket_minutes: 3_150 },
    RoiTier { floor: 500_000, analytics_minutes: 2_400, billing_minutes: 10_500, ticket_minutes: 4_200 },
];

fn minutes_to_hours(minutes: u32) -> Decimal {
    Decimal::from(minutes) / Decimal::from(60)
}

/// Monthly subscription pricing for a matched tier. Derived, identity-free,
/// recomputed on every request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingQuote {
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub discount_percent: u8,
}

/// Hours-saved-per-month triple from a matched ROI tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursAllocation {
    pub analytics_hours: Decimal,
    pub billing_hours: Decimal,
    pub ticket_hours: Decimal,
}

/// Outcome of classifying a volume against one of the tier tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeClass<T> {
    Tiered(T),
    /// At or above [`ENTERPRISE_MIN_VOLUME`]; no automated quoting.
    Enterprise,
}

impl<T> VolumeClass<T> {
    pub fn is_enterprise(&self) -> bool {
        matches!(self, Self::Enterprise)
    }
}

pub fn is_enterprise_volume(volume: Decimal) -> bool {
    volume >= Decimal::from(ENTERPRISE_MIN_VOLUME)
}

/// Pricing match: scan ascending, first tier whose ceiling is at or above the
/// volume wins.
pub fn price_for(volume: Decimal) -> Result<VolumeClass<PricingQuote>, TierError> {
    if is_enterprise_volume(volume) {
        return Ok(VolumeClass::Enterprise);
    }

    for tier in &PRICING_TIERS {
        if Decimal::from(tier.ceiling) >= volume {
            return Ok(VolumeClass::Tiered(tier.quote()));
        }
    }

    // Volumes strictly between the last ceiling and the enterprise cutoff
    // match no row; the highest tier prices them instead of failing the quote.
    PRICING_TIERS
        .last()
        .map(|tier| VolumeClass::Tiered(tier.quote()))
        .ok_or(TierError::PricingTierNotFound { volume })
}

/// ROI match: walk the ascending table and keep overwriting the match until a
/// floor exceeds the volume; the greatest floor at or below the volume wins.
pub fn roi_tier_for(volume: Decimal) -> Result<VolumeClass<HoursAllocation>, TierError> {
    if is_enterprise_volume(volume) {
        return Ok(VolumeClass::Enterprise);
    }

    let mut matched: Option<&RoiTier> = None;
    for tier in &ROI_TIERS {
        if Decimal::from(tier.floor) <= volume {
            matched = Some(tier);
        } else {
            break;
        }
    }

    matched
        .map(|tier| VolumeClass::Tiered(tier.allocation()))
        .ok_or(TierError::RoiTierNotFound { volume })
}
