//! Monthly ROI model: dollar values for the hours an allocation saves plus
//! prevented revenue leakage derived from annual turnover.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tiers::HoursAllocation;

/// Blended hourly rate for billing-operations work, in USD.
pub const BILLING_RATE_USD: u32 = 30;
/// Blended hourly rate for analytics work, in USD.
pub const ANALYTICS_RATE_USD: u32 = 25;
/// Blended hourly rate for ticket handling, in USD.
pub const TICKET_RATE_USD: u32 = 25;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiLine {
    pub hours: Decimal,
    pub value: Decimal,
}

/// Derived ROI figures for one proposal. Immutable once computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiBreakdown {
    pub billing: RoiLine,
    pub analytics: RoiLine,
    pub tickets: RoiLine,
    pub leakage_value: Decimal,
    pub total_monthly_roi: Decimal,
}

/// Pure computation; exact decimal arithmetic throughout. A zero turnover
/// (the coerced default when the field is absent) yields a zero leakage line.
pub fn compute_roi(allocation: &HoursAllocation, yearly_turnover: Decimal) -> RoiBreakdown {
    let billing_value = allocation.billing_hours * Decimal::from(BILLING_RATE_USD);
    let analytics_value = allocation.analytics_hours * Decimal::from(ANALYTICS_RATE_USD);
    let ticket_value = allocation.ticket_hours * Decimal::from(TICKET_RATE_USD);
    // 3% of annual turnover, spread over twelve months.
    let leakage_value = yearly_turnover * Decimal::new(3, 2) / Decimal::from(12);

    let total_monthly_roi = billing_value + analytics_value + ticket_value + leakage_value;

    RoiBreakdown {
        billing: RoiLine { hours: allocation.billing_hours, value: billing_value },
        analytics: RoiLine { hours: allocation.analytics_hours, value: analytics_value },
        tickets: RoiLine { hours: allocation.ticket_hours, value: ticket_value },
        leakage_value,
        total_monthly_roi,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::tiers::HoursAllocation;

    use super::compute_roi;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn allocation(analytics: Decimal, billing: Decimal, tickets: Decimal) -> HoursAllocation {
        HoursAllocation { analytics_hours: analytics, billing_hours: billing, ticket_hours: tickets }
    }

    #[test]
    fn mid_tier_breakdown_matches_expected_dollars() {
        // analytics 10h, billing 35h, tickets 3.5h at 500k turnover.
        let roi = compute_roi(&allocation(dec(10), dec(35), Decimal::new(35, 1)), dec(500_000));

        assert_eq!(roi.billing.value, dec(1_050));
        assert_eq!(roi.analytics.value, dec(250));
        assert_eq!(roi.tickets.value, Decimal::new(8_750, 2));
        assert_eq!(roi.leakage_value, dec(1_250));
        assert_eq!(roi.total_monthly_roi, Decimal::new(263_750, 2));
    }

    #[test]
    fn high_tier_breakdown_matches_expected_dollars() {
        // analytics 25h, billing 105h, tickets 35h at 2M turnover.
        let roi = compute_roi(&allocation(dec(25), dec(105), dec(35)), dec(2_000_000));

        assert_eq!(roi.billing.value, dec(3_150));
        assert_eq!(roi.analytics.value, dec(625));
        assert_eq!(roi.tickets.value, dec(875));
        assert_eq!(roi.leakage_value, dec(5_000));
        assert_eq!(roi.total_monthly_roi, dec(9_650));
    }

    #[test]
    fn absent_turnover_zeroes_the_leakage_line_only() {
        let roi = compute_roi(&allocation(dec(10), dec(35), Decimal::new(35, 1)), Decimal::ZERO);

        assert_eq!(roi.leakage_value, Decimal::ZERO);
        assert_eq!(roi.billing.value, dec(1_050));
        assert_eq!(roi.total_monthly_roi, roi.billing.value + roi.analytics.value + roi.tickets.value);
    }

    #[test]
    fn computation_is_pure_and_idempotent() {
        let hours = allocation(Decimal::new(175, 1), dec(70), Decimal::new(175, 1));
        let first = compute_roi(&hours, dec(750_000));
        let second = compute_roi(&hours, dec(750_000));
        assert_eq!(first, second);
    }

    #[test]
    fn total_is_the_sum_of_all_four_lines() {
        let cases = [
            (allocation(dec(5), Decimal::new(175, 1), Decimal::new(175, 2)), dec(0)),
            (allocation(Decimal::new(75, 1), dec(26), Decimal::new(26, 1)), dec(123_456)),
            (allocation(dec(40), dec(175), dec(70)), dec(9_999_999)),
        ];

        for (hours, turnover) in cases {
            let roi = compute_roi(&hours, turnover);
            assert_eq!(
                roi.total_monthly_roi,
                roi.billing.value + roi.analytics.value + roi.tickets.value + roi.leakage_value
            );
        }
    }

    #[test]
    fn leakage_is_three_percent_of_turnover_over_twelve_months() {
        let roi = compute_roi(&allocation(dec(5), Decimal::new(175, 1), Decimal::new(175, 2)), dec(1));
        // 1 * 0.03 / 12
        assert_eq!(roi.leakage_value, Decimal::new(25, 4));
    }
}
