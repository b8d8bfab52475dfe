use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::deal::{DealField, DealId, DealSnapshot};
use crate::domain::quote::QuoteReference;
use crate::roi::RoiBreakdown;
use crate::tiers::PricingQuote;

/// Non-fatal findings attached to a proposal result. Serialized with a stable
/// `code` discriminator for CLI/API consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalWarning {
    MissingData { field: DealField },
}

impl ProposalWarning {
    pub fn message(&self) -> String {
        match self {
            Self::MissingData { field } => format!(
                "{} was absent or unreadable; the proposal was computed with 0",
                field.property_name()
            ),
        }
    }
}

/// Numeric inputs after zero-coercion. Absent or unreadable properties become
/// zero and a warning, never a rejection; the computation proceeds with
/// degraded accuracy and the caller decides how loudly to surface it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalInputs {
    pub volume: Decimal,
    pub turnover: Decimal,
    pub warnings: Vec<ProposalWarning>,
}

pub fn resolve_inputs(deal: &DealSnapshot) -> ProposalInputs {
    let mut warnings = Vec::new();

    let volume = match parse_non_negative(deal.monthly_order_volume.as_deref()) {
        Some(value) => value,
        None => {
            warnings.push(ProposalWarning::MissingData { field: DealField::MonthlyOrderVolume });
            Decimal::ZERO
        }
    };
    let turnover = match parse_non_negative(deal.yearly_turnover.as_deref()) {
        Some(value) => value,
        None => {
            warnings.push(ProposalWarning::MissingData { field: DealField::YearlyTurnover });
            Decimal::ZERO
        }
    };

    ProposalInputs { volume, turnover, warnings }
}

/// Negative readings count as unreadable; the engines only ever see
/// non-negative volumes.
fn parse_non_negative(raw: Option<&str>) -> Option<Decimal> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    let value = Decimal::from_str(text).ok()?;
    if value < Decimal::ZERO {
        return None;
    }
    Some(value)
}

/// Everything a priced proposal carries back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedProposal {
    pub deal_id: DealId,
    pub deal_name: Option<String>,
    pub volume: Decimal,
    pub pricing: PricingQuote,
    pub roi: RoiBreakdown,
    pub quote: Option<QuoteReference>,
    pub warnings: Vec<ProposalWarning>,
}

/// Result of a proposal run. The enterprise branch is a business guardrail,
/// not a failure: it carries the raw volume for operator follow-up and no
/// quote or catalog write happens on that path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProposalOutcome {
    Priced(PricedProposal),
    EnterpriseVolume { volume: Decimal },
}

impl ProposalOutcome {
    pub fn is_enterprise(&self) -> bool {
        matches!(self, Self::EnterpriseVolume { .. })
    }
}
