pub mod config;
pub mod domain;
pub mod errors;
pub mod roi;
pub mod tiers;
pub mod watch;

pub use domain::deal::{DealField, DealId, DealSnapshot};
pub use domain::proposal::{
    resolve_inputs, PricedProposal, ProposalInputs, ProposalOutcome, ProposalWarning,
};
pub use domain::quote::{ProductId, QuoteDraft, QuoteId, QuoteLineSpec, QuoteReference};
pub use errors::{ErrorBody, FailureCode, ProposalError, TierError};
pub use roi::{compute_roi, RoiBreakdown, RoiLine};
pub use tiers::{
    is_enterprise_volume, price_for, roi_tier_for, HoursAllocation, PricingQuote, VolumeClass,
    ENTERPRISE_MIN_VOLUME,
};
pub use watch::{WatchEvent, WatchMachine, WatchPolicy, WatchState};
