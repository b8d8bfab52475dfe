use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::deal::DealSnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record id of a catalog product in the external store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Line item to attach to a quote. `unit_price` is the price written to the
/// record store; the five included services carry zero and the subscription
/// line carries the tier's discounted price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLineSpec {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl QuoteLineSpec {
    pub fn included_service(sku: &str, name: &str) -> Self {
        Self {
            sku: sku.to_owned(),
            name: name.to_owned(),
            unit_price: Decimal::ZERO,
            quantity: 1,
        }
    }

    pub fn subscription(sku: &str, name: &str, discounted_price: Decimal) -> Self {
        Self { sku: sku.to_owned(), name: name.to_owned(), unit_price: discounted_price, quantity: 1 }
    }
}

/// Quote record to create in the external store, associated to a deal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub title: String,
    pub expires_at: DateTime<Utc>,
}

impl QuoteDraft {
    pub const VALIDITY_DAYS: i64 = 30;

    pub fn for_deal(deal: &DealSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            title: format!("Proposal for {}", deal.display_name()),
            expires_at: now + chrono::Duration::days(Self::VALIDITY_DAYS),
        }
    }
}

/// Reference to a quote that was persisted, returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteReference {
    pub id: QuoteId,
    pub title: String,
}
