use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use proforma_core::domain::deal::{DealId, DealSnapshot};
use proforma_core::domain::quote::{ProductId, QuoteDraft, QuoteId, QuoteLineSpec, QuoteReference};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("deal `{0}` was not found in the CRM")]
    DealNotFound(DealId),
    #[error("crm request failed during {context}: {message}")]
    Transport { context: String, message: String },
    #[error("crm returned status {status} during {context}: {body}")]
    UnexpectedStatus {
        context: String,
        status: u16,
        body: String,
    },
    #[error("crm response could not be decoded during {context}: {message}")]
    Decode { context: String, message: String },
}

impl GatewayError {
    pub fn transport(context: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            context: context.to_owned(),
            message: message.into(),
        }
    }

    pub fn decode(context: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            context: context.to_owned(),
            message: message.into(),
        }
    }
}

/// Record-store operations the proposal flow needs. One implementation talks
/// HTTP to the real CRM, the in-memory one backs tests.
#[async_trait]
pub trait CrmGateway: Send + Sync {
    async fn fetch_deal(&self, deal_id: &DealId) -> Result<DealSnapshot, GatewayError>;

    /// Re-reads only the proposal link property. Empty and whitespace-only
    /// values come back as `None`.
    async fn proposal_link(&self, deal_id: &DealId) -> Result<Option<String>, GatewayError>;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductId>, GatewayError>;

    async fn create_product(
        &self,
        sku: &str,
        name: &str,
        unit_price: Decimal,
    ) -> Result<ProductId, GatewayError>;

    async fn create_quote(
        &self,
        deal_id: &DealId,
        draft: &QuoteDraft,
    ) -> Result<QuoteReference, GatewayError>;

    /// Attaches one line item to an existing quote. Catalog-backed lines carry
    /// the product they were minted from; the subscription line does not.
    async fn attach_line_item(
        &self,
        quote_id: &QuoteId,
        product_id: Option<&ProductId>,
        line: &QuoteLineSpec,
    ) -> Result<(), GatewayError>;
}
