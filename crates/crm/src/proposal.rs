//! Proposal orchestration over a [`CrmGateway`].
//!
//! `preview` computes pricing and ROI only; `generate` additionally upserts
//! the service catalog and creates the quote. The enterprise cutoff
//! short-circuits both before any write.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use proforma_core::domain::catalog::{INCLUDED_SERVICES, SUBSCRIPTION_NAME, SUBSCRIPTION_SKU};
use proforma_core::domain::deal::{DealId, DealSnapshot};
use proforma_core::domain::quote::{ProductId, QuoteDraft, QuoteLineSpec, QuoteReference};
use proforma_core::tiers::{price_for, roi_tier_for, PricingQuote, VolumeClass};
use proforma_core::{compute_roi, resolve_inputs, PricedProposal, ProposalError, ProposalOutcome};

use crate::gateway::{CrmGateway, GatewayError};

pub struct ProposalService<G: ?Sized> {
    gateway: Arc<G>,
}

impl<G: ?Sized> Clone for ProposalService<G> {
    fn clone(&self) -> Self {
        Self { gateway: Arc::clone(&self.gateway) }
    }
}

impl<G: CrmGateway + ?Sized> ProposalService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Compute-only run; nothing is written to the record store.
    pub async fn preview(&self, deal_id: &DealId) -> Result<ProposalOutcome, ProposalError> {
        self.run(deal_id, false).await
    }

    /// Full run: compute, upsert the service catalog, create the quote with
    /// its line items.
    pub async fn generate(&self, deal_id: &DealId) -> Result<ProposalOutcome, ProposalError> {
        self.run(deal_id, true).await
    }

    async fn run(&self, deal_id: &DealId, persist: bool) -> Result<ProposalOutcome, ProposalError> {
        info!(event_name = "proposal.run.start", deal_id = %deal_id, persist, "proposal run");

        let deal = self.gateway.fetch_deal(deal_id).await.map_err(record_store)?;
        let inputs = resolve_inputs(&deal);
        for warning in &inputs.warnings {
            warn!(
                event_name = "proposal.missing_data",
                deal_id = %deal_id,
                detail = %warning.message(),
                "deal property coerced to zero"
            );
        }

        let pricing = match price_for(inputs.volume)? {
            VolumeClass::Tiered(quote) => quote,
            VolumeClass::Enterprise => return Ok(self.enterprise(deal_id, inputs.volume)),
        };
        let allocation = match roi_tier_for(inputs.volume)? {
            VolumeClass::Tiered(allocation) => allocation,
            VolumeClass::Enterprise => return Ok(self.enterprise(deal_id, inputs.volume)),
        };
        let roi = compute_roi(&allocation, inputs.turnover);

        let quote = if persist {
            let reference = self.persist_quote(&deal, &pricing).await?;
            Some(reference)
        } else {
            None
        };

        info!(
            event_name = "proposal.run.ok",
            deal_id = %deal_id,
            volume = %inputs.volume,
            total_monthly_roi = %roi.total_monthly_roi,
            persisted = quote.is_some(),
            "proposal computed"
        );

        Ok(ProposalOutcome::Priced(PricedProposal {
            deal_id: deal.id.clone(),
            deal_name: deal.name.clone(),
            volume: inputs.volume,
            pricing,
            roi,
            quote,
            warnings: inputs.warnings,
        }))
    }

    fn enterprise(&self, deal_id: &DealId, volume: Decimal) -> ProposalOutcome {
        info!(
            event_name = "proposal.enterprise",
            deal_id = %deal_id,
            volume = %volume,
            "volume at or above the enterprise cutoff, no quote created"
        );
        ProposalOutcome::EnterpriseVolume { volume }
    }

    async fn persist_quote(
        &self,
        deal: &DealSnapshot,
        pricing: &PricingQuote,
    ) -> Result<QuoteReference, ProposalError> {
        let mut catalog: Vec<(&'static str, &'static str, ProductId)> =
            Vec::with_capacity(INCLUDED_SERVICES.len());
        for service in INCLUDED_SERVICES {
            let product_id =
                match self.gateway.find_product_by_sku(service.sku).await.map_err(record_store)? {
                    Some(existing) => existing,
                    None => {
                        let created = self
                            .gateway
                            .create_product(service.sku, service.name, Decimal::ZERO)
                            .await
                            .map_err(record_store)?;
                        info!(
                            event_name = "proposal.catalog.created",
                            deal_id = %deal.id,
                            sku = service.sku,
                            product_id = %created,
                            "catalog entry created"
                        );
                        created
                    }
                };
            catalog.push((service.sku, service.name, product_id));
        }

        let draft = QuoteDraft::for_deal(deal, Utc::now());
        let quote = self.gateway.create_quote(&deal.id, &draft).await.map_err(record_store)?;
        info!(
            event_name = "proposal.quote.created",
            deal_id = %deal.id,
            quote_id = %quote.id,
            title = %quote.title,
            "quote created"
        );

        for (sku, name, product_id) in &catalog {
            let line = QuoteLineSpec::included_service(sku, name);
            self.gateway
                .attach_line_item(&quote.id, Some(product_id), &line)
                .await
                .map_err(record_store)?;
        }
        let subscription =
            QuoteLineSpec::subscription(SUBSCRIPTION_SKU, SUBSCRIPTION_NAME, pricing.discounted_price);
        self.gateway.attach_line_item(&quote.id, None, &subscription).await.map_err(record_store)?;

        Ok(quote)
    }

    /// One manual link check; does not touch any watch budget.
    pub async fn check_link(&self, deal_id: &DealId) -> Result<Option<String>, ProposalError> {
        self.gateway.proposal_link(deal_id).await.map_err(record_store)
    }
}

fn record_store(error: GatewayError) -> ProposalError {
    ProposalError::RecordStore(error.to_string())
}
