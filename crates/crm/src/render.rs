//! Fire-and-forget trigger for the external document renderer.
//!
//! One POST of a flat JSON payload to the configured webhook. Any 2xx means
//! the job was accepted; everything else is a rejection and the caller must
//! not start watching for a link.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use proforma_core::config::RenderConfig;
use proforma_core::PricedProposal;

use crate::client::preview;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render webhook request failed: {0}")]
    Transport(String),
    #[error("render webhook rejected the trigger with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Everything the renderer needs, flattened to primitive fields. Decimals
/// serialize as exact strings, matching how the record store itself carries
/// numerics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderPayload {
    pub deal_id: String,
    pub deal_name: String,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub discount_percent: u8,
    pub billing_hours: Decimal,
    pub billing_value: Decimal,
    pub analytics_hours: Decimal,
    pub analytics_value: Decimal,
    pub ticket_hours: Decimal,
    pub ticket_value: Decimal,
    pub leakage_value: Decimal,
    pub total_monthly_roi: Decimal,
}

impl RenderPayload {
    pub fn from_proposal(proposal: &PricedProposal) -> Self {
        let roi = &proposal.roi;
        Self {
            deal_id: proposal.deal_id.to_string(),
            deal_name: proposal
                .deal_name
                .clone()
                .unwrap_or_else(|| proposal.deal_id.to_string()),
            original_price: proposal.pricing.original_price,
            discounted_price: proposal.pricing.discounted_price,
            discount_percent: proposal.pricing.discount_percent,
            billing_hours: roi.billing.hours,
            billing_value: roi.billing.value,
            analytics_hours: roi.analytics.hours,
            analytics_value: roi.analytics.value,
            ticket_hours: roi.tickets.hours,
            ticket_value: roi.tickets.value,
            leakage_value: roi.leakage_value,
            total_monthly_roi: roi.total_monthly_roi,
        }
    }
}

pub struct RenderClient {
    client: Client,
    webhook_url: String,
    request_timeout: Duration,
}

impl RenderClient {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            client: Client::new(),
            webhook_url: config.webhook_url.clone(),
            request_timeout: config.request_timeout(),
        }
    }

    pub async fn trigger(&self, payload: &RenderPayload) -> Result<(), RenderError> {
        info!(
            event_name = "render.trigger.start",
            deal_id = %payload.deal_id,
            "posting render payload"
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .timeout(self.request_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|err| RenderError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(
                event_name = "render.trigger.accepted",
                deal_id = %payload.deal_id,
                status = status.as_u16(),
                "render job accepted"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            event_name = "render.trigger.rejected",
            deal_id = %payload.deal_id,
            status = status.as_u16(),
            "render job rejected"
        );
        Err(RenderError::Rejected { status: status.as_u16(), body: preview(&body) })
    }
}
