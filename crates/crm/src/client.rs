//! HTTP implementation of [`CrmGateway`] against a HubSpot-style REST API.
//!
//! Object properties travel as strings on the wire, so numeric deal fields are
//! handed to the core resolver unparsed. All requests carry the configured
//! private-app token as a bearer credential and a per-request timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use proforma_core::config::CrmConfig;
use proforma_core::domain::deal::{DealField, DealId, DealSnapshot};
use proforma_core::domain::quote::{ProductId, QuoteDraft, QuoteId, QuoteLineSpec, QuoteReference};

use crate::gateway::{CrmGateway, GatewayError};

const DEAL_NAME_PROPERTY: &str = "dealname";
const PROPOSAL_LINK_PROPERTY: &str = "proposal_pdf_link";
const DEAL_PROPERTIES: &str = "dealname,monthly_order_volume,yearly_turnover,proposal_pdf_link";
const QUOTE_TO_DEAL_ASSOCIATION: u32 = 64;
const LINE_ITEM_TO_QUOTE_ASSOCIATION: u32 = 68;
const ERROR_BODY_PREVIEW_LIMIT: usize = 300;

pub struct HttpCrmGateway {
    client: Client,
    base_url: String,
    access_token: SecretString,
    request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CrmObject {
    id: String,
    #[serde(default)]
    properties: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<CrmObject>,
}

impl HttpCrmGateway {
    pub fn new(config: &CrmConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            request_timeout: config.request_timeout(),
        }
    }

    fn object_url(&self, object: &str) -> String {
        format!("{}/crm/v3/objects/{object}", self.base_url)
    }

    async fn post_object(
        &self,
        object: &str,
        body: Value,
        context: &str,
    ) -> Result<CrmObject, GatewayError> {
        let response = self
            .client
            .post(self.object_url(object))
            .bearer_auth(self.access_token.expose_secret())
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::transport(context, err.to_string()))?;
        let response = expect_success(response, context).await?;
        response
            .json::<CrmObject>()
            .await
            .map_err(|err| GatewayError::decode(context, err.to_string()))
    }

    async fn get_deal(&self, deal_id: &DealId) -> Result<CrmObject, GatewayError> {
        let context = "deal fetch";
        let url = format!("{}/{deal_id}", self.object_url("deals"));
        let response = self
            .client
            .get(url)
            .query(&[("properties", DEAL_PROPERTIES), ("archived", "false")])
            .bearer_auth(self.access_token.expose_secret())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|err| GatewayError::transport(context, err.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::DealNotFound(deal_id.clone()));
        }
        let response = expect_success(response, context).await?;
        response
            .json::<CrmObject>()
            .await
            .map_err(|err| GatewayError::decode(context, err.to_string()))
    }
}

#[async_trait]
impl CrmGateway for HttpCrmGateway {
    async fn fetch_deal(&self, deal_id: &DealId) -> Result<DealSnapshot, GatewayError> {
        let object = self.get_deal(deal_id).await?;
        Ok(snapshot_from_properties(deal_id, &object.properties))
    }

    async fn proposal_link(&self, deal_id: &DealId) -> Result<Option<String>, GatewayError> {
        let object = self.get_deal(deal_id).await?;
        Ok(property(&object.properties, PROPOSAL_LINK_PROPERTY))
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductId>, GatewayError> {
        let context = "product lookup";
        let body = json!({
            "filterGroups": [{
                "filters": [{ "propertyName": "hs_sku", "operator": "EQ", "value": sku }]
            }],
            "properties": ["hs_sku", "name"],
            "limit": 1,
        });
        let response = self
            .client
            .post(format!("{}/search", self.object_url("products")))
            .bearer_auth(self.access_token.expose_secret())
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::transport(context, err.to_string()))?;
        let response = expect_success(response, context).await?;
        let results = response
            .json::<SearchResults>()
            .await
            .map_err(|err| GatewayError::decode(context, err.to_string()))?;
        Ok(results.results.into_iter().next().map(|object| ProductId(object.id)))
    }

    async fn create_product(
        &self,
        sku: &str,
        name: &str,
        unit_price: Decimal,
    ) -> Result<ProductId, GatewayError> {
        let body = json!({
            "properties": {
                "name": name,
                "hs_sku": sku,
                "price": unit_price.to_string(),
            }
        });
        let object = self.post_object("products", body, "product create").await?;
        Ok(ProductId(object.id))
    }

    async fn create_quote(
        &self,
        deal_id: &DealId,
        draft: &QuoteDraft,
    ) -> Result<QuoteReference, GatewayError> {
        let body = json!({
            "properties": {
                "hs_title": draft.title,
                "hs_expiration_date": draft.expires_at.date_naive().to_string(),
            },
            "associations": [association(deal_id.as_str(), QUOTE_TO_DEAL_ASSOCIATION)],
        });
        let object = self.post_object("quotes", body, "quote create").await?;
        Ok(QuoteReference { id: QuoteId(object.id), title: draft.title.clone() })
    }

    async fn attach_line_item(
        &self,
        quote_id: &QuoteId,
        product_id: Option<&ProductId>,
        line: &QuoteLineSpec,
    ) -> Result<(), GatewayError> {
        let mut properties = json!({
            "name": line.name,
            "hs_sku": line.sku,
            "price": line.unit_price.to_string(),
            "quantity": line.quantity.to_string(),
        });
        if let Some(product_id) = product_id {
            properties["hs_product_id"] = json!(product_id.0);
        }
        let body = json!({
            "properties": properties,
            "associations": [association(&quote_id.0, LINE_ITEM_TO_QUOTE_ASSOCIATION)],
        });
        self.post_object("line_items", body, "line item create").await?;
        Ok(())
    }
}

fn association(target_id: &str, type_id: u32) -> Value {
    json!({
        "to": { "id": target_id },
        "types": [{ "associationCategory": "HUBSPOT_DEFINED", "associationTypeId": type_id }],
    })
}

fn snapshot_from_properties(
    deal_id: &DealId,
    properties: &HashMap<String, Option<String>>,
) -> DealSnapshot {
    DealSnapshot {
        id: deal_id.clone(),
        name: property(properties, DEAL_NAME_PROPERTY),
        monthly_order_volume: property(properties, DealField::MonthlyOrderVolume.property_name()),
        yearly_turnover: property(properties, DealField::YearlyTurnover.property_name()),
        proposal_link: property(properties, PROPOSAL_LINK_PROPERTY),
    }
}

fn property(properties: &HashMap<String, Option<String>>, name: &str) -> Option<String> {
    properties
        .get(name)
        .and_then(|value| value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

async fn expect_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::UnexpectedStatus {
        context: context.to_owned(),
        status: status.as_u16(),
        body: preview(&body),
    })
}

/// Bounded slice of an error response body, safe to put in error messages.
pub(crate) fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut cut = ERROR_BODY_PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &trimmed[..cut])
}
