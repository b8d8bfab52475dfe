//! In-memory [`CrmGateway`] used by tests and local development. Records every
//! write so callers can assert on catalog, quote, and line-item state, and
//! supports scripted link reads plus failure injection.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use proforma_core::domain::deal::{DealId, DealSnapshot};
use proforma_core::domain::quote::{ProductId, QuoteDraft, QuoteId, QuoteLineSpec, QuoteReference};

use crate::gateway::{CrmGateway, GatewayError};

#[derive(Clone, Debug, PartialEq)]
pub struct StoredProduct {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredQuote {
    pub id: QuoteId,
    pub deal_id: DealId,
    pub title: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredLine {
    pub quote_id: QuoteId,
    pub product_id: Option<ProductId>,
    pub line: QuoteLineSpec,
}

#[derive(Default)]
struct Store {
    deals: HashMap<String, DealSnapshot>,
    products: Vec<StoredProduct>,
    quotes: Vec<StoredQuote>,
    lines: Vec<StoredLine>,
    link_scripts: HashMap<String, VecDeque<Option<String>>>,
    link_reads: HashMap<String, u32>,
    fail_fetch: Option<String>,
    fail_quote_create: Option<String>,
    fail_link_reads: u32,
    next_id: u64,
}

impl Store {
    fn mint_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Default)]
pub struct InMemoryCrm {
    store: RwLock<Store>,
}

impl InMemoryCrm {
    pub async fn insert_deal(&self, deal: DealSnapshot) {
        let mut store = self.store.write().await;
        store.deals.insert(deal.id.0.clone(), deal);
    }

    /// Sets the proposal link on a stored deal, as the external renderer would.
    pub async fn set_link(&self, deal_id: &DealId, link: &str) {
        let mut store = self.store.write().await;
        if let Some(deal) = store.deals.get_mut(deal_id.as_str()) {
            deal.proposal_link = Some(link.to_owned());
        }
    }

    /// Queues link-read results for a deal. Each `proposal_link` call consumes
    /// one entry; once the script is drained, reads fall back to the stored
    /// deal record.
    pub async fn script_links(&self, deal_id: &DealId, script: Vec<Option<&str>>) {
        let mut store = self.store.write().await;
        let entries = script.into_iter().map(|link| link.map(str::to_owned)).collect();
        store.link_scripts.insert(deal_id.0.clone(), entries);
    }

    pub async fn link_reads(&self, deal_id: &DealId) -> u32 {
        let store = self.store.read().await;
        store.link_reads.get(deal_id.as_str()).copied().unwrap_or(0)
    }

    pub async fn fail_fetches(&self, message: &str) {
        let mut store = self.store.write().await;
        store.fail_fetch = Some(message.to_owned());
    }

    pub async fn fail_quote_creates(&self, message: &str) {
        let mut store = self.store.write().await;
        store.fail_quote_create = Some(message.to_owned());
    }

    /// Fails the next `count` link reads with a transport error. The calls
    /// still count as issued reads.
    pub async fn fail_link_reads(&self, count: u32) {
        let mut store = self.store.write().await;
        store.fail_link_reads = count;
    }

    pub async fn clear_failures(&self) {
        let mut store = self.store.write().await;
        store.fail_fetch = None;
        store.fail_quote_create = None;
        store.fail_link_reads = 0;
    }

    pub async fn products(&self) -> Vec<StoredProduct> {
        self.store.read().await.products.clone()
    }

    pub async fn quotes(&self) -> Vec<StoredQuote> {
        self.store.read().await.quotes.clone()
    }

    pub async fn lines(&self) -> Vec<StoredLine> {
        self.store.read().await.lines.clone()
    }
}

#[async_trait::async_trait]
impl CrmGateway for InMemoryCrm {
    async fn fetch_deal(&self, deal_id: &DealId) -> Result<DealSnapshot, GatewayError> {
        let store = self.store.read().await;
        if let Some(message) = &store.fail_fetch {
            return Err(GatewayError::transport("deal fetch", message.clone()));
        }
        store
            .deals
            .get(deal_id.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::DealNotFound(deal_id.clone()))
    }

    async fn proposal_link(&self, deal_id: &DealId) -> Result<Option<String>, GatewayError> {
        let mut store = self.store.write().await;
        if !store.deals.contains_key(deal_id.as_str()) {
            return Err(GatewayError::DealNotFound(deal_id.clone()));
        }
        *store.link_reads.entry(deal_id.0.clone()).or_insert(0) += 1;

        if store.fail_link_reads > 0 {
            store.fail_link_reads -= 1;
            return Err(GatewayError::transport("link read", "injected read failure"));
        }

        let scripted = store
            .link_scripts
            .get_mut(deal_id.as_str())
            .and_then(|script| script.pop_front());
        let raw = match scripted {
            Some(entry) => {
                // A scripted link also lands on the deal record, mirroring the
                // renderer writing the property before the next read.
                if let (Some(link), Some(deal)) = (&entry, store.deals.get_mut(deal_id.as_str())) {
                    deal.proposal_link = Some(link.clone());
                }
                entry
            }
            None => store
                .deals
                .get(deal_id.as_str())
                .and_then(|deal| deal.proposal_link.clone()),
        };

        Ok(raw.map(|link| link.trim().to_owned()).filter(|link| !link.is_empty()))
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductId>, GatewayError> {
        let store = self.store.read().await;
        Ok(store
            .products
            .iter()
            .find(|product| product.sku == sku)
            .map(|product| product.id.clone()))
    }

    async fn create_product(
        &self,
        sku: &str,
        name: &str,
        unit_price: Decimal,
    ) -> Result<ProductId, GatewayError> {
        let mut store = self.store.write().await;
        let id = ProductId(store.mint_id("PROD"));
        store.products.push(StoredProduct {
            id: id.clone(),
            sku: sku.to_owned(),
            name: name.to_owned(),
            unit_price,
        });
        Ok(id)
    }

    async fn create_quote(
        &self,
        deal_id: &DealId,
        draft: &QuoteDraft,
    ) -> Result<QuoteReference, GatewayError> {
        let mut store = self.store.write().await;
        if let Some(message) = &store.fail_quote_create {
            return Err(GatewayError::transport("quote create", message.clone()));
        }
        let id = QuoteId(store.mint_id("QUOTE"));
        store.quotes.push(StoredQuote {
            id: id.clone(),
            deal_id: deal_id.clone(),
            title: draft.title.clone(),
            expires_at: draft.expires_at,
        });
        Ok(QuoteReference { id, title: draft.title.clone() })
    }

    async fn attach_line_item(
        &self,
        quote_id: &QuoteId,
        product_id: Option<&ProductId>,
        line: &QuoteLineSpec,
    ) -> Result<(), GatewayError> {
        let mut store = self.store.write().await;
        store.lines.push(StoredLine {
            quote_id: quote_id.clone(),
            product_id: product_id.cloned(),
            line: line.clone(),
        });
        Ok(())
    }
}
