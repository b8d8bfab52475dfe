use std::sync::Arc;

use rust_decimal::Decimal;

use proforma_core::domain::catalog::{INCLUDED_SERVICES, SUBSCRIPTION_SKU};
use proforma_core::domain::deal::{DealId, DealSnapshot};
use proforma_core::errors::FailureCode;
use proforma_core::{PricedProposal, ProposalError, ProposalOutcome};
use proforma_crm::{InMemoryCrm, ProposalService};

fn deal(id: &str, name: &str, volume: &str, turnover: &str) -> DealSnapshot {
    DealSnapshot {
        id: DealId::new(id),
        name: Some(name.to_owned()),
        monthly_order_volume: Some(volume.to_owned()),
        yearly_turnover: Some(turnover.to_owned()),
        proposal_link: None,
    }
}

fn service(crm: &Arc<InMemoryCrm>) -> ProposalService<InMemoryCrm> {
    ProposalService::new(Arc::clone(crm))
}

fn priced(outcome: ProposalOutcome) -> PricedProposal {
    match outcome {
        ProposalOutcome::Priced(proposal) => proposal,
        ProposalOutcome::EnterpriseVolume { volume } => {
            panic!("expected a priced proposal, got enterprise outcome for volume {volume}")
        }
    }
}

#[tokio::test]
async fn generate_persists_catalog_quote_and_lines() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Acme Logistics", "5000", "500000")).await;

    let outcome = service(&crm).generate(&DealId::new("901")).await.expect("generate");
    let proposal = priced(outcome);

    assert_eq!(proposal.pricing.original_price, Decimal::from(2_000));
    assert_eq!(proposal.pricing.discounted_price, Decimal::from(1_000));
    assert_eq!(proposal.pricing.discount_percent, 50);
    assert_eq!(proposal.roi.total_monthly_roi, Decimal::new(263_750, 2));
    assert!(proposal.warnings.is_empty());

    let quote = proposal.quote.expect("generate must persist a quote");
    assert_eq!(quote.title, "Proposal for Acme Logistics");

    let products = crm.products().await;
    assert_eq!(products.len(), 5);
    for definition in INCLUDED_SERVICES {
        let stored = products
            .iter()
            .find(|product| product.sku == definition.sku)
            .unwrap_or_else(|| panic!("catalog entry {} should exist", definition.sku));
        assert_eq!(stored.name, definition.name);
        assert_eq!(stored.unit_price, Decimal::ZERO);
    }

    let quotes = crm.quotes().await;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].id, quote.id);
    assert_eq!(quotes[0].deal_id, DealId::new("901"));

    let lines = crm.lines().await;
    assert_eq!(lines.len(), 6);
    for line in &lines[..5] {
        assert_eq!(line.quote_id, quote.id);
        assert!(line.product_id.is_some(), "service lines are catalog-backed");
        assert_eq!(line.line.unit_price, Decimal::ZERO);
    }
    let subscription = &lines[5];
    assert_eq!(subscription.line.sku, SUBSCRIPTION_SKU);
    assert!(subscription.product_id.is_none());
    assert_eq!(subscription.line.unit_price, Decimal::from(1_000));
}

#[tokio::test]
async fn repeated_generate_reuses_catalog_entries() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Acme Logistics", "5000", "500000")).await;
    let service = service(&crm);

    service.generate(&DealId::new("901")).await.expect("first generate");
    service.generate(&DealId::new("901")).await.expect("second generate");

    assert_eq!(crm.products().await.len(), 5, "catalog upsert must not duplicate entries");
    assert_eq!(crm.quotes().await.len(), 2, "each generate creates its own quote");
    assert_eq!(crm.lines().await.len(), 12);
}

#[tokio::test]
async fn preview_writes_nothing() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Acme Logistics", "100000", "2000000")).await;

    let outcome = service(&crm).preview(&DealId::new("901")).await.expect("preview");
    let proposal = priced(outcome);

    assert_eq!(proposal.pricing.original_price, Decimal::from(4_500));
    assert_eq!(proposal.pricing.discounted_price, Decimal::from(3_000));
    assert_eq!(proposal.pricing.discount_percent, 33);
    assert_eq!(proposal.roi.total_monthly_roi, Decimal::from(9_650));
    assert!(proposal.quote.is_none());

    assert!(crm.products().await.is_empty());
    assert!(crm.quotes().await.is_empty());
    assert!(crm.lines().await.is_empty());
}

#[tokio::test]
async fn enterprise_volume_short_circuits_with_zero_writes() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Globex Freight", "750000", "9000000")).await;

    let outcome = service(&crm).generate(&DealId::new("901")).await.expect("generate");

    assert_eq!(outcome, ProposalOutcome::EnterpriseVolume { volume: Decimal::from(750_000) });
    assert!(crm.products().await.is_empty(), "enterprise path must not touch the catalog");
    assert!(crm.quotes().await.is_empty());
    assert!(crm.lines().await.is_empty());
}

#[tokio::test]
async fn missing_properties_coerce_to_zero_with_warnings() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(DealSnapshot { id: DealId::new("902"), ..DealSnapshot::default() }).await;

    let proposal =
        priced(service(&crm).preview(&DealId::new("902")).await.expect("preview"));

    assert_eq!(proposal.volume, Decimal::ZERO);
    assert_eq!(proposal.warnings.len(), 2);
    // Zero volume lands in the lowest tier of both tables; leakage is zero.
    assert_eq!(proposal.pricing.discounted_price, Decimal::from(750));
    assert_eq!(proposal.roi.leakage_value, Decimal::ZERO);
    assert_eq!(proposal.roi.total_monthly_roi, Decimal::new(69_375, 2));
}

#[tokio::test]
async fn quote_create_failure_leaves_catalog_for_reuse() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Acme Logistics", "5000", "500000")).await;
    let service = service(&crm);

    crm.fail_quote_creates("record store 503").await;
    let error = service.generate(&DealId::new("901")).await.expect_err("generate must fail");
    assert!(matches!(error, ProposalError::RecordStore(_)));
    assert_eq!(crm.products().await.len(), 5, "upserted catalog entries stay behind");
    assert!(crm.quotes().await.is_empty());

    crm.clear_failures().await;
    service.generate(&DealId::new("901")).await.expect("retry succeeds");
    assert_eq!(crm.products().await.len(), 5, "retry reuses the orphaned catalog entries");
    assert_eq!(crm.quotes().await.len(), 1);
}

#[tokio::test]
async fn read_failure_is_fatal_and_maps_to_internal_error() {
    let crm = Arc::new(InMemoryCrm::default());
    crm.insert_deal(deal("901", "Acme Logistics", "5000", "500000")).await;
    crm.fail_fetches("connection reset").await;

    let error = service(&crm).generate(&DealId::new("901")).await.expect_err("fetch must fail");

    assert_eq!(error.code(), FailureCode::InternalError);
    assert!(error.to_string().contains("connection reset"));
}
