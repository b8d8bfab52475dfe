use serde_json::json;

use proforma_core::{DealId, ProposalOutcome};
use proforma_crm::ProposalService;

use crate::commands::{
    build_runtime, crm_gateway, load_config, proposal_failure, CommandResult, EXIT_ENTERPRISE,
};

pub fn run(deal_id: &str, preview: bool) -> CommandResult {
    let command = "propose";
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let service = ProposalService::new(crm_gateway(&config));
    let deal_id = DealId::new(deal_id);
    let outcome = runtime.block_on(async {
        if preview {
            service.preview(&deal_id).await
        } else {
            service.generate(&deal_id).await
        }
    });

    match outcome {
        Ok(ProposalOutcome::Priced(proposal)) => {
            let message = format!(
                "deal {} priced at {} ({}% off {}); total monthly roi {}",
                proposal.deal_id,
                proposal.pricing.discounted_price,
                proposal.pricing.discount_percent,
                proposal.pricing.original_price,
                proposal.roi.total_monthly_roi
            );
            let data = serde_json::to_value(&proposal).unwrap_or_else(|_| json!({}));
            CommandResult::success_with_data(command, message, data)
        }
        Ok(ProposalOutcome::EnterpriseVolume { volume }) => CommandResult::outcome(
            command,
            "enterprise_volume",
            None,
            format!(
                "monthly volume {volume} is at or above the enterprise cutoff; route the deal to the enterprise desk"
            ),
            Some(json!({ "volume": volume })),
            EXIT_ENTERPRISE,
        ),
        Err(error) => proposal_failure(command, &error),
    }
}
