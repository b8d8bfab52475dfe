use serde_json::json;

use proforma_core::DealId;
use proforma_crm::ProposalService;

use crate::commands::{build_runtime, crm_gateway, load_config, proposal_failure, CommandResult};

pub fn run(deal_id: &str) -> CommandResult {
    let command = "link";
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

    match runtime.block_on(service.check_link(&deal_id)) {
        Ok(Some(link)) => CommandResult::success_with_data(
            command,
            "proposal document link is ready",
            json!({ "link": link }),
        ),
        Ok(None) => CommandResult::success_with_data(
            command,
            "no proposal document link on the deal yet",
            json!({ "link": null }),
        ),
        Err(error) => proposal_failure(command, &error),
    }
}
