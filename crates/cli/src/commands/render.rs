use serde_json::json;
use tokio::sync::watch;

use proforma_core::{DealId, ProposalOutcome};
use proforma_crm::{LinkWatcher, ProposalService, RenderClient, RenderPayload, WatchOutcome};

use crate::commands::{
    build_runtime, crm_gateway, load_config, proposal_failure, CommandResult, EXIT_CRM,
    EXIT_ENTERPRISE, EXIT_OK, EXIT_WEBHOOK,
};

pub fn run(deal_id: &str, watch_for_link: bool) -> CommandResult {
    let command = "render";
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let gateway = crm_gateway(&config);
    let service = ProposalService::new(gateway.clone());
    let render = RenderClient::new(&config.render);
    let deal_id = DealId::new(deal_id);

    runtime.block_on(async {
        // Pricing here is compute-only; persisting the quote is `propose`'s job.
        let outcome = match service.preview(&deal_id).await {
            Ok(outcome) => outcome,
            Err(error) => return proposal_failure(command, &error),
        };
        let proposal = match outcome {
            ProposalOutcome::Priced(proposal) => proposal,
            ProposalOutcome::EnterpriseVolume { volume } => {
                return CommandResult::outcome(
                    command,
                    "enterprise_volume",
                    None,
                    format!(
                        "monthly volume {volume} is at or above the enterprise cutoff; no render was triggered"
                    ),
                    Some(json!({ "volume": volume })),
                    EXIT_ENTERPRISE,
                );
            }
        };

        if let Err(error) = render.trigger(&RenderPayload::from_proposal(&proposal)).await {
            return CommandResult::failure(command, "webhook", error.to_string(), EXIT_WEBHOOK);
        }

        if !watch_for_link {
            return CommandResult::success(
                command,
                "render job accepted; follow up with `proforma link` or rerun with --watch",
            );
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });

        let watcher = LinkWatcher::new(gateway, config.watch.policy());
        match watcher.watch(&deal_id, cancel_rx).await {
            Ok(WatchOutcome::Linked { link, attempts }) => CommandResult::success_with_data(
                command,
                format!("proposal document ready after {attempts} checks"),
                json!({ "link": link, "attempts": attempts }),
            ),
            Ok(WatchOutcome::TimedOut { attempts }) => CommandResult::outcome(
                command,
                "timed_out",
                None,
                "the document is taking longer than expected; check the deal again later",
                Some(json!({ "attempts": attempts })),
                EXIT_OK,
            ),
            Ok(WatchOutcome::Cancelled { attempts }) => CommandResult::outcome(
                command,
                "cancelled",
                None,
                "watch cancelled before the link landed",
                Some(json!({ "attempts": attempts })),
                EXIT_OK,
            ),
            Err(error) => {
                CommandResult::failure(command, "record_store", error.to_string(), EXIT_CRM)
            }
        }
    })
}
