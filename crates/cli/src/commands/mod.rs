pub mod config;
pub mod doctor;
pub mod link;
pub mod propose;
pub mod render;
pub mod tiers;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use proforma_core::config::{AppConfig, LoadOptions};
use proforma_core::ProposalError;
use proforma_crm::{CrmGateway, HttpCrmGateway};

/// Process exit codes. Enterprise volume gets its own code because the
/// operator's next action (route to the enterprise desk) differs from every
/// failure case.
pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CRM: u8 = 3;
pub const EXIT_WEBHOOK: u8 = 4;
pub const EXIT_ENTERPRISE: u8 = 5;
pub const EXIT_DOCTOR: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::outcome(command, "ok", None, message, None, EXIT_OK)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        Self::outcome(command, "ok", None, message, Some(data), EXIT_OK)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::outcome(command, "error", Some(error_class), message, None, exit_code)
    }

    /// Non-error terminal states carry their own status word, e.g.
    /// `enterprise_volume` or `timed_out`.
    pub fn outcome(
        command: &str,
        status: &str,
        error_class: Option<&str>,
        message: impl Into<String>,
        data: Option<Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class: error_class.map(str::to_string),
            message: message.into(),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_CONFIG,
        )
    })
}

fn crm_gateway(config: &AppConfig) -> Arc<dyn CrmGateway> {
    Arc::new(HttpCrmGateway::new(&config.crm))
}

fn proposal_failure(command: &str, error: &ProposalError) -> CommandResult {
    let (error_class, exit_code) = match error {
        ProposalError::RecordStore(_) => ("record_store", EXIT_CRM),
        ProposalError::Tier(_) => ("tier_classification", EXIT_CONFIG),
    };
    CommandResult::failure(command, error_class, error.to_string(), exit_code)
}
