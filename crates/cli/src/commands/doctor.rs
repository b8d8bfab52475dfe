use proforma_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DOCTOR, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { EXIT_OK } else { EXIT_DOCTOR };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_token_shape(&config));
            checks.push(check_webhook_shape(&config));
            checks.push(check_crm_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("crm_token_shape"));
            checks.push(skipped("render_webhook_shape"));
            checks.push(skipped("crm_reachability"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all preflight checks passed".to_string()
    } else {
        "doctor: one or more preflight checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_token_shape(config: &AppConfig) -> DoctorCheck {
    // Shape only; the token value itself never appears in output.
    let status = if config.crm.access_token.expose_secret().starts_with("pat-") {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    DoctorCheck {
        name: "crm_token_shape",
        status,
        details: match status {
            CheckStatus::Pass => "private app token prefix present".to_string(),
            _ => "expected a CRM private app token (pat-*)".to_string(),
        },
    }
}

fn check_webhook_shape(config: &AppConfig) -> DoctorCheck {
    let url = &config.render.webhook_url;
    let status = if url.starts_with("http://") || url.starts_with("https://") {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    DoctorCheck {
        name: "render_webhook_shape",
        status,
        details: match status {
            CheckStatus::Pass => "webhook url looks well formed".to_string(),
            _ => format!("render webhook url must be http(s), got `{url}`"),
        },
    }
}

fn check_crm_reachability(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "crm_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    // No auth on purpose; any HTTP response at all proves the endpoint is
    // reachable, including 401/404.
    let result = runtime.block_on(async {
        reqwest::Client::new()
            .get(&config.crm.base_url)
            .timeout(config.crm.request_timeout())
            .send()
            .await
    });

    match result {
        Ok(response) => DoctorCheck {
            name: "crm_reachability",
            status: CheckStatus::Pass,
            details: format!("crm endpoint responded with status {}", response.status().as_u16()),
        },
        Err(error) => DoctorCheck {
            name: "crm_reachability",
            status: CheckStatus::Fail,
            details: format!("could not reach the crm endpoint: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
