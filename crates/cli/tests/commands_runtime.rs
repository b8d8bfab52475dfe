use std::env;
use std::sync::{Mutex, OnceLock};

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use proforma_cli::commands::{config, doctor, link, propose, render, tiers};

#[test]
fn propose_returns_config_failure_without_credentials() {
    with_env(&[], || {
        let result = propose::run("901", false);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "propose");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn propose_preview_prices_a_deal_against_the_stub_crm() {
    let (stub, base_url) = start_stub();

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = propose::run("901", true);
            assert_eq!(result.exit_code, 0, "expected successful preview");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "propose");
            assert_eq!(payload["status"], "ok");
            assert_eq!(payload["data"]["deal_name"], "Acme Logistics");
            assert_eq!(decimal_at(&payload, "/data/pricing/discounted_price"), Decimal::from(1_000));
            assert_eq!(
                decimal_at(&payload, "/data/roi/total_monthly_roi"),
                Decimal::new(263_750, 2)
            );
            assert_eq!(payload["data"]["quote"], Value::Null, "preview must not persist a quote");
        },
    );

    drop(stub);
}

#[test]
fn propose_reports_enterprise_volume_with_its_own_exit_code() {
    let (stub, base_url) = start_stub();

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = propose::run("907", true);
            assert_eq!(result.exit_code, 5, "expected the enterprise outcome code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "enterprise_volume");
            assert_eq!(payload["error_class"], Value::Null);
            assert_eq!(decimal_at(&payload, "/data/volume"), Decimal::from(750_000));
        },
    );

    drop(stub);
}

#[test]
fn propose_maps_an_unknown_deal_to_the_crm_exit_code() {
    let (stub, base_url) = start_stub();

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = propose::run("999", true);
            assert_eq!(result.exit_code, 3, "expected the CRM failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "record_store");
            assert!(payload["message"].as_str().expect("message").contains("999"));
        },
    );

    drop(stub);
}

#[test]
fn link_returns_null_then_the_stored_value() {
    let (stub, base_url) = start_stub();

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let pending = link::run("901");
            assert_eq!(pending.exit_code, 0);
            let payload = parse_payload(&pending.output);
            assert_eq!(payload["data"]["link"], Value::Null);

            let ready = link::run("903");
            assert_eq!(ready.exit_code, 0);
            let payload = parse_payload(&ready.output);
            assert_eq!(payload["data"]["link"], "https://cdn.example.test/p/903.pdf");
        },
    );

    drop(stub);
}

#[test]
fn render_without_watch_reports_acceptance() {
    let (stub, base_url) = start_stub();
    let webhook = format!("{base_url}/render-ok");

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", webhook.as_str()),
        ],
        || {
            let result = render::run("901", false);
            assert_eq!(result.exit_code, 0, "expected the render trigger to be accepted");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "render");
            assert_eq!(payload["status"], "ok");
            assert!(payload["message"].as_str().expect("message").contains("accepted"));
        },
    );

    drop(stub);
}

#[test]
fn render_maps_a_webhook_rejection_to_exit_four() {
    let (stub, base_url) = start_stub();
    let webhook = format!("{base_url}/render-reject");

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", webhook.as_str()),
        ],
        || {
            let result = render::run("901", false);
            assert_eq!(result.exit_code, 4, "expected the webhook rejection code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "webhook");
        },
    );

    drop(stub);
}

#[test]
fn render_watch_exits_zero_when_the_budget_runs_out() {
    let (stub, base_url) = start_stub();
    let webhook = format!("{base_url}/render-ok");

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", webhook.as_str()),
            ("PROFORMA_WATCH_INTERVAL_SECS", "1"),
            ("PROFORMA_WATCH_MAX_ATTEMPTS", "2"),
        ],
        || {
            // Deal 901 never gets a link from the stub.
            let result = render::run("901", true);
            assert_eq!(result.exit_code, 0, "a timeout is not an error");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "timed_out");
            assert_eq!(payload["data"]["attempts"], 2);
        },
    );

    drop(stub);
}

#[test]
fn render_watch_returns_the_link_once_it_lands() {
    let (stub, base_url) = start_stub();
    let webhook = format!("{base_url}/render-ok");

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", webhook.as_str()),
            ("PROFORMA_WATCH_INTERVAL_SECS", "1"),
            ("PROFORMA_WATCH_MAX_ATTEMPTS", "5"),
        ],
        || {
            let result = render::run("903", true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "ok");
            assert_eq!(payload["data"]["link"], "https://cdn.example.test/p/903.pdf");
            assert_eq!(payload["data"]["attempts"], 1);
        },
    );

    drop(stub);
}

#[test]
fn tiers_prints_both_reference_tables() {
    let result = tiers::run();
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "tiers");
    assert_eq!(payload["data"]["enterprise_min_volume"], 700_000);
    assert_eq!(payload["data"]["pricing_tiers"].as_array().expect("pricing rows").len(), 9);
    assert_eq!(payload["data"]["roi_tiers"].as_array().expect("roi rows").len(), 10);
    assert_eq!(payload["data"]["pricing_tiers"][0]["ceiling"], 1_000);
    assert_eq!(payload["data"]["pricing_tiers"][0]["discounted_usd"], 750);
    assert_eq!(decimal_at(&payload, "/data/roi_tiers/0/billing_hours"), Decimal::new(175, 1));
    assert_eq!(decimal_at(&payload, "/data/roi_tiers/0/ticket_hours"), Decimal::new(175, 2));
}

#[test]
fn config_redacts_the_access_token() {
    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-secret-0000"),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(result.output.starts_with("effective config"));
            assert!(result.output.contains("crm.access_token = pat-***"));
            assert!(!result.output.contains("pat-na1-secret-0000"));
            assert!(result.output.contains("source: env (PROFORMA_CRM_ACCESS_TOKEN)"));
            assert!(result.output.contains("server.port = 8787 (source: default)"));
        },
    );
}

#[test]
fn config_reports_validation_failure_with_exit_two() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("config validation failed"));
    });
}

#[test]
fn doctor_fails_fast_when_config_does_not_load() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 6, "expected the doctor failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][3]["status"], "skipped");
    });
}

#[test]
fn doctor_passes_against_a_reachable_stub() {
    let (stub, base_url) = start_stub();

    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            ("PROFORMA_CRM_BASE_URL", base_url.as_str()),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0, "expected all preflight checks to pass");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            assert_eq!(payload["checks"][3]["name"], "crm_reachability");
            assert_eq!(payload["checks"][3]["status"], "pass");
        },
    );

    drop(stub);
}

#[test]
fn doctor_flags_an_unreachable_crm() {
    with_env(
        &[
            ("PROFORMA_CRM_ACCESS_TOKEN", "pat-na1-test"),
            // Port 1 on loopback is never listening.
            ("PROFORMA_CRM_BASE_URL", "http://127.0.0.1:1"),
            ("PROFORMA_CRM_REQUEST_TIMEOUT_SECS", "1"),
            ("PROFORMA_RENDER_WEBHOOK_URL", "https://hooks.example.test/render"),
        ],
        || {
            let result = doctor::run(false);
            assert_eq!(result.exit_code, 6);
            assert!(result.output.contains("[fail] crm_reachability"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn decimal_at(payload: &Value, pointer: &str) -> Decimal {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("{pointer} should be a decimal string"))
        .parse()
        .unwrap_or_else(|_| panic!("{pointer} should parse back into a decimal"))
}

/// CRM and webhook stub on an ephemeral port. The returned runtime keeps the
/// server alive; drop it to shut the stub down.
fn start_stub() -> (tokio::runtime::Runtime, String) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("stub runtime");

    let addr = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, stub_router()).await.expect("stub server");
        });
        addr
    });

    (runtime, format!("http://{addr}"))
}

fn stub_router() -> Router {
    Router::new()
        .route(
            "/crm/v3/objects/deals/{deal_id}",
            get(|Path(deal_id): Path<String>| async move {
                let properties = match deal_id.as_str() {
                    "901" => json!({
                        "dealname": "Acme Logistics",
                        "monthly_order_volume": "5000",
                        "yearly_turnover": "500000",
                    }),
                    "903" => json!({
                        "dealname": "Borealis Freight",
                        "monthly_order_volume": "100000",
                        "yearly_turnover": "2000000",
                        "proposal_pdf_link": "https://cdn.example.test/p/903.pdf",
                    }),
                    "907" => json!({
                        "dealname": "Mega Corp",
                        "monthly_order_volume": "750000",
                        "yearly_turnover": "9000000",
                    }),
                    _ => return StatusCode::NOT_FOUND.into_response(),
                };
                Json(json!({ "id": deal_id, "properties": properties })).into_response()
            }),
        )
        .route("/render-ok", post(|| async { StatusCode::OK }))
        .route(
            "/render-reject",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "renderer down") }),
        )
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PROFORMA_CRM_BASE_URL",
        "PROFORMA_CRM_ACCESS_TOKEN",
        "PROFORMA_CRM_REQUEST_TIMEOUT_SECS",
        "PROFORMA_RENDER_WEBHOOK_URL",
        "PROFORMA_RENDER_REQUEST_TIMEOUT_SECS",
        "PROFORMA_WATCH_INTERVAL_SECS",
        "PROFORMA_WATCH_MAX_ATTEMPTS",
        "PROFORMA_SERVER_BIND_ADDRESS",
        "PROFORMA_SERVER_PORT",
        "PROFORMA_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PROFORMA_LOGGING_LEVEL",
        "PROFORMA_LOGGING_FORMAT",
        "PROFORMA_LOG_LEVEL",
        "PROFORMA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
