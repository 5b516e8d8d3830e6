use std::env;
use std::sync::{Mutex, OnceLock};

use clusterpilot_cli::commands::clusters::ClusterFilterArgs;
use clusterpilot_cli::commands::{clusters, doctor, migrate, recommend, seed};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_warehouse(|| {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("CLUSTERPILOT_WAREHOUSE_URL", "postgres://localhost/clusters")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_lists_demo_clusters_and_is_idempotent() {
    with_warehouse(|| {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed success: {}", first.output);
        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed success: {}", second.output);

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["command"], "seed");
        assert_eq!(first_payload["message"], second_payload["message"]);

        let message = first_payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("  - cl-002"));
        assert!(message.contains("  - cl-009 (intentionally invalid, rejected on load)"));
    });
}

#[test]
fn clusters_apply_filters_and_report_rejected_rows() {
    with_warehouse(|| {
        assert_eq!(seed::run().exit_code, 0);

        let args = ClusterFilterArgs {
            interests: vec!["news".to_string()],
            ..ClusterFilterArgs::default()
        };
        let result = clusters::run(&args, true);
        assert_eq!(result.exit_code, 0, "expected clusters success: {}", result.output);

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(data["total"], 8);
        let ids: Vec<&str> = data["records"]
            .as_array()
            .map(|records| records.iter().filter_map(|r| r["clusterId"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["cl-002", "cl-004", "cl-006"]);
        assert_eq!(data["rejected"][0]["clusterId"], "cl-009");
        assert_eq!(data["rejected"][0]["field"], "age");
    });
}

#[test]
fn recommend_returns_the_deterministic_campaign() {
    with_warehouse(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run("cl-002", "", false, true);
        assert_eq!(result.exit_code, 0, "expected recommend success: {}", result.output);

        let payload = parse_payload(&result.output);
        let recommendation = &payload["data"]["recommendation"];
        assert_eq!(recommendation["channel"], "Email");
        assert_eq!(recommendation["sendTime"], "9:45");
        assert_eq!(payload["data"]["trace"]["channelRule"], "email_history");
        assert!(payload["data"].get("enrichment").is_none());
    });
}

#[test]
fn recommend_reports_skipped_enrichment_when_provider_is_disabled() {
    with_warehouse(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run("cl-001", "", true, true);
        assert_eq!(result.exit_code, 0, "expected recommend success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["enrichment"]["status"], "skipped");
        assert_eq!(payload["data"]["recommendation"]["channel"], "Push");
    });
}

#[test]
fn recommend_distinguishes_rejected_and_unknown_clusters() {
    with_warehouse(|| {
        assert_eq!(seed::run().exit_code, 0);

        let rejected = recommend::run("cl-009", "", false, true);
        assert_eq!(rejected.exit_code, 7);
        assert_eq!(parse_payload(&rejected.output)["error_class"], "invalid_input");

        let missing = recommend::run("cl-404", "", false, true);
        assert_eq!(missing.exit_code, 8);
        assert_eq!(parse_payload(&missing.output)["error_class"], "cluster_not_found");
    });
}

#[test]
fn doctor_reports_a_passing_seeded_warehouse() {
    with_warehouse(|| {
        assert_eq!(seed::run().exit_code, 0);

        let report: Value =
            serde_json::from_str(&doctor::run(true)).expect("doctor output should be valid JSON");
        assert_eq!(report["overall_status"], "pass");

        let statuses: Vec<(&str, &str)> = report["checks"]
            .as_array()
            .map(|checks| {
                checks
                    .iter()
                    .filter_map(|check| Some((check["name"].as_str()?, check["status"].as_str()?)))
                    .collect()
            })
            .unwrap_or_default();
        assert!(statuses.contains(&("cluster_table", "pass")));
        assert!(statuses.contains(&("llm_readiness", "skipped")));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_warehouse(test_fn: impl FnOnce()) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("clusters.db").display());
    with_env(&[("CLUSTERPILOT_WAREHOUSE_URL", url.as_str())], test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CLUSTERPILOT_WAREHOUSE_URL",
        "CLUSTERPILOT_WAREHOUSE_TABLE",
        "CLUSTERPILOT_WAREHOUSE_MAX_CONNECTIONS",
        "CLUSTERPILOT_WAREHOUSE_TIMEOUT_SECS",
        "CLUSTERPILOT_LLM_PROVIDER",
        "CLUSTERPILOT_LLM_API_KEY",
        "GEMINI_API_KEY",
        "CLUSTERPILOT_LLM_BASE_URL",
        "CLUSTERPILOT_LLM_MODEL",
        "CLUSTERPILOT_LLM_TEMPERATURE",
        "CLUSTERPILOT_LLM_TIMEOUT_SECS",
        "CLUSTERPILOT_LLM_MAX_RETRIES",
        "CLUSTERPILOT_SERVER_BIND_ADDRESS",
        "CLUSTERPILOT_SERVER_PORT",
        "CLUSTERPILOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CLUSTERPILOT_LOGGING_LEVEL",
        "CLUSTERPILOT_LOGGING_FORMAT",
        "CLUSTERPILOT_LOG_LEVEL",
        "CLUSTERPILOT_LOG_FORMAT",
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
