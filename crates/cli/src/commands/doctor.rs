use clusterpilot_agent::enricher_from_config;
use clusterpilot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{connect, load_clusters};

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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.extend(check_warehouse(&config));
            checks.push(check_llm_readiness(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["warehouse_connectivity", "cluster_table", "llm_readiness"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_warehouse(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck {
                name: "warehouse_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
        }
    };

    runtime.block_on(async {
        let connectivity = match connect(config).await {
            Ok(pool) => {
                pool.close().await;
                DoctorCheck {
                    name: "warehouse_connectivity",
                    status: CheckStatus::Pass,
                    details: format!("connected using `{}`", config.warehouse.url),
                }
            }
            Err((_, message, _)) => {
                return vec![
                    DoctorCheck {
                        name: "warehouse_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to warehouse: {message}"),
                    },
                    DoctorCheck {
                        name: "cluster_table",
                        status: CheckStatus::Skipped,
                        details: "skipped because the warehouse is unreachable".to_string(),
                    },
                ];
            }
        };

        let table = match load_clusters(config).await {
            Ok(loaded) if loaded.is_empty() => DoctorCheck {
                name: "cluster_table",
                status: CheckStatus::Fail,
                details: format!(
                    "`{}` has no valid clusters ({} rejected); run `clusterpilot seed`",
                    config.warehouse.table,
                    loaded.rejected.len()
                ),
            },
            Ok(loaded) => DoctorCheck {
                name: "cluster_table",
                status: CheckStatus::Pass,
                details: format!(
                    "`{}` has {} valid clusters, {} rejected",
                    config.warehouse.table,
                    loaded.records.len(),
                    loaded.rejected.len()
                ),
            },
            Err((_, message, _)) => {
                DoctorCheck { name: "cluster_table", status: CheckStatus::Fail, details: message }
            }
        };

        vec![connectivity, table]
    })
}

fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    match enricher_from_config(&config.llm) {
        Ok(None) => DoctorCheck {
            name: "llm_readiness",
            status: CheckStatus::Skipped,
            details: "llm provider disabled; messages come from the rule engine only".to_string(),
        },
        Ok(Some(_)) => DoctorCheck {
            name: "llm_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "{:?} client ready with model `{}`",
                config.llm.provider, config.llm.model
            ),
        },
        Err(error) => DoctorCheck {
            name: "llm_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
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
