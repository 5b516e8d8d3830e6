use clusterpilot_warehouse::{migrations, DemoClusters, VerificationResult};

use crate::commands::{connect, load_config, runtime, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoClusters::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoClusters::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<&'static str>, StepFailure> = if verification.all_present {
            Ok(seed_result.cluster_ids)
        } else {
            Err(("seed_verification", verification_message(&verification), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(cluster_ids) => {
            let invalid = DemoClusters::invalid_cluster_ids();
            let lines: Vec<String> = cluster_ids
                .iter()
                .map(|id| {
                    if invalid.contains(id) {
                        format!("  - {id} (intentionally invalid, rejected on load)")
                    } else {
                        format!("  - {id}")
                    }
                })
                .collect();
            let message = format!(
                "demo clusters loaded into `{}`:\n{}",
                DemoClusters::TABLE,
                lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

fn verification_message(verification: &VerificationResult) -> String {
    let failed_checks = verification
        .checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "some demo clusters failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
