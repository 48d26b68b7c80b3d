use serde_json::json;

use crate::commands::{prepare, CommandResult};
use wardrobe_db::{connect_with_config, migrations, SeedResult, StorefrontSeed};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = StorefrontSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = StorefrontSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seeded)
        } else {
            Err(("seed_verification", failed_checks_message(&verification.checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            summary(&seeded),
            Some(json!({
                "user_id": seeded.user_id,
                "dataset_rows": seeded.dataset_rows,
                "placeholder_rows": seeded.placeholder_rows,
            })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "seeded shopper `{}` with {} dataset products and {} id-only products",
        seeded.user_id, seeded.dataset_rows, seeded.placeholder_rows
    )
}

fn failed_checks_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::failed_checks_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("demo-user", true), ("dataset-rows", false), ("pool-coverage", false)];

        assert_eq!(
            failed_checks_message(&checks),
            "Seed verification failed for checks: dataset-rows, pool-coverage"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("demo-user", true), ("dataset-typed", true)];

        assert_eq!(failed_checks_message(&checks), "Some seed data failed to load");
    }
}
