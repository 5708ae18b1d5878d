use crate::commands::{load_config, runtime, CommandResult};
use unishop_db::{connect_with_config, migrations, CatalogSeed};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = CatalogSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<String>, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(seed_result.product_ids)
            } else {
                let failed = verification
                    .checks
                    .iter()
                    .filter_map(|(product_id, present)| (!present).then_some(product_id.as_str()))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_failure_message(&failed), 6u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(product_ids) => CommandResult::success(
            "seed",
            format!(
                "built-in catalog loaded: {} products ({})",
                product_ids.len(),
                product_ids.join(", ")
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure_message(failed: &[&str]) -> String {
    if failed.is_empty() {
        "Some seed products failed to load".to_string()
    } else {
        format!("Seed verification failed for products: {}", failed.join(", "))
    }
}
