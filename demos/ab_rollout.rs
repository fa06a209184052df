//! A/B Rollout Walkthrough
//!
//! Demonstrates the full experiment lifecycle: define, run, assign, log
//! metrics, and read the winner.
//!
//! Run with: cargo run --example ab_rollout

use sorteo::experiment::{Experiment, ExperimentStatus, Variation};
use sorteo::{calculate_significance, AbEngine, MemoryKvStore, NoopSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Sorteo A/B Rollout ===\n");

    let engine = AbEngine::builder(MemoryKvStore::new(), NoopSink).build().await;

    // -------------------------------------------------------------------------
    // 1. Define and start the experiment
    // -------------------------------------------------------------------------
    println!("1. Creating experiment...");

    let experiment = Experiment::builder("exp-cta", "Checkout CTA color", "conversion_rate")
        .hypothesis("A green call-to-action converts better than blue")
        .variation(
            Variation::new("control", "Blue button", 50)
                .with_config(serde_json::json!({"button_color": "#1a73e8"})),
        )
        .variation(
            Variation::new("treatment", "Green button", 50)
                .with_config(serde_json::json!({"button_color": "#188038"})),
        )
        .status(ExperimentStatus::Running)
        .build();

    println!("   Experiment: {} ({})", experiment.name(), experiment.id());
    println!("   Hypothesis: {}", experiment.hypothesis());
    engine.create_experiment(experiment).await?;

    // -------------------------------------------------------------------------
    // 2. Assign a cohort of users
    // -------------------------------------------------------------------------
    println!("\n2. Assigning 1000 users...");

    let mut split = [0usize; 2];
    for i in 0..1000usize {
        let user = format!("user-{i:04}");
        if let Some(assigned) = engine.assign(&user, "exp-cta").await? {
            let arm = usize::from(assigned.variation_id() == "treatment");
            split[arm] += 1;

            // Simulate observed conversions: treatment converts slightly better
            let converted = (i % 10) < 2 + arm;
            engine.log_metric(
                "exp-cta",
                assigned.variation_id(),
                "conversion_rate",
                if converted { 1.0 } else { 0.0 },
            );
        }
    }
    println!("   control={} treatment={}", split[0], split[1]);

    // -------------------------------------------------------------------------
    // 3. Sticky replay
    // -------------------------------------------------------------------------
    println!("\n3. Replaying an assignment...");

    let first = engine.assign("user-0001", "exp-cta").await?.unwrap();
    let second = engine.assign("user-0001", "exp-cta").await?.unwrap();
    println!(
        "   user-0001 -> {} (replayed: {})",
        first.variation_id(),
        second.variation_id()
    );

    // -------------------------------------------------------------------------
    // 4. Significance and winner
    // -------------------------------------------------------------------------
    println!("\n4. Reading results...");

    let groups = engine.get_results("exp-cta");
    let control_values = groups
        .iter()
        .find(|g| g.variation_id() == "control" && g.metric_name() == "conversion_rate")
        .map(sorteo::ResultGroup::values)
        .unwrap_or_default();
    let treatment_values = groups
        .iter()
        .find(|g| g.variation_id() == "treatment" && g.metric_name() == "conversion_rate")
        .map(sorteo::ResultGroup::values)
        .unwrap_or_default();

    let significance = calculate_significance(&control_values, &treatment_values);
    println!(
        "   p-value={} significant={} confidence={:.1}%",
        significance.p_value(),
        significance.is_significant(),
        significance.confidence()
    );

    if let Some(winner) = engine.get_winner("exp-cta")? {
        println!(
            "   Winner: {} ({}) mean={:.3}",
            winner.variation_name(),
            winner.variation_id(),
            winner.mean()
        );
    }

    // -------------------------------------------------------------------------
    // 5. Pause the rollout
    // -------------------------------------------------------------------------
    println!("\n5. Pausing...");
    engine
        .update_experiment_status("exp-cta", ExperimentStatus::Paused)
        .await?;
    let gated = engine.assign("user-new", "exp-cta").await?;
    println!("   new assignment while paused: {gated:?}");

    println!("\n=== Rollout Complete ===");
    Ok(())
}
