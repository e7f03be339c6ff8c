//! Integration tests for the full attribution pipeline.
//!
//! These tests run synthetic campus traffic end to end and check:
//! - Revenue conservation across every model
//! - Fixed-total budget plans
//! - Byte-identical output on repeated runs

use std::collections::BTreeMap;

use adspend_core::synth::generate;
use adspend_core::{ArmSample, Channel, Event, Pipeline, PipelineConfig, SynthConfig, TargetMetric};

/// Helper to build a mid-sized synthetic dataset.
fn synthetic_events(seed: u64) -> Vec<Event> {
    generate(&SynthConfig {
        seed,
        impressions: 20_000,
        users: 1_500,
        ..Default::default()
    })
    .unwrap()
}

/// Helper for the $100,000 campus budget split.
fn campus_budgets() -> BTreeMap<Channel, f64> {
    [
        ("Google Search", 25_000.0),
        ("Facebook", 20_000.0),
        ("Instagram", 15_000.0),
        ("TikTok", 12_000.0),
        ("YouTube", 10_000.0),
        ("Display Network", 8_000.0),
        ("Campus Radio", 5_000.0),
        ("Campus TV", 5_000.0),
    ]
    .into_iter()
    .map(|(c, b)| (Channel::from(c), b))
    .collect()
}

#[test]
fn pipeline_conserves_revenue_for_every_model() {
    let events = synthetic_events(42);
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&events, &campus_budgets()).unwrap();

    assert!(output.build_report.converted_journeys > 0);

    let first = output.tables[0].summary.credited_revenue;
    for table in &output.tables {
        let total = table.summary.credited_revenue;
        assert!(
            (total - first).abs() <= 1e-6 * first.max(1.0),
            "{} credited {total}, expected {first}",
            table.key.model
        );
    }
}

#[test]
fn pipeline_plan_preserves_total_budget() {
    let events = synthetic_events(42);
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&events, &campus_budgets()).unwrap();

    let plan = &output.plan;
    assert!((plan.total_budget - 100_000.0).abs() < 1e-9);
    assert!((plan.optimal_total() - 100_000.0).abs() < 1e-6);

    let max_shift = pipeline.config().optimizer.max_shift_pct;
    for allocation in &plan.allocations {
        assert!(allocation.optimal_budget >= 0.0);
        assert!(
            allocation.change.abs() <= max_shift * allocation.current_budget + 1e-9,
            "{} moved {}",
            allocation.channel,
            allocation.change
        );
    }
}

#[test]
fn pipeline_is_idempotent() {
    let events = synthetic_events(7);
    let budgets = campus_budgets();

    let first = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&events, &budgets)
        .unwrap();
    let second = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&events, &budgets)
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first.tables).unwrap(),
        serde_json::to_string(&second.tables).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.plan).unwrap(),
        serde_json::to_string(&second.plan).unwrap()
    );
    assert_eq!(first.config_fingerprint, second.config_fingerprint);
}

#[test]
fn pipeline_input_order_does_not_matter() {
    let events = synthetic_events(3);
    let mut reversed = events.clone();
    reversed.reverse();

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let forward = pipeline.run(&events, &campus_budgets()).unwrap();
    let backward = pipeline.run(&reversed, &campus_budgets()).unwrap();

    assert_eq!(
        serde_json::to_string(&forward.tables).unwrap(),
        serde_json::to_string(&backward.tables).unwrap()
    );
}

#[test]
fn duplicate_events_are_dropped() {
    let events = synthetic_events(11);
    let mut doubled = events.clone();
    doubled.extend(events.iter().cloned());

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let once = pipeline.run(&events, &campus_budgets()).unwrap();
    let twice = pipeline.run(&doubled, &campus_budgets()).unwrap();

    assert_eq!(twice.build_report.duplicates_dropped, events.len());
    assert_eq!(
        serde_json::to_string(&once.tables).unwrap(),
        serde_json::to_string(&twice.tables).unwrap()
    );
}

#[test]
fn config_change_changes_table_key() {
    let events = synthetic_events(42);
    let mut config = PipelineConfig::default();
    config.journey.lookback_days = 7;

    let default = Pipeline::new(PipelineConfig::default()).unwrap();
    let short = Pipeline::new(config).unwrap();

    let a = default.run(&events, &campus_budgets()).unwrap();
    let b = short.run(&events, &campus_budgets()).unwrap();
    assert_ne!(
        a.tables[0].key.config_fingerprint,
        b.tables[0].key.config_fingerprint
    );
}

#[test]
fn channel_ab_test_from_pipeline_tables() {
    let events = synthetic_events(42);
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&events, &campus_budgets()).unwrap();
    let table = output.primary_table().unwrap();

    let result = pipeline
        .compare_channels(
            table,
            &Channel::from("Facebook"),
            &Channel::from("TikTok"),
            TargetMetric::Ctr,
        )
        .unwrap();

    assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
    let facebook = table.get(&Channel::from("Facebook")).unwrap();
    assert_eq!(result.control_sample_size, facebook.impressions);
}

#[test]
fn significance_example_through_pipeline() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    let lift = pipeline
        .evaluate(&ArmSample::new(0.02, 15_000), &ArmSample::new(0.024, 15_000))
        .unwrap();
    assert!(lift.p_value < 0.05);
    assert!(lift.significant);

    let flat = pipeline
        .evaluate(&ArmSample::new(0.02, 15_000), &ArmSample::new(0.02, 15_000))
        .unwrap();
    assert!(!flat.significant);
}
