//! Full pipeline command.

use std::path::{Path, PathBuf};

use adspend_core::{Pipeline, PipelineConfig, PipelineOutput};
use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::config::ConfigLoader;
use crate::{io, render};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Events file (JSON Lines)
    #[arg(long)]
    pub events: PathBuf,

    /// Current budget per channel (JSON object)
    #[arg(long)]
    pub budgets: PathBuf,

    /// Attribution model to compute (repeatable; default: configured models)
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// Model whose metrics drive the budget plan
    #[arg(long)]
    pub primary: Option<String>,

    /// Lookback window in days
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Print the full output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if !self.models.is_empty() {
            config.attribution.models = self.models.clone();
        }
        if let Some(primary) = &self.primary {
            config.attribution.primary = primary.clone();
        }
        if let Some(days) = self.lookback_days {
            config.journey.lookback_days = days;
        }
    }
}

pub fn run(args: RunArgs, explicit: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load_with(explicit)?;
    args.apply(&mut config);

    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let events = io::read_events(&args.events)?;
    let budgets = io::read_budgets(&args.budgets)?;

    let output = pipeline.run(&events, &budgets)?;

    if args.json {
        return super::print_json(&output);
    }
    print_report(&output);
    Ok(())
}

fn print_report(output: &PipelineOutput) {
    println!("{}", render::build_summary(&output.build_report));
    for issue in &output.build_report.rejected {
        warn!(user = %issue.user_id, error = %issue.error, "Rejected journey");
    }
    println!();

    if let Some(table) = output.primary_table() {
        println!(
            "Channel metrics ({}, {} to {})",
            table.key.model, table.key.window.start, table.key.window.end
        );
        println!("{}", render::metrics_table(table));
        println!();
    }

    println!("Credited revenue by model");
    println!("{}", render::comparison_table(&output.comparison));
    println!();

    if let Some(pareto) = &output.pareto {
        println!("{}", render::pareto_summary(pareto));
        println!();
    }

    println!(
        "Budget plan (total ${:.2}, expected improvement {:+.2}%)",
        output.plan.total_budget, output.plan.expected_improvement_pct
    );
    println!("{}", render::plan_table(&output.plan));

    if let Some(warning) = &output.plan.warning {
        println!("Warning: {}", warning.message());
    }
    if !output.plan.missing_metrics.is_empty() {
        let names: Vec<&str> = output
            .plan
            .missing_metrics
            .iter()
            .map(|c| c.as_str())
            .collect();
        println!("No metrics for: {}", names.join(", "));
    }
    println!("Config fingerprint: {}", output.config_fingerprint);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            events: PathBuf::from("events.jsonl"),
            budgets: PathBuf::from("budgets.json"),
            models: vec![],
            primary: None,
            lookback_days: None,
            json: false,
        }
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = PipelineConfig::default();
        args().apply(&mut config);
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = PipelineConfig::default();
        let args = RunArgs {
            models: vec!["linear".into(), "time_decay".into()],
            primary: Some("time_decay".into()),
            lookback_days: Some(7),
            ..args()
        };

        args.apply(&mut config);

        assert_eq!(config.attribution.models, vec!["linear", "time_decay"]);
        assert_eq!(config.attribution.primary, "time_decay");
        assert_eq!(config.journey.lookback_days, 7);
    }
}
