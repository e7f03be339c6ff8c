//! Budget optimization command.

use std::path::{Path, PathBuf};

use adspend_core::{BudgetOptimizer, ChannelMetrics, MetricsTable};
use anyhow::Result;
use clap::Args;
use serde::Deserialize;

use crate::config::ConfigLoader;
use crate::{io, render};

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Metrics file: a metrics table or an array of channel metrics (JSON)
    #[arg(long)]
    pub metrics: PathBuf,

    /// Current budget per channel (JSON object)
    #[arg(long)]
    pub budgets: PathBuf,

    /// Largest per-channel change as a fraction of its budget
    #[arg(long)]
    pub max_shift: Option<f64>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

/// Accepted shapes of the metrics file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetricsInput {
    Table(MetricsTable),
    Rows(Vec<ChannelMetrics>),
}

impl MetricsInput {
    fn into_rows(self) -> Vec<ChannelMetrics> {
        match self {
            Self::Table(table) => table.rows,
            Self::Rows(rows) => rows,
        }
    }
}

pub fn run(args: OptimizeArgs, explicit: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load_with(explicit)?;
    if let Some(max_shift) = args.max_shift {
        config.optimizer.max_shift_pct = max_shift;
    }

    let metrics = io::read_json::<MetricsInput>(&args.metrics)?.into_rows();
    let budgets = io::read_budgets(&args.budgets)?;

    let plan = BudgetOptimizer::with_config(config.optimizer).recommend(&metrics, &budgets)?;

    if args.json {
        return super::print_json(&plan);
    }

    println!("{}", render::plan_table(&plan));
    println!(
        "Moved ${:.2} of ${:.2}; expected improvement {:+.2}%",
        plan.moved(),
        plan.total_budget,
        plan.expected_improvement_pct
    );
    if let Some(warning) = &plan.warning {
        println!("Warning: {}", warning.message());
    }
    Ok(())
}
