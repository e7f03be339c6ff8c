//! A/B significance command.

use std::path::Path;

use adspend_core::{AbTestEvaluator, ArmSample};
use anyhow::Result;
use clap::Args;

use crate::config::ConfigLoader;
use crate::render;

#[derive(Args, Debug)]
pub struct AbTestArgs {
    /// Control conversion rate or CTR (0-1)
    #[arg(long)]
    pub control_rate: f64,

    /// Control sample size (clicks or impressions)
    #[arg(long)]
    pub control_n: u64,

    /// Treatment conversion rate or CTR (0-1)
    #[arg(long)]
    pub treatment_rate: f64,

    /// Treatment sample size
    #[arg(long)]
    pub treatment_n: u64,

    /// Two-sided significance level
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Statistical power for the sample size requirement
    #[arg(long)]
    pub power: Option<f64>,

    /// Minimum detectable effect, relative to control
    #[arg(long)]
    pub mde: Option<f64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AbTestArgs, explicit: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load_with(explicit)?.abtest;
    if let Some(alpha) = args.alpha {
        config.significance_level = alpha;
    }
    if let Some(power) = args.power {
        config.power = power;
    }
    if let Some(mde) = args.mde {
        config.minimum_detectable_effect = mde;
    }

    let evaluator = AbTestEvaluator::with_config(config)?;
    let result = evaluator.evaluate(
        &ArmSample::new(args.control_rate, args.control_n),
        &ArmSample::new(args.treatment_rate, args.treatment_n),
    )?;

    if args.json {
        return super::print_json(&result);
    }

    println!("{}", render::abtest_table(&result));
    println!("{}", render::abtest_summary(&result));
    Ok(())
}
