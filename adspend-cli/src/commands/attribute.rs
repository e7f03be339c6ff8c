//! Attribution model comparison command.

use std::path::{Path, PathBuf};

use adspend_core::{AttributionModel, JourneyBuilder, ModelComparison, attribute_all};
use anyhow::Result;
use clap::Args;

use crate::config::ConfigLoader;
use crate::{io, render};

#[derive(Args, Debug)]
pub struct AttributeArgs {
    /// Events file (JSON Lines)
    #[arg(long)]
    pub events: PathBuf,

    /// Attribution model to compare (repeatable; default: configured models)
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// Time-decay half-life in days
    #[arg(long)]
    pub half_life_days: Option<f64>,

    /// Print the comparison as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AttributeArgs, explicit: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load_with(explicit)?;
    if !args.models.is_empty() {
        config.attribution.models = args.models.clone();
    }
    if let Some(half_life) = args.half_life_days {
        config.attribution.half_life_days = half_life;
    }
    let models = config.attribution.models()?;
    for model in &models {
        model.validate()?;
    }

    let events = io::read_events(&args.events)?;
    let journeys = JourneyBuilder::with_config(config.journey.clone()).build(&events);

    let results = models
        .iter()
        .map(|model| attribute_all(&journeys.converted, model).map(|r| (*model, r)))
        .collect::<Result<Vec<(AttributionModel, _)>, _>>()?;
    let comparison = ModelComparison::from_results(&results);

    if args.json {
        return super::print_json(&comparison);
    }

    println!("{}", render::build_summary(&journeys.report));
    println!("{}", render::comparison_table(&comparison));
    for (idx, model) in comparison.models.iter().enumerate() {
        println!("{:<16} total ${:.2}", model.name(), comparison.model_total(idx));
    }
    for line in render::correlation_lines(&comparison) {
        println!("{line}");
    }
    if let Some(row) = comparison.most_sensitive().first() {
        println!(
            "Most model-sensitive channel: {} (std dev ${:.2})",
            row.channel,
            row.variance.sqrt()
        );
    }
    Ok(())
}
