//! Synthetic data command.

use std::path::PathBuf;

use adspend_core::EventType;
use adspend_core::synth::{SynthConfig, generate};
use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::io;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output file (JSON Lines)
    #[arg(long)]
    pub out: PathBuf,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of impressions
    #[arg(long, default_value_t = 100_000)]
    pub impressions: usize,

    /// Number of distinct users
    #[arg(long, default_value_t = 5_000)]
    pub users: u32,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let config = SynthConfig {
        seed: args.seed,
        impressions: args.impressions,
        users: args.users,
        ..Default::default()
    };

    let events = generate(&config)?;
    io::write_events(&args.out, &events)?;

    let count = |t: EventType| events.iter().filter(|e| e.event_type == t).count();
    let impressions = count(EventType::Impression);
    let clicks = count(EventType::Click);
    let conversions = count(EventType::Conversion);

    info!(path = %args.out.display(), events = events.len(), "Wrote events");
    println!("Impressions: {impressions}");
    println!("Clicks:      {clicks}");
    println!("Conversions: {conversions}");
    if impressions > 0 && clicks > 0 {
        println!(
            "CTR {:.2}%, conversion rate {:.2}%",
            clicks as f64 / impressions as f64 * 100.0,
            conversions as f64 / clicks as f64 * 100.0
        );
    }
    Ok(())
}
