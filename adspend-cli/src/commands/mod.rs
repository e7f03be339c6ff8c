pub mod abtest;
pub mod attribute;
pub mod config;
pub mod generate;
pub mod optimize;
pub mod run;

use anyhow::Result;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
