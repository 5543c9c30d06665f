//! alert_drill - send a test alert through the configured channels.
//!
//! Dispatches synchronously and prints per-channel outcomes, without touching
//! the daemon's cooldown gate.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use safesphere::{build_channels, Dispatcher, MessageTemplate, SentinelConfig};

#[derive(Debug, Parser)]
#[command(name = "alert_drill", about = "SafeSphere channel drill")]
struct Args {
    /// Configuration file (JSON). Also read from SENTRY_CONFIG.
    #[arg(long, env = "SENTRY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = SentinelConfig::load_from(args.config.as_deref())?;

    let dispatcher = Dispatcher::new(build_channels(&cfg));
    let names = dispatcher.channel_names();
    if names.is_empty() {
        println!("no notification channels configured");
        return Ok(());
    }
    println!("channels: {}", names.join(", "));
    println!("emergency contacts: {}", cfg.contacts.len());

    let template = MessageTemplate::new(cfg.user_name.clone(), cfg.location_hint.clone());
    let message = template.drill();
    println!("message: {}", message.long_text);

    let report = dispatcher.dispatch(&message);
    for result in &report.results {
        match &result.error {
            None => println!("  {}: ok", result.channel),
            Some(error) => println!("  {}: FAILED ({})", result.channel, error),
        }
    }
    println!("aggregate outcome: {:?}", report.outcome());
    Ok(())
}
