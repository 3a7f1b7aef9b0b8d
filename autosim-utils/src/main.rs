// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use clap::Parser;

mod analyze;
mod collect;

#[derive(Parser)]
#[command(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[command(version, propagate_version = true)]
#[command(about = "Autosim operator utilities", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Receive and show readings streamed by simulators.
    Collect {
        /// Address to listen on.
        #[arg(default_value_t = format!("0.0.0.0:{}", autosim::consts::DEFAULT_NETWORK_PORT))]
        address: String,
    },
    /// Summarize the readings stored in a ThingSpeak channel.
    Analyze {
        /// ThingSpeak channel identifier.
        channel: u64,
        /// Channel read API key.
        #[arg(long, env = "THINGSPEAK_READ_KEY", hide_env_values = true)]
        read_key: Option<String>,
        /// Number of most recent entries.
        #[arg(short, long, conflicts_with = "days")]
        results: Option<u32>,
        /// Number of days back from now.
        #[arg(short, long)]
        days: Option<u32>,
        /// ThingSpeak API base address.
        #[arg(long, default_value = "https://api.thingspeak.com")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    simplelog::TermLogger::init(
        log_level,
        simplelog::ConfigBuilder::new()
            .set_time_level(log::LevelFilter::Off)
            .set_thread_level(log::LevelFilter::Off)
            .set_target_level(log::LevelFilter::Off)
            .set_location_level(log::LevelFilter::Off)
            .add_filter_ignore_str("mio")
            .add_filter_ignore_str("hyper")
            .add_filter_ignore_str("reqwest")
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    match args.command {
        Command::Collect { address } => collect::listen(address).await?,
        Command::Analyze {
            channel,
            read_key,
            results,
            days,
            url,
        } => {
            // Without a window the channel is summarized over the last day.
            let days = if results.is_none() && days.is_none() {
                Some(1)
            } else {
                days
            };

            analyze::analyze(analyze::FeedQuery {
                url,
                channel,
                read_key,
                results,
                days,
            })
            .await?
        }
    }

    Ok(())
}
