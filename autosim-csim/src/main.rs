// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::path::PathBuf;

use autosim::net::{LogPublisher, Publisher, StreamPublisher};
use autosim_dtc::{ChainDescriber, CodeCatalog, CsvDescriber, HeuristicDescriber};
use clap::Parser;

mod config;
mod thingspeak;

#[derive(Parser)]
#[command(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[command(version, propagate_version = true)]
#[command(about = "Autosim vehicle trip simulator", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// File listing the known diagnostic trouble codes.
    #[arg(long)]
    codes: Option<PathBuf>,
    /// File with diagnostic trouble code descriptions.
    #[arg(long)]
    descriptions: Option<PathBuf>,
    /// Tick interval in milliseconds.
    #[arg(short, long)]
    interval: Option<u64>,
    /// Trip duration in seconds.
    #[arg(short, long)]
    duration: Option<u64>,
    /// Random seed for the trip.
    #[arg(long)]
    seed: Option<u64>,
    /// Generate the trip without waiting between ticks.
    #[arg(long)]
    fast: bool,
    /// Stream readings to a collector.
    #[arg(long)]
    collector: Option<String>,
    /// ThingSpeak write API key.
    #[arg(long, env = "THINGSPEAK_API_KEY", hide_env_values = true)]
    thingspeak_key: Option<String>,
    /// Daemonize the service.
    #[arg(long)]
    daemon: bool,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let bin_name = env!("CARGO_BIN_NAME");

    let file_config: config::FileConfig = match &args.config {
        Some(path) => autosim::from_file(path)?,
        None => config::FileConfig::default(),
    };

    let mut config = config::CsimConfig::from(file_config);

    if let Some(codes) = args.codes {
        config.codes.catalog = codes;
    }
    if args.descriptions.is_some() {
        config.codes.descriptions = args.descriptions;
    }
    if let Some(interval) = args.interval {
        config.sim.trip.interval = interval;
    }
    if let Some(duration) = args.duration {
        config.sim.trip.duration = duration;
    }
    if args.seed.is_some() {
        config.sim.trip.seed = args.seed;
    }
    if args.fast {
        config.sim.trip.realtime = false;
    }
    if args.collector.is_some() {
        config.publish.collector = args.collector;
    }
    if args.thingspeak_key.is_some() {
        config.publish.thingspeak_key = args.thingspeak_key;
    }

    config.global.bin_name = bin_name.to_string();
    config.global.daemon = args.daemon;

    let mut log_config = simplelog::ConfigBuilder::new();
    if args.daemon {
        log_config.set_time_level(log::LevelFilter::Off);
        log_config.set_thread_level(log::LevelFilter::Off);
    } else {
        log_config.set_time_offset_to_local().ok();
        log_config.set_time_format_rfc2822();
    }

    log_config.set_target_level(log::LevelFilter::Off);
    log_config.set_location_level(log::LevelFilter::Off);
    log_config.add_filter_ignore_str("mio");
    log_config.add_filter_ignore_str("hyper");
    log_config.add_filter_ignore_str("reqwest");

    let log_level = if args.daemon {
        log::LevelFilter::Info
    } else {
        match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    let color_choice = if args.daemon {
        simplelog::ColorChoice::Never
    } else {
        simplelog::ColorChoice::Auto
    };

    simplelog::TermLogger::init(
        log_level,
        log_config.build(),
        simplelog::TerminalMode::Mixed,
        color_choice,
    )?;

    if args.daemon {
        log::debug!("Running service as daemon");
    }

    log::trace!("{:#?}", config);

    daemonize(&config).await
}

async fn publisher(config: &config::CsimConfig) -> anyhow::Result<Box<dyn Publisher>> {
    if let Some(address) = &config.publish.collector {
        let mut address = address.clone();
        if !address.contains(':') {
            address.push(':');
            address.push_str(&autosim::consts::DEFAULT_NETWORK_PORT.to_string());
        }

        log::debug!("Connecting to collector at {}", address);

        let stream = tokio::net::TcpStream::connect(&address).await?;

        let publisher = StreamPublisher::start(
            stream,
            format!("{}/{}", config.global.bin_name, autosim::consts::VERSION),
        )
        .await?;

        log::info!("Streaming readings to {}", address);

        return Ok(Box::new(publisher));
    }

    match config
        .publish
        .thingspeak_key
        .as_ref()
        .filter(|key| !key.trim().is_empty())
    {
        Some(api_key) => {
            log::info!("Publishing readings to ThingSpeak");

            Ok(Box::new(thingspeak::ThingSpeak::new(
                &config.publish.thingspeak_url,
                api_key,
            )?))
        }
        None => {
            log::warn!("ThingSpeak API key not set (env THINGSPEAK_API_KEY), readings are not sent");

            Ok(Box::new(LogPublisher))
        }
    }
}

async fn daemonize(config: &config::CsimConfig) -> anyhow::Result<()> {
    let catalog = CodeCatalog::load(&config.codes.catalog)?;

    let mut describer = ChainDescriber::new();
    if let Some(path) = &config.codes.descriptions {
        describer = describer.with(CsvDescriber::load(path)?);
    }
    describer = describer.with(HeuristicDescriber);

    let runtime = autosim::runtime::builder(&config.sim)?
        .with_shutdown()
        .with_describer(describer)
        .build();

    let mut simulator = runtime.simulator(catalog.into())?;

    let publisher = publisher(config).await?;

    log::info!("Starting trip simulation");

    let report = runtime.run_trip(&mut simulator, publisher).await;

    log::info!("{}", report);
    log::info!("Trip summary:\n{}", report.summary);

    Ok(())
}
