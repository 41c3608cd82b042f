//! `minisip`: place one call from a caller to a callee over the in-process
//! loopback network and print every message that crossed it.

mod logging;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use minisip_dialog_core::{Endpoint, Identity, LoopbackManager, LoopbackNetwork};

use crate::logging::{LoggingConfig, parse_log_level, setup_logging};
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "minisip", version, about = "Run an INVITE / ACK / BYE call between two in-process SIP endpoints")]
struct Args {
    /// TOML file with caller, callee, hold and loopback sections
    #[arg(short, long, env = "MINISIP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Include source locations in log lines
    #[arg(long)]
    log_file_info: bool,

    /// Milliseconds between the ACK and the BYE
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Milliseconds the callee waits before answering and the caller waits before its ACK
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print the message trace as JSON
    #[arg(long)]
    trace_json: bool,
}

impl Args {
    fn logging(&self) -> Result<LoggingConfig> {
        let mut config = LoggingConfig::new(parse_log_level(&self.log_level)?);
        if self.log_json {
            config = config.with_json();
        }
        if self.log_file_info {
            config = config.with_file_info();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.logging()?)?;

    let settings = Settings::load(args.config.as_deref())?
        .with_hold_ms(args.hold_ms)
        .with_delay_ms(args.delay_ms)
        .finish()?;

    let network = LoopbackNetwork::with_settings(settings.loopback.clone());
    let outcome = run_call(&network, &settings).await;

    if args.trace_json {
        println!("{}", network.trace_json().context("failed to serialize trace")?);
    } else {
        for entry in network.trace() {
            println!("{entry}");
        }
    }

    let served = outcome?;
    info!("Call finished, callee completed {} transactions", served);
    Ok(())
}

/// INVITE, hold, BYE. The callee is always shut down before returning.
async fn run_call(network: &LoopbackNetwork, settings: &Settings) -> Result<usize> {
    let mut callee = Endpoint::<LoopbackManager>::new(settings.callee.clone())?;
    callee.start(network).await.context("failed to start callee")?;
    let callee_address = callee.identity().address();
    let callee_identity = callee.identity().clone();
    let serving = tokio::spawn(async move { callee.serve().await });

    let mut caller = Endpoint::<LoopbackManager>::new(settings.caller.clone())?;
    let placed = place_call(&mut caller, network, settings, &callee_identity).await;

    // Single-call mode ends serve() after the BYE; on failure close its stream instead.
    if placed.is_err() {
        network.unbind(&callee_address);
    }
    let served = serving.await.context("callee task failed")?;

    placed?;
    Ok(served?)
}

async fn place_call(
    caller: &mut Endpoint<LoopbackManager>,
    network: &LoopbackNetwork,
    settings: &Settings,
    callee: &Identity,
) -> Result<()> {
    caller.start(network).await.context("failed to start caller")?;

    let answer = caller.invite(callee).await.context("INVITE failed")?;
    info!("Call established: {}", answer.short());

    tokio::time::sleep(settings.hold.duration()).await;

    match caller.bye(callee).await {
        Ok(response) => {
            info!("Call ended: {}", response.short());
            Ok(())
        }
        Err(e) => {
            warn!("BYE failed: {}", e);
            Err(e).context("BYE failed")
        }
    }
}
