#[path = "swap-service/cli.rs"]
mod cli;
#[path = "swap-service/modes/mod.rs"]
mod modes;
#[path = "swap-service/setup.rs"]
mod setup;

use crate::cli::Cli;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use swap_core::foundation::SwapError;
use swap_core::infrastructure::storage::SwapStorage;
use swap_service::api::run_json_rpc_server;
use swap_service::service::metrics::Metrics;
use swap_service::service::workers::{supervise, SupervisedTask};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse_args();
    setup::init_logging(args.log_dir.as_deref(), &args.log_level)?;
    args.apply_to_env();
    info!("swap-service starting log_level={} mode={}", args.log_level, args.mode.as_str());

    let app_config = setup::load_app_config(args.profile.as_deref())?;
    info!(
        "config loaded rpc_addr={} rpc_path={} fund_pool_mode={} udt={}",
        app_config.rpc.addr, app_config.rpc.path, app_config.fund_pool.mode, app_config.udt.name
    );

    if args.print_multisig_args {
        modes::multisig_args::print_multisig_args(&app_config)?;
        return Ok(());
    }
    if args.pool_status {
        let storage = setup::init_storage(&app_config)?;
        modes::pool_status::print_pool_status(&storage)?;
        return Ok(());
    }

    let metrics = Arc::new(Metrics::new()?);
    let components = setup::build(&app_config, args.mode, metrics.clone())?;
    let rpc_addr: SocketAddr =
        app_config.rpc.addr.parse().map_err(|err| SwapError::ConfigError(format!("invalid rpc.addr {}: {}", app_config.rpc.addr, err)))?;

    if let Some(storage) = components.state.storage.clone() {
        spawn_status_reporter(metrics.clone(), storage);
    }
    let mut tasks = components.tasks;
    tasks.push(SupervisedTask::spawn("rpc", Box::pin(run_json_rpc_server(rpc_addr, components.state))));
    info!("service running mode={} tasks={}", args.mode.as_str(), tasks.len());

    tokio::select! {
        err = supervise(tasks) => {
            error!("supervised task stopped; shutting down error={}", err);
            Err(err.into())
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| SwapError::Message(err.to_string()))?;
            info!("shutdown signal received");
            Ok(())
        }
    }
}

fn spawn_status_reporter(metrics: Arc<Metrics>, storage: Arc<dyn SwapStorage>) {
    tokio::spawn(async move {
        let interval_seconds = 300u64;
        info!("status reporter started interval_seconds={}", interval_seconds);
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            interval.tick().await;
            if let Ok(pools) = storage.pool_snapshot() {
                metrics.set_pool_sizes(&pools);
            }
            let snapshot = metrics.snapshot();
            info!(
                "periodic status report uptime_minutes={} swaps_initiated={} swaps_confirmed={} swaps_failed={} rollbacks={} rpc_ok={} rpc_error={}",
                snapshot.uptime.as_secs() / 60,
                snapshot.swaps_initiated,
                snapshot.swaps_confirmed,
                snapshot.swaps_failed,
                snapshot.rollbacks,
                snapshot.rpc_ok,
                snapshot.rpc_error
            );
        }
    });
}
