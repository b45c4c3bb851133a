// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serp_hub::{
    cfg::{
        cli::{Cli, Command, resolve_config_path},
        config::HubConfig,
        daemon,
        logger::init_logger,
    },
    hub::server::HubServer,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(&cli.config)
        .with_context(|| format!("failed to resolve config path {:?}", cli.config))?;
    let cfg = HubConfig::load_from_file(&config_path)
        .with_context(|| format!("failed to load hub config from {config_path:?}"))?;

    match cli.command {
        Command::Terminate => daemon::terminate(Path::new(&cfg.daemon.pid_file)),
        Command::Start { foreground } => {
            let pid_path = Path::new(&cfg.daemon.pid_file);
            if let Some(pid) = daemon::running_pid(pid_path) {
                info!(%pid, "server is already running, not starting a second instance");
                return Ok(());
            }

            // Forking (via `daemonize`) must happen before the async runtime
            // is created: a multi-threaded tokio runtime does not survive a
            // `fork()`, the same reason the original double-forks in
            // `startServer` ahead of its own event loop.
            if foreground {
                daemon::write_pid(
                    Path::new(&cfg.daemon.pid_file),
                    std::process::id() as i32,
                )?;
            } else {
                daemon::daemonize(
                    Path::new(&cfg.daemon.pid_file),
                    Path::new(&cfg.daemon.log_file),
                )?;
            }

            let _logger_guard = init_logger(&cli.logging_config.to_string_lossy())
                .context("failed to initialize logger")?;

            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(run(cfg))
        },
    }
}

async fn run(cfg: HubConfig) -> Result<()> {
    let addr = cfg.socket_addr()?;
    let server = HubServer::bind(addr, &cfg).await?;

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            shutdown_signal.cancel();
        }
    });

    server.run(shutdown).await
}
