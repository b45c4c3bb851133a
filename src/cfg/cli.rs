// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// `serp-hub start|terminate` — the CLI and operational surface (§6).
#[derive(Parser, Debug)]
#[command(name = "serp-hub", about = "SERP relay hub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the hub's YAML config.
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Path to the YAML logger config.
    #[arg(long, global = true, default_value = "logging.yaml")]
    pub logging_config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the hub, optionally detaching into a background daemon.
    Start {
        /// Stay attached to the current terminal instead of forking.
        #[arg(long)]
        foreground: bool,
    },
    /// Signal a running daemon to stop and reset its PID file.
    Terminate,
}

pub fn resolve_config_path(rel: impl AsRef<Path>) -> Result<PathBuf> {
    let p = rel.as_ref();

    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot get current working dir")?
            .join(p)
    };

    let canon = abs
        .canonicalize()
        .with_context(|| format!("failed to canonicalize path {abs:?}"))?;

    Ok(canon)
}
