// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, net::SocketAddr, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::wire::codec::DEFAULT_MAX_MESSAGE_LEN;

/// Top-level hub configuration, loaded from YAML (§6 "External Interfaces").
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct HubConfig {
    /// The port/interface SERP traffic multiplexes on.
    pub listen: ListenConfig,
    /// Runtime knobs that do not travel over the wire.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Where the daemon's PID and log files live.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ListenConfig {
    #[serde(rename = "Host", default = "default_host")]
    pub host: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on a message's `length` field; guards against a corrupt
    /// or hostile header claiming an implausible payload size.
    #[serde(rename = "MaxMessageLen", default = "default_max_message_len")]
    pub max_message_len: u32,

    /// The original refuses a new connection whose peer address matches an
    /// existing session. Exposed as a policy toggle rather than a hard
    /// rule per the design notes' critique of address-based dedup.
    #[serde(rename = "RejectDuplicateAddresses", default)]
    pub reject_duplicate_addresses: bool,
}

fn default_max_message_len() -> u32 {
    DEFAULT_MAX_MESSAGE_LEN
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_message_len: default_max_message_len(),
            reject_duplicate_addresses: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DaemonConfig {
    #[serde(rename = "PidFile", default = "default_pid_file")]
    pub pid_file: String,
    #[serde(rename = "LogFile", default = "default_log_file")]
    pub log_file: String,
}

fn default_pid_file() -> String {
    "logs/pid.txt".to_string()
}

fn default_log_file() -> String {
    "logs/log.txt".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            log_file: default_log_file(),
        }
    }
}

impl HubConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: HubConfig =
            serde_yaml::from_str(&s).context("failed to parse hub config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(self.listen.port != 0, "listen Port must be nonzero");
        ensure!(
            self.runtime.max_message_len > 0,
            "MaxMessageLen must be > 0"
        );
        ensure!(!self.daemon.pid_file.is_empty(), "PidFile must not be empty");
        ensure!(!self.daemon.log_file.is_empty(), "LogFile must not be empty");
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.listen.host, self.listen.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid listen address {}:{}",
                    self.listen.host, self.listen.port
                )
            })
    }
}
