// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

mod command;
mod connectivity;
mod dns;

pub use command::CommandCollector;
pub use connectivity::{ConnectivityCollector, probe};
pub use dns::{DnsCollector, ResolverSummary, parse_resolv_conf};

use crate::config::CollectorConfig;
use crate::export::DataArtifact;
use crate::sample::Sample;
use anyhow::{Result, bail};
use std::time::Duration;

/// What one collect call produced. A collector may partially succeed:
/// whatever it gathered is kept and `errors` lists what failed.
#[derive(Debug, Default)]
pub struct Collection {
    /// Failure samples to append to the action's sample log.
    pub samples: Vec<Sample>,
    /// Snapshots that replace the previous ones on disk.
    pub artifacts: Vec<DataArtifact>,
    pub errors: Vec<String>,
}

impl Collection {
    /// Every collect error joined into one, if any.
    pub fn check(&self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        bail!("{}", self.errors.join("; "))
    }
}

pub enum Collector {
    Connectivity(ConnectivityCollector),
    Dns(DnsCollector),
    Command(CommandCollector),
}

impl Collector {
    pub fn from_config(config: &CollectorConfig) -> Self {
        match config {
            CollectorConfig::Connectivity {
                targets,
                dial_timeout_seconds,
            } => Collector::Connectivity(ConnectivityCollector::new(
                targets.clone(),
                Duration::from_secs(*dial_timeout_seconds),
            )),
            CollectorConfig::Dns { resolv_conf } => {
                Collector::Dns(DnsCollector::new(resolv_conf.clone()))
            }
            CollectorConfig::Command { commands } => {
                Collector::Command(CommandCollector::new(commands.clone()))
            }
        }
    }

    /// Only sample-producing collectors have anything to aggregate.
    pub fn produces_samples(&self) -> bool {
        matches!(self, Collector::Connectivity(_))
    }

    pub async fn collect(&self) -> Collection {
        match self {
            Collector::Connectivity(c) => c.collect().await,
            Collector::Dns(c) => c.collect().await,
            Collector::Command(c) => c.collect().await,
        }
    }
}
