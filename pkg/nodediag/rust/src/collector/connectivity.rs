// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::Collection;
use crate::config::TargetConfig;
use crate::sample::{Sample, Status};
use log::{debug, warn};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub const DIAL_TIMEOUT_ERROR: &str = "dial timeout";

/// Dials every target once per collect and keeps only the failures.
pub struct ConnectivityCollector {
    targets: Vec<TargetConfig>,
    dial_timeout: Duration,
}

/// Attempt one TCP connection. The error text is kept verbatim since it is
/// what later separates one failure run from another.
pub async fn probe(target: &TargetConfig, dial_timeout: Duration, at: OffsetDateTime) -> Sample {
    let status = match timeout(dial_timeout, TcpStream::connect(&target.url)).await {
        Ok(Ok(_stream)) => Status::Connected,
        Ok(Err(e)) => Status::Failed(e.to_string()),
        Err(_) => Status::Failed(DIAL_TIMEOUT_ERROR.to_string()),
    };
    Sample::new(&target.signal_type, &target.url, at, status)
}

impl ConnectivityCollector {
    pub fn new(targets: Vec<TargetConfig>, dial_timeout: Duration) -> Self {
        Self {
            targets,
            dial_timeout,
        }
    }

    pub async fn collect(&self) -> Collection {
        let at = OffsetDateTime::now_utc();
        let mut probes = JoinSet::new();
        for (idx, target) in self.targets.iter().cloned().enumerate() {
            let dial_timeout = self.dial_timeout;
            probes.spawn(async move { (idx, probe(&target, dial_timeout, at).await) });
        }

        let mut results = Vec::with_capacity(self.targets.len());
        let mut errors = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => errors.push(format!("probe task failed: {e}")),
            }
        }
        results.sort_by_key(|(idx, _)| *idx);

        let samples: Vec<Sample> = results
            .into_iter()
            .map(|(_, sample)| sample)
            .inspect(|sample| match &sample.status {
                Status::Connected => debug!("{} ({}) reachable", sample.signal_type, sample.endpoint),
                Status::Failed(e) => warn!(
                    "{} ({}) unreachable: {e}",
                    sample.signal_type, sample.endpoint
                ),
            })
            .filter(Sample::is_failure)
            .collect();

        Collection {
            samples,
            artifacts: Vec::new(),
            errors,
        }
    }
}
