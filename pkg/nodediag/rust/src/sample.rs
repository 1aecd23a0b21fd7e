// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;

/// Outcome of one observation. Failures compare by their exact error text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Connected,
    Failed(String),
}

impl Status {
    pub fn error(&self) -> Option<&str> {
        match self {
            Status::Connected => None,
            Status::Failed(e) => Some(e),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Connected => write!(f, "connected"),
            Status::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub signal_type: String,
    pub endpoint: String,
    pub timestamp: OffsetDateTime,
    pub status: Status,
}

impl Sample {
    pub fn new(
        signal_type: impl Into<String>,
        endpoint: impl Into<String>,
        timestamp: OffsetDateTime,
        status: Status,
    ) -> Self {
        Self {
            signal_type: signal_type.into(),
            endpoint: endpoint.into(),
            timestamp: truncate_to_second(timestamp),
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }
}

/// Drop the sub-second part; every comparison downstream is second-granular.
pub fn truncate_to_second(t: OffsetDateTime) -> OffsetDateTime {
    t - time::Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// One line of the sample log.
#[derive(Debug, Serialize, Deserialize)]
struct SampleRecord {
    #[serde(rename = "Type")]
    signal_type: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "TimeStamp", with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(rename = "Connected")]
    connected: bool,
    #[serde(rename = "Error", default)]
    error: String,
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            signal_type: sample.signal_type.clone(),
            url: sample.endpoint.clone(),
            timestamp: truncate_to_second(sample.timestamp),
            connected: sample.status == Status::Connected,
            error: sample.status.error().unwrap_or_default().to_string(),
        }
    }
}

impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        let status = if record.connected {
            Status::Connected
        } else {
            Status::Failed(record.error)
        };
        Sample::new(record.signal_type, record.url, record.timestamp, status)
    }
}

pub fn encode_sample(sample: &Sample) -> Result<String> {
    serde_json::to_string(&SampleRecord::from(sample)).context("encoding sample record")
}

/// Parse newline-delimited sample records. Lines that do not parse are
/// logged and skipped.
pub fn parse_samples(contents: &str) -> Vec<Sample> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(
            |(idx, line)| match serde_json::from_str::<SampleRecord>(line) {
                Ok(record) => Some(Sample::from(record)),
                Err(e) => {
                    warn!("skipping malformed sample on line {}: {e}", idx + 1);
                    None
                }
            },
        )
        .collect()
}

/// Append-only sample log backed by one file.
#[derive(Debug, Clone)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn append(&self, samples: &[Sample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let mut buf = String::new();
        for sample in samples {
            buf.push_str(&encode_sample(sample)?);
            buf.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(buf.as_bytes())
            .await
            .with_context(|| format!("appending to {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }

    /// Read every sample recorded so far. A log that was never written is empty.
    pub async fn read(&self) -> Result<Vec<Sample>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(parse_samples(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }
}
