// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Merges a time-ordered sample log into maximal same-status intervals.
//!
//! Successes are usually not logged, so a hole in the log longer than the
//! collect interval is read as "something else happened in between" and
//! splits the run even when the status on both sides is identical.

use crate::sample::{Sample, Status};
use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticInterval {
    pub signal_type: String,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub status: Status,
}

impl DiagnosticInterval {
    fn open(sample: &Sample) -> Self {
        Self {
            signal_type: sample.signal_type.clone(),
            start: sample.timestamp,
            end: sample.timestamp,
            status: sample.status.clone(),
        }
    }

    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Aggregate the samples of a single signal. `samples` are expected in
/// ascending timestamp order; a gap of exactly `threshold_seconds` is still
/// continuous. A sample older than the open run (wall clock stepped back)
/// starts a new run.
pub fn aggregate(samples: &[Sample], threshold_seconds: u64) -> Vec<DiagnosticInterval> {
    let threshold = i64::try_from(threshold_seconds).unwrap_or(i64::MAX);
    let mut intervals = Vec::new();
    let mut current: Option<DiagnosticInterval> = None;

    for sample in samples {
        current = Some(match current.take() {
            None => DiagnosticInterval::open(sample),
            Some(run) if run.status != sample.status => {
                intervals.push(run);
                DiagnosticInterval::open(sample)
            }
            Some(run)
                if sample.timestamp < run.end
                    || (sample.timestamp - run.end).whole_seconds() > threshold =>
            {
                intervals.push(run);
                DiagnosticInterval::open(sample)
            }
            Some(mut run) => {
                run.end = sample.timestamp;
                run
            }
        });
    }

    intervals.extend(current);
    intervals
}

/// Split a mixed log into signals, one per `(type, endpoint)` pair in order
/// of first appearance, and aggregate each signal independently.
pub fn aggregate_by_signal(samples: &[Sample], threshold_seconds: u64) -> Vec<DiagnosticInterval> {
    let mut signals: Vec<((&str, &str), Vec<Sample>)> = Vec::new();
    for sample in samples {
        let key = (sample.signal_type.as_str(), sample.endpoint.as_str());
        match signals.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket)) => bucket.push(sample.clone()),
            None => signals.push((key, vec![sample.clone()])),
        }
    }

    signals
        .iter()
        .flat_map(|(_, bucket)| aggregate(bucket, threshold_seconds))
        .collect()
}

#[derive(Debug, Serialize)]
struct DiagnosticRecord<'a> {
    #[serde(rename = "Type")]
    signal_type: &'a str,
    #[serde(rename = "Start", with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(rename = "End", with = "time::serde::rfc3339")]
    end: OffsetDateTime,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Render intervals as newline-delimited JSON.
pub fn encode_diagnostics(intervals: &[DiagnosticInterval]) -> Result<String> {
    let mut out = String::new();
    for interval in intervals {
        let record = DiagnosticRecord {
            signal_type: &interval.signal_type,
            start: interval.start,
            end: interval.end,
            error: interval.status.error(),
        };
        out.push_str(&serde_json::to_string(&record).context("encoding diagnostic record")?);
        out.push('\n');
    }
    Ok(out)
}
