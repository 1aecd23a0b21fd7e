// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::num::NonZeroU64;
use std::time::Duration;

/// Cadence of one action: collect on every tick, process and export on
/// multiples of the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    collect_interval: NonZeroU64,
    process_every: NonZeroU64,
    export_every: NonZeroU64,
}

impl Schedule {
    pub fn new(
        collect_interval_seconds: NonZeroU64,
        process_every_n_collects: NonZeroU64,
        export_every_n_collects: NonZeroU64,
    ) -> Self {
        Self {
            collect_interval: collect_interval_seconds,
            process_every: process_every_n_collects,
            export_every: export_every_n_collects,
        }
    }

    /// Schedule that processes and exports on every collect.
    pub fn every_tick(collect_interval_seconds: NonZeroU64) -> Self {
        Self::new(collect_interval_seconds, NonZeroU64::MIN, NonZeroU64::MIN)
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(self.collect_interval.get())
    }

    /// Merge threshold for the aggregator, in whole seconds.
    pub fn collect_interval_seconds(&self) -> u64 {
        self.collect_interval.get()
    }

    /// Tick 0 is always due, so the first collect is immediately processed.
    pub fn process_due(&self, tick: u64) -> bool {
        tick % self.process_every.get() == 0
    }

    pub fn export_due(&self, tick: u64) -> bool {
        tick % self.export_every.get() == 0
    }
}
