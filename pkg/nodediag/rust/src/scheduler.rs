// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Drives one action on its own timer.
//!
//! Every tick runs collect, then process and export when the tick counter is
//! a multiple of their cadence. The cycle sits behind a mutex; a tick that
//! cannot take the lock because the previous cycle is still in flight is
//! dropped and does not advance the counter.

use crate::schedule::Schedule;
use crate::shutdown::ShutdownSignal;
use crate::state::ActionState;
use anyhow::Result;
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The three steps an action performs.
pub trait Steps: Send + 'static {
    fn name(&self) -> &str;
    fn collect(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn process(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn export(&mut self) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub tick: u64,
    /// Process step ran this tick.
    pub processed: bool,
    /// Export step ran this tick.
    pub exported: bool,
    /// Steps that returned an error.
    pub failures: u32,
}

/// One action's steps plus the tick counter they are sequenced by.
pub struct ActionCycle<S> {
    name: String,
    steps: S,
    schedule: Schedule,
    tick: u64,
    state: ActionState,
}

impl<S: Steps> ActionCycle<S> {
    pub fn new(steps: S, schedule: Schedule) -> Self {
        Self {
            name: steps.name().to_string(),
            steps,
            schedule,
            tick: 0,
            state: ActionState::Idle,
        }
    }

    /// Number of completed cycles.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn steps(&self) -> &S {
        &self.steps
    }

    fn transition(&mut self, next: ActionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {next}",
            self.state
        );
        debug!("[{}] {} -> {next}", self.name, self.state);
        self.state = next;
    }

    /// Run collect, then process and export if due. Step failures are
    /// logged and never stop the cycle.
    pub async fn run_once(&mut self) -> CycleReport {
        let tick = self.tick;
        let mut report = CycleReport {
            tick,
            processed: false,
            exported: false,
            failures: 0,
        };

        self.transition(ActionState::Collecting);
        if let Err(e) = self.steps.collect().await {
            warn!("[{}] collect failed (tick {tick}): {e:#}", self.name);
            report.failures += 1;
        }

        if self.schedule.process_due(tick) {
            self.transition(ActionState::Processing);
            report.processed = true;
            if let Err(e) = self.steps.process().await {
                warn!("[{}] process failed (tick {tick}): {e:#}", self.name);
                report.failures += 1;
            }
        }

        if self.schedule.export_due(tick) {
            self.transition(ActionState::Exporting);
            report.exported = true;
            if let Err(e) = self.steps.export().await {
                warn!("[{}] export failed (tick {tick}): {e:#}", self.name);
                report.failures += 1;
            }
        }

        self.transition(ActionState::Idle);
        self.tick += 1;
        report
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub started: u64,
    pub dropped: u64,
    pub completed: u64,
}

pub struct ActionRunner<S> {
    name: String,
    schedule: Schedule,
    cycle: Arc<Mutex<ActionCycle<S>>>,
}

impl<S: Steps> ActionRunner<S> {
    pub fn new(steps: S, schedule: Schedule) -> Self {
        Self {
            name: steps.name().to_string(),
            schedule,
            cycle: Arc::new(Mutex::new(ActionCycle::new(steps, schedule))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tick until shutdown, then wait for the cycle in flight to finish.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> RunSummary {
        let mut ticker = tokio::time::interval(self.schedule.collect_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "[{}] scheduled every {}s",
            self.name,
            self.schedule.collect_interval_seconds()
        );

        let mut summary = RunSummary::default();
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let Ok(mut cycle) = Arc::clone(&self.cycle).try_lock_owned() else {
                        summary.dropped += 1;
                        debug!("[{}] previous cycle still running, dropping tick", self.name);
                        continue;
                    };
                    summary.started += 1;
                    in_flight = Some(tokio::spawn(async move {
                        cycle.run_once().await;
                    }));
                }
            }
        }

        if let Some(handle) = in_flight
            && let Err(e) = handle.await
        {
            error!("[{}] cycle task failed: {e}", self.name);
        }
        summary.completed = self.cycle.lock().await.ticks();

        info!(
            "[{}] stopped (started={}, dropped={}, completed={})",
            self.name, summary.started, summary.dropped, summary.completed
        );
        summary
    }
}
