// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::info;
use std::future::Future;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

/// Broadcasts the shutdown request to every action loop.
pub struct ShutdownTrigger(watch::Sender<bool>);

/// Held by each action loop. Resolves once shutdown was requested or the
/// trigger is gone.
#[derive(Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

impl ShutdownSignal {
    pub async fn recv(&mut self) {
        // An error means the trigger was dropped, which is shutdown too.
        let _ = self.0.wait_for(|&stop| stop).await;
    }
}

/// Install the SIGTERM and SIGINT handlers. The returned future resolves
/// with the signal name once either arrives.
pub fn termination() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("received {name}");
        name
    })
}
