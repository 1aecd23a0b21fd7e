// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::Collection;
use crate::config::CommandConfig;
use crate::export::DataArtifact;
use log::debug;
use std::process::Stdio;
use tokio::process::Command;

/// Runs shell tools (`iptables`, `journalctl`, `docker ps`, ...) and
/// publishes their stdout, one artifact per command.
pub struct CommandCollector {
    commands: Vec<CommandConfig>,
}

impl CommandCollector {
    pub fn new(commands: Vec<CommandConfig>) -> Self {
        Self { commands }
    }

    pub async fn collect(&self) -> Collection {
        let mut collection = Collection::default();
        for cmd in &self.commands {
            debug!("running {} {}", cmd.program, cmd.args.join(" "));
            let output = Command::new(&cmd.program)
                .args(&cmd.args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await;

            match output {
                Ok(out) if out.status.success() => {
                    collection
                        .artifacts
                        .push(DataArtifact::new(cmd.name.clone(), out.stdout));
                }
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    collection.errors.push(format!(
                        "{}: {} ({})",
                        cmd.name,
                        out.status,
                        stderr.trim()
                    ));
                }
                Err(e) => collection
                    .errors
                    .push(format!("{}: failed to run {}: {e}", cmd.name, cmd.program)),
            }
        }
        collection
    }
}
