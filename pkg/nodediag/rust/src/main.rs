// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::Result;
use clap::Parser;
use dd_nodediag::action::Action;
use dd_nodediag::config::{DEFAULT_CONFIG_PATH, default_node_name, load_config};
use dd_nodediag::export::{Exporter, run_id};
use dd_nodediag::scheduler::ActionRunner;
use dd_nodediag::shutdown::{shutdown_channel, termination};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Parser)]
#[command(name = "dd-nodediagd", version, about = "Node diagnostic agent")]
struct Args {
    /// Path to the agent configuration file.
    #[arg(long, short, env = "DD_NODEDIAG_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_config(&args.config)?.validate(default_node_name())?;

    let level = settings.log_level.parse::<log::Level>();
    simple_logger::init_with_level(*level.as_ref().unwrap_or(&log::Level::Info))?;
    if level.is_err() {
        warn!("unknown log_level {:?}, using info", settings.log_level);
    }

    info!(
        "dd-nodediagd starting (version {})",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "loaded {} action(s) from {}",
        settings.actions.len(),
        args.config.display()
    );

    let run_id = run_id(OffsetDateTime::now_utc());
    let exporter = Arc::new(Exporter::from_settings(
        &settings.exporter,
        &settings.node_name,
        &run_id,
    )?);

    let terminated = termination()?;
    let (trigger, signal) = shutdown_channel();
    let mut runners = Vec::with_capacity(settings.actions.len());
    for action_settings in &settings.actions {
        let action =
            Action::create(action_settings, &settings.output_dir, Arc::clone(&exporter)).await?;
        let runner = ActionRunner::new(action, action_settings.schedule);
        runners.push(tokio::spawn(runner.run(signal.clone())));
    }
    drop(signal);

    terminated.await;
    trigger.trigger();

    for runner in runners {
        if let Err(e) = runner.await {
            error!("action task failed: {e}");
        }
    }

    info!("dd-nodediagd shutting down");
    Ok(())
}
