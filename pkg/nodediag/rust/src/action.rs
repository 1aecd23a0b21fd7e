// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::aggregate::{aggregate_by_signal, encode_diagnostics};
use crate::collector::Collector;
use crate::config::ActionSettings;
use crate::export::{DataArtifact, Exporter};
use crate::sample::SampleLog;
use crate::scheduler::Steps;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SAMPLE_LOG_FILE: &str = "samples.json";
pub const DIAGNOSTIC_FILE: &str = "diagnostic.json";
const TMP_SUFFIX: &str = ".tmp";

/// A configured collector wired to its own output directory and the
/// shared exporter.
pub struct Action {
    name: String,
    dir: PathBuf,
    collector: Collector,
    samples: SampleLog,
    threshold_seconds: u64,
    exporter: Arc<Exporter>,
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TMP_SUFFIX);
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

impl Action {
    /// Build the action and create its directory under `output_dir`.
    pub async fn create(
        settings: &ActionSettings,
        output_dir: &Path,
        exporter: Arc<Exporter>,
    ) -> Result<Self> {
        let dir = output_dir.join(&settings.name);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        Ok(Self {
            name: settings.name.clone(),
            samples: SampleLog::new(dir.join(SAMPLE_LOG_FILE)),
            dir,
            collector: Collector::from_config(&settings.collector),
            threshold_seconds: settings.schedule.collect_interval_seconds(),
            exporter,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every finished file in the action directory, named `<action>/<file>`.
    async fn artifacts(&self) -> Result<Vec<DataArtifact>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("listing {}", self.dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.ends_with(TMP_SUFFIX) || !entry.file_type().await?.is_file() {
                continue;
            }
            files.push((file_name, entry.path()));
        }
        files.sort();

        let mut artifacts = Vec::with_capacity(files.len());
        for (file_name, path) in files {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            artifacts.push(DataArtifact::new(format!("{}/{file_name}", self.name), data));
        }
        Ok(artifacts)
    }
}

impl Steps for Action {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&mut self) -> Result<()> {
        let collection = self.collector.collect().await;

        self.samples.append(&collection.samples).await?;
        for artifact in &collection.artifacts {
            write_atomic(&self.dir.join(artifact.name()), artifact.data()).await?;
        }
        debug!(
            "[{}] collected {} failure sample(s), {} artifact(s)",
            self.name,
            collection.samples.len(),
            collection.artifacts.len()
        );
        collection.check()
    }

    async fn process(&mut self) -> Result<()> {
        if !self.collector.produces_samples() {
            return Ok(());
        }
        let samples = self.samples.read().await?;
        let intervals = aggregate_by_signal(&samples, self.threshold_seconds);
        let encoded = encode_diagnostics(&intervals)?;
        write_atomic(&self.dir.join(DIAGNOSTIC_FILE), encoded.as_bytes()).await?;
        info!(
            "[{}] aggregated {} sample(s) into {} interval(s)",
            self.name,
            samples.len(),
            intervals.len()
        );
        Ok(())
    }

    async fn export(&mut self) -> Result<()> {
        let artifacts = self.artifacts().await?;
        if artifacts.is_empty() {
            debug!("[{}] nothing to export", self.name);
            return Ok(());
        }
        self.exporter
            .export(&artifacts)
            .await
            .with_context(|| format!("[{}] export", self.name))?;
        info!("[{}] exported {} artifact(s)", self.name, artifacts.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectorConfig, CommandConfig, TargetConfig};
    use crate::export::LocalExporter;
    use crate::sample::{Sample, Status};
    use crate::schedule::Schedule;
    use std::num::NonZeroU64;
    use time::macros::datetime;

    fn settings(name: &str, collector: CollectorConfig) -> ActionSettings {
        ActionSettings {
            name: name.to_string(),
            schedule: Schedule::every_tick(NonZeroU64::new(5).unwrap()),
            collector,
        }
    }

    fn local_exporter(root: &Path) -> Arc<Exporter> {
        Arc::new(Exporter::Local(LocalExporter::new(root.to_path_buf())))
    }

    fn failed(secs: i64, error: &str) -> Sample {
        Sample::new(
            "Internet",
            "google.com:80",
            datetime!(2026-10-18 12:00:00 UTC) + time::Duration::seconds(secs),
            Status::Failed(error.to_string()),
        )
    }

    #[tokio::test]
    async fn test_process_writes_diagnostic_file() {
        let work = tempfile::tempdir().unwrap();
        let sink = tempfile::tempdir().unwrap();
        let collector = CollectorConfig::Connectivity {
            targets: vec![TargetConfig {
                signal_type: "Internet".into(),
                url: "google.com:80".into(),
            }],
            dial_timeout_seconds: 1,
        };
        let mut action = Action::create(
            &settings("outbound", collector),
            work.path(),
            local_exporter(sink.path()),
        )
        .await
        .unwrap();

        let log = SampleLog::new(action.dir().join(SAMPLE_LOG_FILE));
        log.append(&[
            failed(0, "dial timeout"),
            failed(5, "dial timeout"),
            failed(10, "dial timeout"),
            failed(20, "connection refused"),
        ])
        .await
        .unwrap();

        action.process().await.unwrap();

        let diagnostic =
            std::fs::read_to_string(action.dir().join(DIAGNOSTIC_FILE)).unwrap();
        assert_eq!(
            diagnostic.lines().collect::<Vec<_>>(),
            vec![
                r#"{"Type":"Internet","Start":"2026-10-18T12:00:00Z","End":"2026-10-18T12:00:10Z","Error":"dial timeout"}"#,
                r#"{"Type":"Internet","Start":"2026-10-18T12:00:20Z","End":"2026-10-18T12:00:20Z","Error":"connection refused"}"#,
            ]
        );

        action.export().await.unwrap();
        assert!(sink.path().join("outbound").join(DIAGNOSTIC_FILE).exists());
        assert!(sink.path().join("outbound").join(SAMPLE_LOG_FILE).exists());
    }

    #[tokio::test]
    async fn test_process_empty_log_writes_empty_file() {
        let work = tempfile::tempdir().unwrap();
        let sink = tempfile::tempdir().unwrap();
        let collector = CollectorConfig::Connectivity {
            targets: vec![],
            dial_timeout_seconds: 1,
        };
        let mut action = Action::create(
            &settings("outbound", collector),
            work.path(),
            local_exporter(sink.path()),
        )
        .await
        .unwrap();

        action.process().await.unwrap();
        let diagnostic = std::fs::read(action.dir().join(DIAGNOSTIC_FILE)).unwrap();
        assert!(diagnostic.is_empty());
    }

    #[tokio::test]
    async fn test_command_action_collects_and_exports() {
        let work = tempfile::tempdir().unwrap();
        let sink = tempfile::tempdir().unwrap();
        let collector = CollectorConfig::Command {
            commands: vec![
                CommandConfig {
                    name: "uname".into(),
                    program: "/bin/sh".into(),
                    args: vec!["-c".into(), "echo Linux".into()],
                },
                CommandConfig {
                    name: "broken".into(),
                    program: "/bin/sh".into(),
                    args: vec!["-c".into(), "exit 1".into()],
                },
            ],
        };
        let mut action = Action::create(
            &settings("system", collector),
            work.path(),
            local_exporter(sink.path()),
        )
        .await
        .unwrap();

        let err = action.collect().await.unwrap_err();
        assert!(err.to_string().contains("broken"));

        // Process is a no-op for snapshot collectors.
        action.process().await.unwrap();
        assert!(!action.dir().join(DIAGNOSTIC_FILE).exists());

        action.export().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(sink.path().join("system/uname")).unwrap(),
            "Linux\n"
        );
        assert!(!sink.path().join("system/broken").exists());
    }

    #[tokio::test]
    async fn test_export_with_nothing_collected() {
        let work = tempfile::tempdir().unwrap();
        let sink = tempfile::tempdir().unwrap();
        let mut action = Action::create(
            &settings(
                "dns",
                CollectorConfig::Dns {
                    resolv_conf: PathBuf::from("/nonexistent/resolv.conf"),
                },
            ),
            work.path(),
            local_exporter(sink.path()),
        )
        .await
        .unwrap();

        assert!(action.collect().await.is_err());
        action.export().await.unwrap();
        assert!(!sink.path().join("dns").exists());
    }
}
