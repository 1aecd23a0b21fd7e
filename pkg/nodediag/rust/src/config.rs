// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::action::{DIAGNOSTIC_FILE, SAMPLE_LOG_FILE};
use crate::schedule::Schedule;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/datadog-agent/nodediag.yaml";
const DEFAULT_OUTPUT_DIR: &str = "/var/run/datadog-agent/nodediag";
const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";
const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 5;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_every() -> u64 {
    1
}

fn default_dial_timeout() -> u64 {
    DEFAULT_DIAL_TIMEOUT_SECS
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from(DEFAULT_RESOLV_CONF)
}

/// Raw configuration file. Mandatory values are optional here so that
/// [`AgentConfig::validate`] can report every missing one at once.
#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub node_name: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub exporter: Option<ExporterConfig>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExporterConfig {
    Local {
        path: Option<PathBuf>,
    },
    Http {
        url: Option<String>,
        container: Option<String>,
        sas_token: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub name: String,
    pub collect_interval_seconds: Option<u64>,
    #[serde(default = "default_every")]
    pub process_every_n_collects: u64,
    #[serde(default = "default_every")]
    pub export_every_n_collects: u64,
    pub collector: Option<CollectorConfig>,
}

/// Every supported collector kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectorConfig {
    Connectivity {
        #[serde(default)]
        targets: Vec<TargetConfig>,
        #[serde(default = "default_dial_timeout")]
        dial_timeout_seconds: u64,
    },
    Dns {
        #[serde(default = "default_resolv_conf")]
        resolv_conf: PathBuf,
    },
    Command {
        #[serde(default)]
        commands: Vec<CommandConfig>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    #[serde(rename = "type")]
    pub signal_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Every problem found while validating the configuration.
#[derive(Debug, Error)]
#[error("invalid configuration ({} problem(s)):\n{}", .problems.len(), render(.problems))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

fn render(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validated configuration the agent runs with.
#[derive(Debug)]
pub struct Settings {
    pub log_level: String,
    pub node_name: String,
    pub output_dir: PathBuf,
    pub exporter: ExporterSettings,
    pub actions: Vec<ActionSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterSettings {
    Local {
        path: PathBuf,
    },
    Http {
        url: String,
        container: String,
        sas_token: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ActionSettings {
    pub name: String,
    pub schedule: Schedule,
    pub collector: CollectorConfig,
}

pub fn load_config(path: &Path) -> Result<AgentConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AgentConfig =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Node name when the config file does not set one: `NODE_NAME`, then the
/// host name.
pub fn default_node_name() -> Option<String> {
    std::env::var("NODE_NAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive(value: u64, field: &str, action: &str, problems: &mut Vec<String>) -> NonZeroU64 {
    NonZeroU64::new(value).unwrap_or_else(|| {
        problems.push(format!("action {action:?}: {field} must be positive"));
        NonZeroU64::MIN
    })
}

/// Action and command names become file names in the output directory.
fn is_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.ends_with(".tmp")
}

fn is_host_port(url: &str) -> bool {
    url.rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}

impl AgentConfig {
    pub fn validate(self, fallback_node_name: Option<String>) -> Result<Settings, ConfigError> {
        let mut problems = Vec::new();

        let node_name = self
            .node_name
            .filter(|n| !n.trim().is_empty())
            .or(fallback_node_name)
            .unwrap_or_else(|| {
                problems.push("node_name is not set and NODE_NAME is empty".to_string());
                String::new()
            });

        let exporter = match self.exporter {
            None => {
                problems.push("exporter is not configured".to_string());
                None
            }
            Some(ExporterConfig::Local { path }) => match path {
                Some(path) => Some(ExporterSettings::Local { path }),
                None => {
                    problems.push("exporter.path is required for the local exporter".to_string());
                    None
                }
            },
            Some(ExporterConfig::Http {
                url,
                container,
                sas_token,
            }) => {
                if url.is_none() {
                    problems.push("exporter.url is required for the http exporter".to_string());
                }
                if container.is_none() {
                    problems
                        .push("exporter.container is required for the http exporter".to_string());
                }
                match (url, container) {
                    (Some(url), Some(container)) => Some(ExporterSettings::Http {
                        url: url.trim_end_matches('/').to_string(),
                        container,
                        sas_token: sas_token.filter(|t| !t.is_empty()),
                    }),
                    _ => None,
                }
            }
        };

        if self.actions.is_empty() {
            problems.push("no actions configured".to_string());
        }

        let mut seen = HashSet::new();
        let mut actions = Vec::with_capacity(self.actions.len());
        for (idx, action) in self.actions.into_iter().enumerate() {
            let name = if action.name.trim().is_empty() {
                problems.push(format!("action #{idx}: name is required"));
                format!("#{idx}")
            } else {
                if !is_file_name(&action.name) {
                    problems.push(format!(
                        "action {:?}: name must be a plain file name",
                        action.name
                    ));
                }
                action.name
            };
            if !seen.insert(name.clone()) {
                problems.push(format!("action {name:?}: duplicate name"));
            }

            let interval = match action.collect_interval_seconds {
                Some(secs) => positive(secs, "collect_interval_seconds", &name, &mut problems),
                None => {
                    problems.push(format!(
                        "action {name:?}: collect_interval_seconds is required"
                    ));
                    NonZeroU64::MIN
                }
            };
            let process_every = positive(
                action.process_every_n_collects,
                "process_every_n_collects",
                &name,
                &mut problems,
            );
            let export_every = positive(
                action.export_every_n_collects,
                "export_every_n_collects",
                &name,
                &mut problems,
            );

            let Some(collector) = action.collector else {
                problems.push(format!("action {name:?}: collector is required"));
                continue;
            };
            match &collector {
                CollectorConfig::Connectivity {
                    targets,
                    dial_timeout_seconds,
                } => {
                    if targets.is_empty() {
                        problems.push(format!("action {name:?}: no connectivity targets"));
                    }
                    let mut types = HashSet::new();
                    for target in targets {
                        if !types.insert(target.signal_type.as_str()) {
                            problems.push(format!(
                                "action {name:?}: duplicate target type {:?}",
                                target.signal_type
                            ));
                        }
                        if !is_host_port(&target.url) {
                            problems.push(format!(
                                "action {name:?}: target {:?} is not host:port",
                                target.url
                            ));
                        }
                    }
                    if *dial_timeout_seconds == 0 {
                        problems.push(format!(
                            "action {name:?}: dial_timeout_seconds must be positive"
                        ));
                    }
                }
                CollectorConfig::Command { commands } => {
                    if commands.is_empty() {
                        problems.push(format!("action {name:?}: no commands"));
                    }
                    let mut names = HashSet::new();
                    for cmd in commands {
                        if !names.insert(cmd.name.as_str()) {
                            problems.push(format!(
                                "action {name:?}: duplicate command name {:?}",
                                cmd.name
                            ));
                        }
                        let reserved = cmd.name == SAMPLE_LOG_FILE || cmd.name == DIAGNOSTIC_FILE;
                        if reserved || !is_file_name(&cmd.name) {
                            problems.push(format!(
                                "action {name:?}: command name {:?} is not usable as a file name",
                                cmd.name
                            ));
                        }
                    }
                }
                CollectorConfig::Dns { .. } => {}
            }

            actions.push(ActionSettings {
                name,
                schedule: Schedule::new(interval, process_every, export_every),
                collector,
            });
        }

        match exporter {
            Some(exporter) if problems.is_empty() => Ok(Settings {
                log_level: self.log_level,
                node_name,
                output_dir: self.output_dir,
                exporter,
                actions,
            }),
            _ => Err(ConfigError { problems }),
        }
    }
}
