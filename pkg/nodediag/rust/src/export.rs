// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::ExporterSettings;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// A named output handed to the sink. Names are relative paths such as
/// `networkoutbound/diagnostic.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArtifact {
    name: String,
    data: Vec<u8>,
}

impl DataArtifact {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("artifact name {0:?} is not a relative path")]
    InvalidName(String),
    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("uploading {blob}: {source}")]
    Upload {
        blob: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("uploading {blob}: server returned {status}")]
    Rejected {
        blob: String,
        status: reqwest::StatusCode,
    },
}

/// Identifies one agent run in exported paths, e.g. `2026-10-18T12-00-05Z`.
pub fn run_id(started: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]Z");
    started
        .to_offset(time::UtcOffset::UTC)
        .format(fmt)
        .unwrap_or_else(|_| started.unix_timestamp().to_string())
}

fn relative_path(name: &str) -> Result<PathBuf, ExportError> {
    let path = Path::new(name);
    let valid = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(path.to_path_buf())
    } else {
        Err(ExportError::InvalidName(name.to_string()))
    }
}

/// Copies artifacts under `<path>/<node>/<run_id>/`.
pub struct LocalExporter {
    root: PathBuf,
}

impl LocalExporter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn export(&self, artifacts: &[DataArtifact]) -> Result<(), ExportError> {
        for artifact in artifacts {
            let path = self.root.join(relative_path(artifact.name())?);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ExportError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            tokio::fs::write(&path, artifact.data())
                .await
                .map_err(|source| ExportError::Write {
                    path: path.clone(),
                    source,
                })?;
            debug!("exported {}", path.display());
        }
        Ok(())
    }
}

/// Uploads each artifact as a block blob:
/// `PUT {url}/{container}/{node}/{run_id}/{artifact}[?sas]`.
pub struct HttpExporter {
    client: reqwest::Client,
    base: String,
    sas_token: Option<String>,
}

impl HttpExporter {
    pub fn new(
        url: &str,
        container: &str,
        prefix: &str,
        sas_token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            base: format!("{}/{container}/{prefix}", url.trim_end_matches('/')),
            sas_token: sas_token.map(|t| t.trim_start_matches('?').to_string()),
        })
    }

    pub fn blob_url(&self, name: &str) -> String {
        match &self.sas_token {
            Some(sas) => format!("{}/{name}?{sas}", self.base),
            None => format!("{}/{name}", self.base),
        }
    }

    async fn export(&self, artifacts: &[DataArtifact]) -> Result<(), ExportError> {
        for artifact in artifacts {
            relative_path(artifact.name())?;
            let response = self
                .client
                .put(self.blob_url(artifact.name()))
                .header("x-ms-blob-type", "BlockBlob")
                .body(artifact.data().to_vec())
                .send()
                .await
                .map_err(|source| ExportError::Upload {
                    blob: artifact.name().to_string(),
                    source,
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExportError::Rejected {
                    blob: artifact.name().to_string(),
                    status,
                });
            }
            debug!("uploaded {} ({status})", artifact.name());
        }
        Ok(())
    }
}

pub enum Exporter {
    Local(LocalExporter),
    Http(HttpExporter),
}

impl Exporter {
    pub fn from_settings(settings: &ExporterSettings, node_name: &str, run_id: &str) -> Result<Self> {
        let exporter = match settings {
            ExporterSettings::Local { path } => {
                Exporter::Local(LocalExporter::new(path.join(node_name).join(run_id)))
            }
            ExporterSettings::Http {
                url,
                container,
                sas_token,
            } => Exporter::Http(HttpExporter::new(
                url,
                container,
                &format!("{node_name}/{run_id}"),
                sas_token.clone(),
            )?),
        };
        match &exporter {
            Exporter::Local(l) => info!("exporting to {}", l.root().display()),
            Exporter::Http(h) => info!("exporting to {}", h.base),
        }
        Ok(exporter)
    }

    /// Hand every artifact to the sink. Stops at the first failure; the
    /// next export retries everything.
    pub async fn export(&self, artifacts: &[DataArtifact]) -> Result<(), ExportError> {
        match self {
            Exporter::Local(e) => e.export(artifacts).await,
            Exporter::Http(e) => e.export(artifacts).await,
        }
    }
}
