// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::Collection;
use crate::export::DataArtifact;
use serde::Serialize;
use std::path::PathBuf;

/// Snapshots the node's resolver configuration.
pub struct DnsCollector {
    resolv_conf: PathBuf,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolverSummary {
    pub nameservers: Vec<String>,
    pub search: Vec<String>,
    pub options: Vec<String>,
}

/// Parse `resolv.conf` syntax. Comments start with `#` or `;`; a later
/// `search` line replaces an earlier one.
pub fn parse_resolv_conf(contents: &str) -> ResolverSummary {
    let mut summary = ResolverSummary::default();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("nameserver") => summary.nameservers.extend(fields.next().map(String::from)),
            Some("search") | Some("domain") => {
                summary.search = fields.map(String::from).collect();
            }
            Some("options") => summary.options.extend(fields.map(String::from)),
            _ => {}
        }
    }
    summary
}

impl DnsCollector {
    pub fn new(resolv_conf: PathBuf) -> Self {
        Self { resolv_conf }
    }

    pub async fn collect(&self) -> Collection {
        let mut collection = Collection::default();
        let contents = match tokio::fs::read_to_string(&self.resolv_conf).await {
            Ok(contents) => contents,
            Err(e) => {
                collection
                    .errors
                    .push(format!("reading {}: {e}", self.resolv_conf.display()));
                return collection;
            }
        };

        let summary = parse_resolv_conf(&contents);
        match serde_json::to_vec_pretty(&summary) {
            Ok(json) => collection.artifacts.push(DataArtifact::new("dns.json", json)),
            Err(e) => collection.errors.push(format!("encoding dns summary: {e}")),
        }
        collection
            .artifacts
            .push(DataArtifact::new("resolv.conf", contents.into_bytes()));
        collection
    }
}
