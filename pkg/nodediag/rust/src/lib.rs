// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod action;
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod export;
pub mod sample;
pub mod schedule;
pub mod scheduler;
pub mod shutdown;
pub mod state;
