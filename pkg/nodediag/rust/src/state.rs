// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

/// Where an action is within one collect/process/export sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    Collecting,
    Processing,
    Exporting,
}

impl ActionState {
    pub(crate) fn can_transition_to(self, next: ActionState) -> bool {
        use ActionState::*;
        matches!(
            (self, next),
            (Idle, Collecting)
                | (Collecting, Processing)
                | (Collecting, Exporting)
                | (Collecting, Idle)
                | (Processing, Exporting)
                | (Processing, Idle)
                | (Exporting, Idle)
        )
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionState::Idle => write!(f, "idle"),
            ActionState::Collecting => write!(f, "collecting"),
            ActionState::Processing => write!(f, "processing"),
            ActionState::Exporting => write!(f, "exporting"),
        }
    }
}
