// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab workflow models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lab_commands::{CommandStatus, CommandType};

/// Execution state of a workflow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum WorkflowStatus {
    /// Recorded, not yet started.
    #[default]
    Pending,
    /// At least one command is executing.
    Running,
    /// Every command finished successfully.
    Completed,
    /// A command failed.
    Error,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

impl WorkflowStatus {
    /// Whether this is one of the known states.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

/// An ordered set of commands executed as a unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabWorkflow {
    /// Primary key.
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: Uuid,
    /// Display name.
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
    /// Who requested the workflow.
    #[serde(deserialize_with = "super::null_as_default")]
    pub owner: String,
    /// Execution state.
    #[serde(deserialize_with = "super::null_as_default")]
    pub status: WorkflowStatus,
    /// Operator notes.
    pub notes: Option<String>,
    /// Aggregated output.
    pub results: Option<String>,
    /// Commands owned by this workflow.
    #[serde(deserialize_with = "super::null_as_default")]
    pub commands: Vec<LabWorkflowCommand>,
    /// Set once on creation.
    #[serde(deserialize_with = "super::null_as_default")]
    pub created_date: DateTime<Utc>,
    /// Bumped on every modification.
    #[serde(deserialize_with = "super::null_as_default")]
    pub updated_date: DateTime<Utc>,
}

/// A command that belongs to a workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabWorkflowCommand {
    /// Primary key.
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: Uuid,
    /// Owning workflow.
    #[serde(deserialize_with = "super::null_as_default")]
    pub workflow_id: Uuid,
    /// Lab the command targets.
    #[serde(deserialize_with = "super::null_as_default")]
    pub lab_id: Uuid,
    /// Command line.
    #[serde(deserialize_with = "super::null_as_default")]
    pub arguments: String,
    /// Operator notes.
    pub notes: Option<String>,
    /// Captured output.
    pub results: Option<String>,
    /// Execution state.
    #[serde(deserialize_with = "super::null_as_default")]
    pub status: CommandStatus,
    /// Interpreter.
    #[serde(rename = "type", deserialize_with = "super::null_as_default")]
    pub command_type: CommandType,
    /// Set once on creation.
    #[serde(deserialize_with = "super::null_as_default")]
    pub created_date: DateTime<Utc>,
    /// Bumped on every modification.
    #[serde(deserialize_with = "super::null_as_default")]
    pub updated_date: DateTime<Utc>,
}
