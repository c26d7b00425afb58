// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab command models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Execution state of a command.
///
/// Values the API does not know deserialize to `Unrecognized`, which the
/// validators reject. It is never persisted.
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
pub enum CommandStatus {
    /// Recorded, not yet picked up.
    #[default]
    Pending,
    /// Executing on the lab.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Error,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

/// Interpreter a command runs under.
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
pub enum CommandType {
    /// POSIX shell.
    #[default]
    Shell,
    /// PowerShell.
    PowerShell,
    /// Python script.
    Python,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

impl CommandStatus {
    /// Whether this is one of the known states.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

impl CommandType {
    /// Whether this is one of the known command types.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

/// A request to run a single command against a lab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabCommand {
    /// Primary key.
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: Uuid,
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
