// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage broker trait definitions.
//!
//! Defines the abstract persistence interface used by the foundation
//! services, and the error classification every backend must produce.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Lab, LabCommand, LabWorkflow, LabWorkflowCommand};

/// Errors from storage operations, classified by what the caller can do about them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A row with the same key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The row references a missing row, or is referenced by another row.
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// The row is locked by a concurrent transaction.
    #[error("Row locked: {0}")]
    Locked(String),

    /// The database could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A stored value could not be mapped back to a model.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Any other database failure.
    #[error("Storage operation failed: {0}")]
    Failed(#[source] sqlx::Error),
}

impl StorageError {
    /// Whether the failure means the database itself is unusable.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// PostgreSQL SQLSTATE codes for lock contention.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let message = db_err.message().to_string();
            if db_err.is_unique_violation() {
                return Self::DuplicateKey(message);
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKey(message);
            }
            if matches!(
                db_err.code().as_deref(),
                Some(LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ) {
                return Self::Locked(message);
            }
        }

        if matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Configuration(_)
        ) {
            Self::Unavailable(err)
        } else {
            Self::Failed(err)
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Fractional-second digits a stored timestamp keeps (`TIMESTAMPTZ`).
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// `date` as it reads back from storage.
pub fn stored_instant(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(STORED_SUBSEC_DIGITS)
}

// Copies with every date at storage precision. Brokers persist and return these.

pub(crate) fn stored_lab(lab: &Lab) -> Lab {
    Lab {
        created_date: stored_instant(lab.created_date),
        updated_date: stored_instant(lab.updated_date),
        ..lab.clone()
    }
}

pub(crate) fn stored_lab_command(lab_command: &LabCommand) -> LabCommand {
    LabCommand {
        created_date: stored_instant(lab_command.created_date),
        updated_date: stored_instant(lab_command.updated_date),
        ..lab_command.clone()
    }
}

pub(crate) fn stored_lab_workflow(lab_workflow: &LabWorkflow) -> LabWorkflow {
    LabWorkflow {
        commands: lab_workflow
            .commands
            .iter()
            .map(stored_lab_workflow_command)
            .collect(),
        created_date: stored_instant(lab_workflow.created_date),
        updated_date: stored_instant(lab_workflow.updated_date),
        ..lab_workflow.clone()
    }
}

pub(crate) fn stored_lab_workflow_command(command: &LabWorkflowCommand) -> LabWorkflowCommand {
    LabWorkflowCommand {
        created_date: stored_instant(command.created_date),
        updated_date: stored_instant(command.updated_date),
        ..command.clone()
    }
}

/// Persistence interface for labs, lab commands and lab workflows.
///
/// Brokers do not validate. They persist exactly what they are given and
/// report failures as [`StorageError`].
#[async_trait]
pub trait StorageBroker: Send + Sync {
    /// Insert a lab together with its devices.
    async fn insert_lab(&self, lab: &Lab) -> Result<Lab>;

    /// All labs, each with its devices.
    async fn select_all_labs_with_devices(&self) -> Result<Vec<Lab>>;

    /// A lab with its devices.
    async fn select_lab_by_id(&self, lab_id: Uuid) -> Result<Option<Lab>>;

    /// A lab with its devices, looked up by vendor identifier.
    async fn select_lab_by_external_id(&self, external_id: &str) -> Result<Option<Lab>>;

    /// Delete a lab and its devices. Returns the deleted lab.
    async fn delete_lab(&self, lab: &Lab) -> Result<Lab>;

    /// Insert a lab command.
    async fn insert_lab_command(&self, lab_command: &LabCommand) -> Result<LabCommand>;

    /// All lab commands.
    async fn select_all_lab_commands(&self) -> Result<Vec<LabCommand>>;

    /// A lab command by id.
    async fn select_lab_command_by_id(&self, lab_command_id: Uuid) -> Result<Option<LabCommand>>;

    /// Overwrite a stored lab command. `None` when no row has its id.
    async fn update_lab_command(&self, lab_command: &LabCommand)
    -> Result<Option<LabCommand>>;

    /// Insert a workflow together with its commands.
    async fn insert_lab_workflow(&self, lab_workflow: &LabWorkflow) -> Result<LabWorkflow>;

    /// A workflow by id, without its commands.
    async fn select_lab_workflow_by_id(&self, lab_workflow_id: Uuid)
    -> Result<Option<LabWorkflow>>;

    /// Insert a single workflow command.
    async fn insert_lab_workflow_command(
        &self,
        command: &LabWorkflowCommand,
    ) -> Result<LabWorkflowCommand>;

    /// A workflow command by id.
    async fn select_lab_workflow_command_by_id(
        &self,
        command_id: Uuid,
    ) -> Result<Option<LabWorkflowCommand>>;

    /// Commands of a workflow, oldest first.
    async fn select_lab_workflow_commands_by_workflow_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Vec<LabWorkflowCommand>>;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> Result<bool>;
}
