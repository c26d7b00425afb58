// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory brokers for testing.
//!
//! These brokers keep everything in process memory, record which
//! operations were called, and can be told to fail. The storage broker
//! enforces the same key constraints and timestamp precision as the
//! PostgreSQL schema.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::clock::DateTimeBroker;
use super::lab_api::{LabApiBroker, LabApiError};
use super::storage::{
    Result, StorageBroker, StorageError, stored_lab, stored_lab_command, stored_lab_workflow,
    stored_lab_workflow_command,
};
use crate::models::{
    ExternalLab, ExternalLabCollection, ExternalLabServiceInformation, Lab, LabCommand,
    LabWorkflow, LabWorkflowCommand,
};

/// Builds the error an injected failure returns.
pub type StorageFailure = fn() -> StorageError;

/// Operation key that makes every storage call fail.
pub const ALL_OPERATIONS: &str = "*";

#[derive(Debug, Default)]
struct Tables {
    labs: Vec<Lab>,
    lab_commands: Vec<LabCommand>,
    lab_workflows: Vec<LabWorkflow>,
    lab_workflow_commands: Vec<LabWorkflowCommand>,
}

/// In-memory storage broker.
#[derive(Default)]
pub struct MemoryStorageBroker {
    tables: Mutex<Tables>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, StorageFailure>>,
}

impl MemoryStorageBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a broker pre-populated with labs.
    pub fn with_labs(labs: Vec<Lab>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                labs,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Make `operation` fail until cleared. Use [`ALL_OPERATIONS`] to fail every call.
    pub async fn fail_on(&self, operation: &'static str, failure: StorageFailure) {
        self.failures.lock().await.insert(operation, failure);
    }

    /// Remove every injected failure.
    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
    }

    /// Operations called so far, in order.
    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    /// How many times `operation` was called.
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|called| **called == operation)
            .count()
    }

    /// Snapshot of stored labs.
    pub async fn labs(&self) -> Vec<Lab> {
        self.tables.lock().await.labs.clone()
    }

    /// Snapshot of stored lab commands.
    pub async fn lab_commands(&self) -> Vec<LabCommand> {
        self.tables.lock().await.lab_commands.clone()
    }

    /// Insert a lab command without going through constraint checks or call recording.
    pub async fn seed_lab_command(&self, lab_command: LabCommand) {
        self.tables.lock().await.lab_commands.push(lab_command);
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().await.push(operation);

        let failures = self.failures.lock().await;
        match failures
            .get(operation)
            .or_else(|| failures.get(ALL_OPERATIONS))
        {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

fn duplicate(table: &str) -> StorageError {
    StorageError::DuplicateKey(format!(
        "duplicate key value violates unique constraint \"{table}_pkey\""
    ))
}

fn missing_reference(table: &str) -> StorageError {
    StorageError::ForeignKey(format!(
        "insert or update on table \"{table}\" violates foreign key constraint"
    ))
}

#[async_trait]
impl StorageBroker for MemoryStorageBroker {
    async fn insert_lab(&self, lab: &Lab) -> Result<Lab> {
        self.enter("insert_lab").await?;
        let mut tables = self.tables.lock().await;

        if tables.labs.iter().any(|stored| stored.id == lab.id) {
            return Err(duplicate("labs"));
        }
        if tables
            .labs
            .iter()
            .any(|stored| stored.external_id == lab.external_id)
        {
            return Err(StorageError::DuplicateKey(
                "duplicate key value violates unique constraint \"labs_external_id_key\""
                    .to_string(),
            ));
        }

        let lab = stored_lab(lab);
        tables.labs.push(lab.clone());
        Ok(lab)
    }

    async fn select_all_labs_with_devices(&self) -> Result<Vec<Lab>> {
        self.enter("select_all_labs_with_devices").await?;
        Ok(self.tables.lock().await.labs.clone())
    }

    async fn select_lab_by_id(&self, lab_id: Uuid) -> Result<Option<Lab>> {
        self.enter("select_lab_by_id").await?;
        let tables = self.tables.lock().await;
        Ok(tables.labs.iter().find(|lab| lab.id == lab_id).cloned())
    }

    async fn select_lab_by_external_id(&self, external_id: &str) -> Result<Option<Lab>> {
        self.enter("select_lab_by_external_id").await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .labs
            .iter()
            .find(|lab| lab.external_id == external_id)
            .cloned())
    }

    async fn delete_lab(&self, lab: &Lab) -> Result<Lab> {
        self.enter("delete_lab").await?;
        let mut tables = self.tables.lock().await;

        let referenced = tables.lab_commands.iter().any(|c| c.lab_id == lab.id)
            || tables
                .lab_workflow_commands
                .iter()
                .any(|c| c.lab_id == lab.id);
        if referenced {
            return Err(StorageError::ForeignKey(
                "update or delete on table \"labs\" violates foreign key constraint".to_string(),
            ));
        }

        tables.labs.retain(|stored| stored.id != lab.id);
        Ok(lab.clone())
    }

    async fn insert_lab_command(&self, lab_command: &LabCommand) -> Result<LabCommand> {
        self.enter("insert_lab_command").await?;
        let mut tables = self.tables.lock().await;

        if tables.lab_commands.iter().any(|c| c.id == lab_command.id) {
            return Err(duplicate("lab_commands"));
        }
        if !tables.labs.iter().any(|lab| lab.id == lab_command.lab_id) {
            return Err(missing_reference("lab_commands"));
        }

        let lab_command = stored_lab_command(lab_command);
        tables.lab_commands.push(lab_command.clone());
        Ok(lab_command)
    }

    async fn select_all_lab_commands(&self) -> Result<Vec<LabCommand>> {
        self.enter("select_all_lab_commands").await?;
        Ok(self.tables.lock().await.lab_commands.clone())
    }

    async fn select_lab_command_by_id(&self, lab_command_id: Uuid) -> Result<Option<LabCommand>> {
        self.enter("select_lab_command_by_id").await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .lab_commands
            .iter()
            .find(|c| c.id == lab_command_id)
            .cloned())
    }

    async fn update_lab_command(
        &self,
        lab_command: &LabCommand,
    ) -> Result<Option<LabCommand>> {
        self.enter("update_lab_command").await?;
        let mut tables = self.tables.lock().await;

        let Some(stored) = tables
            .lab_commands
            .iter_mut()
            .find(|c| c.id == lab_command.id)
        else {
            return Ok(None);
        };
        *stored = stored_lab_command(lab_command);
        Ok(Some(stored.clone()))
    }

    async fn insert_lab_workflow(&self, lab_workflow: &LabWorkflow) -> Result<LabWorkflow> {
        self.enter("insert_lab_workflow").await?;
        let mut tables = self.tables.lock().await;

        if tables.lab_workflows.iter().any(|w| w.id == lab_workflow.id) {
            return Err(duplicate("lab_workflows"));
        }
        for command in &lab_workflow.commands {
            if tables.lab_workflow_commands.iter().any(|c| c.id == command.id) {
                return Err(duplicate("lab_workflow_commands"));
            }
            if !tables.labs.iter().any(|lab| lab.id == command.lab_id) {
                return Err(missing_reference("lab_workflow_commands"));
            }
        }

        let lab_workflow = stored_lab_workflow(lab_workflow);
        tables.lab_workflows.push(LabWorkflow {
            commands: Vec::new(),
            ..lab_workflow.clone()
        });
        tables
            .lab_workflow_commands
            .extend(lab_workflow.commands.iter().cloned());
        Ok(lab_workflow)
    }

    async fn select_lab_workflow_by_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Option<LabWorkflow>> {
        self.enter("select_lab_workflow_by_id").await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .lab_workflows
            .iter()
            .find(|w| w.id == lab_workflow_id)
            .cloned())
    }

    async fn insert_lab_workflow_command(
        &self,
        command: &LabWorkflowCommand,
    ) -> Result<LabWorkflowCommand> {
        self.enter("insert_lab_workflow_command").await?;
        let mut tables = self.tables.lock().await;

        if tables.lab_workflow_commands.iter().any(|c| c.id == command.id) {
            return Err(duplicate("lab_workflow_commands"));
        }
        if !tables.lab_workflows.iter().any(|w| w.id == command.workflow_id)
            || !tables.labs.iter().any(|lab| lab.id == command.lab_id)
        {
            return Err(missing_reference("lab_workflow_commands"));
        }

        let command = stored_lab_workflow_command(command);
        tables.lab_workflow_commands.push(command.clone());
        Ok(command)
    }

    async fn select_lab_workflow_command_by_id(
        &self,
        command_id: Uuid,
    ) -> Result<Option<LabWorkflowCommand>> {
        self.enter("select_lab_workflow_command_by_id").await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .lab_workflow_commands
            .iter()
            .find(|c| c.id == command_id)
            .cloned())
    }

    async fn select_lab_workflow_commands_by_workflow_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Vec<LabWorkflowCommand>> {
        self.enter("select_lab_workflow_commands_by_workflow_id")
            .await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .lab_workflow_commands
            .iter()
            .filter(|c| c.workflow_id == lab_workflow_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        self.enter("health_check").await?;
        Ok(true)
    }
}

/// Lab API broker that answers with a fixed collection.
#[derive(Default)]
pub struct StaticLabApiBroker {
    labs: Mutex<Vec<ExternalLab>>,
    failure: Mutex<Option<fn() -> LabApiError>>,
    requests: Mutex<Vec<ExternalLabServiceInformation>>,
}

impl StaticLabApiBroker {
    /// Answer every call with `labs`.
    pub fn new(labs: Vec<ExternalLab>) -> Self {
        Self {
            labs: Mutex::new(labs),
            ..Default::default()
        }
    }

    /// Answer every call with an error built by `failure`.
    pub fn failing(failure: fn() -> LabApiError) -> Self {
        Self {
            failure: Mutex::new(Some(failure)),
            ..Default::default()
        }
    }

    /// Replace the reported labs.
    pub async fn set_labs(&self, labs: Vec<ExternalLab>) {
        *self.labs.lock().await = labs;
    }

    /// Service information received so far.
    pub async fn requests(&self) -> Vec<ExternalLabServiceInformation> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LabApiBroker for StaticLabApiBroker {
    async fn get_available_labs(
        &self,
        service_information: &ExternalLabServiceInformation,
    ) -> std::result::Result<ExternalLabCollection, LabApiError> {
        self.requests.lock().await.push(service_information.clone());

        if let Some(failure) = *self.failure.lock().await {
            return Err(failure());
        }
        Ok(ExternalLabCollection {
            external_labs: self.labs.lock().await.clone(),
        })
    }
}

/// Clock that always returns the same instant.
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Utc>>,
    reads: AtomicUsize,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
            reads: AtomicUsize::new(0),
        }
    }

    /// Move the clock.
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    /// How many times the time was read.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DateTimeBroker for FixedClock {
    fn current_date_time(&self) -> DateTime<Utc> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
