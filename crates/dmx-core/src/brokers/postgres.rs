// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL storage broker.
//!
//! Enum columns are stored as TEXT and mapped through their `strum` names, so
//! row types are read as plain strings and converted into models here.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::storage::{
    Result, StorageBroker, StorageError, stored_lab, stored_lab_command, stored_lab_workflow,
    stored_lab_workflow_command,
};
use crate::models::{Lab, LabCommand, LabDevice, LabWorkflow, LabWorkflowCommand};

/// PostgreSQL-backed storage broker.
#[derive(Clone)]
pub struct PostgresStorageBroker {
    pool: PgPool,
}

impl PostgresStorageBroker {
    /// Create a new broker over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LabRow {
    id: Uuid,
    external_id: String,
    name: String,
    description: String,
    status: String,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LabDeviceRow {
    id: Uuid,
    lab_id: Uuid,
    name: Option<String>,
    power_level: Option<i32>,
    device_type: String,
    category: String,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LabCommandRow {
    id: Uuid,
    lab_id: Uuid,
    arguments: String,
    notes: Option<String>,
    results: Option<String>,
    status: String,
    command_type: String,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LabWorkflowRow {
    id: Uuid,
    name: String,
    owner: String,
    status: String,
    notes: Option<String>,
    results: Option<String>,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LabWorkflowCommandRow {
    id: Uuid,
    workflow_id: Uuid,
    lab_id: Uuid,
    arguments: String,
    notes: Option<String>,
    results: Option<String>,
    status: String,
    command_type: String,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

fn parse_column<T: FromStr>(column: &'static str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| StorageError::Decode(format!("unexpected {column} value '{value}'")))
}

impl LabRow {
    fn into_lab(self, devices: Vec<LabDevice>) -> Result<Lab> {
        Ok(Lab {
            id: self.id,
            external_id: self.external_id,
            name: self.name,
            description: self.description,
            status: parse_column("labs.status", &self.status)?,
            devices,
            created_date: self.created_date,
            updated_date: self.updated_date,
        })
    }
}

impl TryFrom<LabDeviceRow> for LabDevice {
    type Error = StorageError;

    fn try_from(row: LabDeviceRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            lab_id: row.lab_id,
            name: row.name,
            power_level: row.power_level,
            device_type: parse_column("lab_devices.device_type", &row.device_type)?,
            category: parse_column("lab_devices.category", &row.category)?,
            status: parse_column("lab_devices.status", &row.status)?,
        })
    }
}

impl TryFrom<LabCommandRow> for LabCommand {
    type Error = StorageError;

    fn try_from(row: LabCommandRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            lab_id: row.lab_id,
            arguments: row.arguments,
            notes: row.notes,
            results: row.results,
            status: parse_column("lab_commands.status", &row.status)?,
            command_type: parse_column("lab_commands.command_type", &row.command_type)?,
            created_date: row.created_date,
            updated_date: row.updated_date,
        })
    }
}

impl TryFrom<LabWorkflowRow> for LabWorkflow {
    type Error = StorageError;

    fn try_from(row: LabWorkflowRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            owner: row.owner,
            status: parse_column("lab_workflows.status", &row.status)?,
            notes: row.notes,
            results: row.results,
            commands: Vec::new(),
            created_date: row.created_date,
            updated_date: row.updated_date,
        })
    }
}

impl TryFrom<LabWorkflowCommandRow> for LabWorkflowCommand {
    type Error = StorageError;

    fn try_from(row: LabWorkflowCommandRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            workflow_id: row.workflow_id,
            lab_id: row.lab_id,
            arguments: row.arguments,
            notes: row.notes,
            results: row.results,
            status: parse_column("lab_workflow_commands.status", &row.status)?,
            command_type: parse_column("lab_workflow_commands.command_type", &row.command_type)?,
            created_date: row.created_date,
            updated_date: row.updated_date,
        })
    }
}

// ============================================================================
// Shared Queries
// ============================================================================

const SELECT_LAB: &str = r#"
    SELECT id, external_id, name, description, status, created_date, updated_date
    FROM labs
"#;

const SELECT_LAB_DEVICE: &str = r#"
    SELECT id, lab_id, name, power_level, device_type, category, status
    FROM lab_devices
"#;

const SELECT_LAB_COMMAND: &str = r#"
    SELECT id, lab_id, arguments, notes, results, status, command_type,
           created_date, updated_date
    FROM lab_commands
"#;

const SELECT_LAB_WORKFLOW_COMMAND: &str = r#"
    SELECT id, workflow_id, lab_id, arguments, notes, results, status, command_type,
           created_date, updated_date
    FROM lab_workflow_commands
"#;

impl PostgresStorageBroker {
    async fn select_lab_where(&self, clause: &str, value: impl ToString) -> Result<Option<Lab>> {
        let query = format!("{SELECT_LAB} WHERE {clause}");
        let row = sqlx::query_as::<_, LabRow>(&query)
            .bind(value.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let devices = sqlx::query_as::<_, LabDeviceRow>(&format!(
            "{SELECT_LAB_DEVICE} WHERE lab_id = $1 ORDER BY device_type, id"
        ))
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LabDevice::try_from)
        .collect::<Result<Vec<_>>>()?;

        row.into_lab(devices).map(Some)
    }
}

async fn insert_workflow_command(
    tx: &mut Transaction<'_, Postgres>,
    command: &LabWorkflowCommand,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lab_workflow_commands
            (id, workflow_id, lab_id, arguments, notes, results, status, command_type,
             created_date, updated_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(command.id)
    .bind(command.workflow_id)
    .bind(command.lab_id)
    .bind(&command.arguments)
    .bind(&command.notes)
    .bind(&command.results)
    .bind(command.status.as_ref())
    .bind(command.command_type.as_ref())
    .bind(command.created_date)
    .bind(command.updated_date)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl StorageBroker for PostgresStorageBroker {
    // ========================================================================
    // Labs
    // ========================================================================

    async fn insert_lab(&self, lab: &Lab) -> Result<Lab> {
        let lab = stored_lab(lab);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO labs (id, external_id, name, description, status, created_date, updated_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(lab.id)
        .bind(&lab.external_id)
        .bind(&lab.name)
        .bind(&lab.description)
        .bind(lab.status.as_ref())
        .bind(lab.created_date)
        .bind(lab.updated_date)
        .execute(&mut *tx)
        .await?;

        for device in &lab.devices {
            sqlx::query(
                r#"
                INSERT INTO lab_devices (id, lab_id, name, power_level, device_type, category, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(device.id)
            .bind(lab.id)
            .bind(&device.name)
            .bind(device.power_level)
            .bind(device.device_type.as_ref())
            .bind(device.category.as_ref())
            .bind(device.status.as_ref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(lab)
    }

    async fn select_all_labs_with_devices(&self) -> Result<Vec<Lab>> {
        let rows = sqlx::query_as::<_, LabRow>(&format!("{SELECT_LAB} ORDER BY created_date, id"))
            .fetch_all(&self.pool)
            .await?;

        let device_rows = sqlx::query_as::<_, LabDeviceRow>(&format!(
            "{SELECT_LAB_DEVICE} ORDER BY device_type, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut devices_by_lab: HashMap<Uuid, Vec<LabDevice>> = HashMap::new();
        for row in device_rows {
            let device = LabDevice::try_from(row)?;
            devices_by_lab.entry(device.lab_id).or_default().push(device);
        }

        rows.into_iter()
            .map(|row| {
                let devices = devices_by_lab.remove(&row.id).unwrap_or_default();
                row.into_lab(devices)
            })
            .collect()
    }

    async fn select_lab_by_id(&self, lab_id: Uuid) -> Result<Option<Lab>> {
        self.select_lab_where("id = $1::uuid", lab_id).await
    }

    async fn select_lab_by_external_id(&self, external_id: &str) -> Result<Option<Lab>> {
        self.select_lab_where("external_id = $1", external_id).await
    }

    async fn delete_lab(&self, lab: &Lab) -> Result<Lab> {
        // Devices go with the lab via ON DELETE CASCADE.
        sqlx::query("DELETE FROM labs WHERE id = $1")
            .bind(lab.id)
            .execute(&self.pool)
            .await?;

        Ok(lab.clone())
    }

    // ========================================================================
    // Lab Commands
    // ========================================================================

    async fn insert_lab_command(&self, lab_command: &LabCommand) -> Result<LabCommand> {
        let lab_command = stored_lab_command(lab_command);
        sqlx::query(
            r#"
            INSERT INTO lab_commands
                (id, lab_id, arguments, notes, results, status, command_type,
                 created_date, updated_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(lab_command.id)
        .bind(lab_command.lab_id)
        .bind(&lab_command.arguments)
        .bind(&lab_command.notes)
        .bind(&lab_command.results)
        .bind(lab_command.status.as_ref())
        .bind(lab_command.command_type.as_ref())
        .bind(lab_command.created_date)
        .bind(lab_command.updated_date)
        .execute(&self.pool)
        .await?;

        Ok(lab_command)
    }

    async fn select_all_lab_commands(&self) -> Result<Vec<LabCommand>> {
        sqlx::query_as::<_, LabCommandRow>(&format!(
            "{SELECT_LAB_COMMAND} ORDER BY created_date, id"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LabCommand::try_from)
        .collect()
    }

    async fn select_lab_command_by_id(&self, lab_command_id: Uuid) -> Result<Option<LabCommand>> {
        sqlx::query_as::<_, LabCommandRow>(&format!("{SELECT_LAB_COMMAND} WHERE id = $1"))
            .bind(lab_command_id)
            .fetch_optional(&self.pool)
            .await?
            .map(LabCommand::try_from)
            .transpose()
    }

    async fn update_lab_command(
        &self,
        lab_command: &LabCommand,
    ) -> Result<Option<LabCommand>> {
        let lab_command = stored_lab_command(lab_command);
        let result = sqlx::query(
            r#"
            UPDATE lab_commands
            SET lab_id = $2, arguments = $3, notes = $4, results = $5, status = $6,
                command_type = $7, created_date = $8, updated_date = $9
            WHERE id = $1
            "#,
        )
        .bind(lab_command.id)
        .bind(lab_command.lab_id)
        .bind(&lab_command.arguments)
        .bind(&lab_command.notes)
        .bind(&lab_command.results)
        .bind(lab_command.status.as_ref())
        .bind(lab_command.command_type.as_ref())
        .bind(lab_command.created_date)
        .bind(lab_command.updated_date)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then_some(lab_command))
    }

    // ========================================================================
    // Lab Workflows
    // ========================================================================

    async fn insert_lab_workflow(&self, lab_workflow: &LabWorkflow) -> Result<LabWorkflow> {
        let lab_workflow = stored_lab_workflow(lab_workflow);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO lab_workflows
                (id, name, owner, status, notes, results, created_date, updated_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(lab_workflow.id)
        .bind(&lab_workflow.name)
        .bind(&lab_workflow.owner)
        .bind(lab_workflow.status.as_ref())
        .bind(&lab_workflow.notes)
        .bind(&lab_workflow.results)
        .bind(lab_workflow.created_date)
        .bind(lab_workflow.updated_date)
        .execute(&mut *tx)
        .await?;

        for command in &lab_workflow.commands {
            insert_workflow_command(&mut tx, command).await?;
        }

        tx.commit().await?;

        Ok(lab_workflow)
    }

    async fn select_lab_workflow_by_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Option<LabWorkflow>> {
        sqlx::query_as::<_, LabWorkflowRow>(
            r#"
            SELECT id, name, owner, status, notes, results, created_date, updated_date
            FROM lab_workflows
            WHERE id = $1
            "#,
        )
        .bind(lab_workflow_id)
        .fetch_optional(&self.pool)
        .await?
        .map(LabWorkflow::try_from)
        .transpose()
    }

    // ========================================================================
    // Lab Workflow Commands
    // ========================================================================

    async fn insert_lab_workflow_command(
        &self,
        command: &LabWorkflowCommand,
    ) -> Result<LabWorkflowCommand> {
        let command = stored_lab_workflow_command(command);
        let mut tx = self.pool.begin().await?;
        insert_workflow_command(&mut tx, &command).await?;
        tx.commit().await?;

        Ok(command)
    }

    async fn select_lab_workflow_command_by_id(
        &self,
        command_id: Uuid,
    ) -> Result<Option<LabWorkflowCommand>> {
        sqlx::query_as::<_, LabWorkflowCommandRow>(&format!(
            "{SELECT_LAB_WORKFLOW_COMMAND} WHERE id = $1"
        ))
        .bind(command_id)
        .fetch_optional(&self.pool)
        .await?
        .map(LabWorkflowCommand::try_from)
        .transpose()
    }

    async fn select_lab_workflow_commands_by_workflow_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Vec<LabWorkflowCommand>> {
        sqlx::query_as::<_, LabWorkflowCommandRow>(&format!(
            "{SELECT_LAB_WORKFLOW_COMMAND} WHERE workflow_id = $1 ORDER BY created_date, id"
        ))
        .bind(lab_workflow_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LabWorkflowCommand::try_from)
        .collect()
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}
