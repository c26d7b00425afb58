// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab command foundation service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::error::{Entity, Fault, Result, categorized};
use super::validation::{DatePair, Validator};
use crate::brokers::storage::stored_instant;
use crate::brokers::{DateTimeBroker, StorageBroker};
use crate::models::LabCommand;

/// Validates and persists lab commands.
pub struct LabCommandService {
    storage: Arc<dyn StorageBroker>,
    clock: Arc<dyn DateTimeBroker>,
}

impl LabCommandService {
    pub fn new(storage: Arc<dyn StorageBroker>, clock: Arc<dyn DateTimeBroker>) -> Self {
        Self { storage, clock }
    }

    /// Store a new command.
    ///
    /// Both dates must be set by the caller, be equal, and lie within the
    /// recent window.
    pub async fn add_lab_command(&self, lab_command: LabCommand) -> Result<LabCommand> {
        categorized(Entity::LabCommand, async move {
            let now = self.clock.current_date_time();
            validate_on_add(&lab_command, now)?;

            let added = self.storage.insert_lab_command(&lab_command).await?;
            info!(
                lab_command_id = %added.id,
                lab_id = %added.lab_id,
                command_type = %added.command_type,
                "Lab command added"
            );
            Ok(added)
        })
        .await
    }

    pub async fn retrieve_all_lab_commands(&self) -> Result<Vec<LabCommand>> {
        categorized(Entity::LabCommand, async {
            Ok(self.storage.select_all_lab_commands().await?)
        })
        .await
    }

    pub async fn retrieve_lab_command_by_id(&self, lab_command_id: Uuid) -> Result<LabCommand> {
        categorized(Entity::LabCommand, async move {
            Validator::new().require_id("id", lab_command_id).finish()?;

            self.storage
                .select_lab_command_by_id(lab_command_id)
                .await?
                .ok_or(Fault::NotFound(lab_command_id))
        })
        .await
    }

    /// Overwrite a stored command.
    ///
    /// The update date must be fresh and after the creation date, and the
    /// creation date must match what is stored.
    pub async fn modify_lab_command(&self, lab_command: LabCommand) -> Result<LabCommand> {
        categorized(Entity::LabCommand, async move {
            let now = self.clock.current_date_time();
            validate_on_modify(&lab_command, now)?;

            let stored = self
                .storage
                .select_lab_command_by_id(lab_command.id)
                .await?
                .ok_or(Fault::NotFound(lab_command.id))?;

            Validator::new()
                .check(
                    stored_instant(stored.created_date) != stored_instant(lab_command.created_date),
                    "createdDate",
                    "Date is not the same as stored CreatedDate",
                )
                .finish()?;

            let modified = self
                .storage
                .update_lab_command(&lab_command)
                .await?
                .ok_or(Fault::NotFound(lab_command.id))?;
            info!(
                lab_command_id = %modified.id,
                status = %modified.status,
                "Lab command modified"
            );
            Ok(modified)
        })
        .await
    }
}

fn validate_fields(lab_command: &LabCommand) -> Validator {
    let mut validator = Validator::new();
    validator
        .require_id("id", lab_command.id)
        .require_id("labId", lab_command.lab_id)
        .require_text("arguments", &lab_command.arguments)
        .require_recognized("status", lab_command.status.is_recognized())
        .require_recognized("type", lab_command.command_type.is_recognized());
    validator
}

fn validate_on_add(lab_command: &LabCommand, now: DateTime<Utc>) -> std::result::Result<(), Fault> {
    let mut validator = validate_fields(lab_command);
    DatePair {
        created: lab_command.created_date,
        updated: lab_command.updated_date,
    }
    .check_on_add(&mut validator, now);
    validator.finish()
}

fn validate_on_modify(
    lab_command: &LabCommand,
    now: DateTime<Utc>,
) -> std::result::Result<(), Fault> {
    let mut validator = validate_fields(lab_command);
    DatePair {
        created: lab_command.created_date,
        updated: lab_command.updated_date,
    }
    .check_on_modify(&mut validator, now);
    validator.finish()
}
