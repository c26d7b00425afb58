// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab workflow foundation service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::error::{Entity, Fault, Result, categorized};
use super::lab_workflow_commands::check_command;
use super::validation::{DatePair, Validator};
use crate::brokers::{DateTimeBroker, StorageBroker};
use crate::models::LabWorkflow;

/// Validates and persists workflows.
pub struct LabWorkflowService {
    storage: Arc<dyn StorageBroker>,
    clock: Arc<dyn DateTimeBroker>,
}

impl LabWorkflowService {
    pub fn new(storage: Arc<dyn StorageBroker>, clock: Arc<dyn DateTimeBroker>) -> Self {
        Self { storage, clock }
    }

    /// Store a new workflow together with its commands.
    ///
    /// Commands without a workflow id are attached to this workflow.
    pub async fn add_lab_workflow(&self, lab_workflow: LabWorkflow) -> Result<LabWorkflow> {
        categorized(Entity::LabWorkflow, async move {
            let mut lab_workflow = lab_workflow;
            for command in &mut lab_workflow.commands {
                if command.workflow_id.is_nil() {
                    command.workflow_id = lab_workflow.id;
                }
            }

            let now = self.clock.current_date_time();
            validate_on_add(&lab_workflow, now)?;

            let added = self.storage.insert_lab_workflow(&lab_workflow).await?;
            info!(
                lab_workflow_id = %added.id,
                commands = added.commands.len(),
                "Lab workflow added"
            );
            Ok(added)
        })
        .await
    }

    /// A workflow without its commands.
    pub async fn retrieve_lab_workflow_by_id(&self, lab_workflow_id: Uuid) -> Result<LabWorkflow> {
        categorized(Entity::LabWorkflow, async move {
            Validator::new().require_id("id", lab_workflow_id).finish()?;

            self.storage
                .select_lab_workflow_by_id(lab_workflow_id)
                .await?
                .ok_or(Fault::NotFound(lab_workflow_id))
        })
        .await
    }
}

fn validate_on_add(lab_workflow: &LabWorkflow, now: DateTime<Utc>) -> std::result::Result<(), Fault> {
    let mut validator = Validator::new();
    validator
        .require_id("id", lab_workflow.id)
        .require_text("name", &lab_workflow.name)
        .require_text("owner", &lab_workflow.owner)
        .require_recognized("status", lab_workflow.status.is_recognized());

    DatePair {
        created: lab_workflow.created_date,
        updated: lab_workflow.updated_date,
    }
    .check_on_add(&mut validator, now);

    for (index, command) in lab_workflow.commands.iter().enumerate() {
        check_command(&mut validator, &format!("commands[{index}]."), command, now);
        validator.check(
            command.workflow_id != lab_workflow.id,
            format!("commands[{index}].workflowId"),
            "Id is not the same as workflow id",
        );
    }

    validator.finish()
}
