// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab workflow command foundation service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{Entity, Fault, Result, categorized};
use super::validation::{DatePair, Validator};
use crate::brokers::{DateTimeBroker, StorageBroker};
use crate::models::LabWorkflowCommand;

/// Validates and persists commands that belong to a workflow.
pub struct LabWorkflowCommandService {
    storage: Arc<dyn StorageBroker>,
    clock: Arc<dyn DateTimeBroker>,
}

impl LabWorkflowCommandService {
    pub fn new(storage: Arc<dyn StorageBroker>, clock: Arc<dyn DateTimeBroker>) -> Self {
        Self { storage, clock }
    }

    pub async fn add_lab_workflow_command(
        &self,
        command: LabWorkflowCommand,
    ) -> Result<LabWorkflowCommand> {
        categorized(Entity::LabWorkflowCommand, async move {
            let now = self.clock.current_date_time();
            let mut validator = Validator::new();
            check_command(&mut validator, "", &command, now);
            validator.finish()?;

            Ok(self.storage.insert_lab_workflow_command(&command).await?)
        })
        .await
    }

    pub async fn retrieve_lab_workflow_command_by_id(
        &self,
        command_id: Uuid,
    ) -> Result<LabWorkflowCommand> {
        categorized(Entity::LabWorkflowCommand, async move {
            Validator::new().require_id("id", command_id).finish()?;

            self.storage
                .select_lab_workflow_command_by_id(command_id)
                .await?
                .ok_or(Fault::NotFound(command_id))
        })
        .await
    }

    /// Commands of one workflow. Unknown workflows yield an empty list.
    pub async fn retrieve_lab_workflow_commands_by_workflow_id(
        &self,
        lab_workflow_id: Uuid,
    ) -> Result<Vec<LabWorkflowCommand>> {
        categorized(Entity::LabWorkflowCommand, async move {
            Validator::new()
                .require_id("workflowId", lab_workflow_id)
                .finish()?;

            Ok(self
                .storage
                .select_lab_workflow_commands_by_workflow_id(lab_workflow_id)
                .await?)
        })
        .await
    }
}

/// Rules for a new workflow command, reported under `prefix`.
pub(crate) fn check_command(
    validator: &mut Validator,
    prefix: &str,
    command: &LabWorkflowCommand,
    now: DateTime<Utc>,
) {
    validator
        .scope(prefix)
        .require_id("id", command.id)
        .require_id("workflowId", command.workflow_id)
        .require_id("labId", command.lab_id)
        .require_text("arguments", &command.arguments)
        .require_recognized("status", command.status.is_recognized())
        .require_recognized("type", command.command_type.is_recognized());

    DatePair {
        created: command.created_date,
        updated: command.updated_date,
    }
    .check_on_add(validator, now);

    validator.scope("");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brokers::mock::{FixedClock, MemoryStorageBroker};
    use crate::models::{CommandStatus, Lab, LabWorkflow};
    use crate::services::ErrorKind;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    async fn fixture() -> (Arc<MemoryStorageBroker>, LabWorkflowCommandService, Lab, LabWorkflow) {
        let lab = Lab {
            id: Uuid::new_v4(),
            external_id: "lab-1".to_string(),
            ..Default::default()
        };
        let workflow = LabWorkflow {
            id: Uuid::new_v4(),
            name: "Smoke".to_string(),
            owner: "qa".to_string(),
            created_date: now(),
            updated_date: now(),
            ..Default::default()
        };
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![lab.clone()]));
        storage.insert_lab_workflow(&workflow).await.unwrap();

        let service =
            LabWorkflowCommandService::new(storage.clone(), Arc::new(FixedClock::new(now())));
        (storage, service, lab, workflow)
    }

    fn command(workflow: &LabWorkflow, lab: &Lab) -> LabWorkflowCommand {
        LabWorkflowCommand {
            id: Uuid::new_v4(),
            workflow_id: workflow.id,
            lab_id: lab.id,
            arguments: "python run.py".to_string(),
            status: CommandStatus::Pending,
            created_date: now(),
            updated_date: now(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_and_retrieve_workflow_command() {
        let (_, service, lab, workflow) = fixture().await;
        let command = command(&workflow, &lab);

        service
            .add_lab_workflow_command(command.clone())
            .await
            .unwrap();

        assert_eq!(
            service
                .retrieve_lab_workflow_command_by_id(command.id)
                .await
                .unwrap(),
            command
        );
        assert_eq!(
            service
                .retrieve_lab_workflow_commands_by_workflow_id(workflow.id)
                .await
                .unwrap(),
            vec![command]
        );
    }

    #[tokio::test]
    async fn test_add_workflow_command_requires_workflow_id() {
        let (storage, service, lab, workflow) = fixture().await;
        let command = LabWorkflowCommand {
            workflow_id: Uuid::nil(),
            ..command(&workflow, &lab)
        };

        let err = service.add_lab_workflow_command(command).await.unwrap_err();

        assert_eq!(
            err.invalid_fields().and_then(|f| f.get("workflowId")),
            Some(&["Id is required".to_string()][..])
        );
        assert_eq!(storage.call_count("insert_lab_workflow_command").await, 0);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_workflow_command_is_not_found() {
        let (_, service, _, _) = fixture().await;

        let err = service
            .retrieve_lab_workflow_command_by_id(Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_check_command_prefixes_fields() {
        let mut validator = Validator::new();
        check_command(
            &mut validator,
            "commands[1].",
            &LabWorkflowCommand::default(),
            now(),
        );

        let Err(Fault::Invalid(fields)) = validator.finish() else {
            panic!("expected invalid fields");
        };
        assert!(fields.get("commands[1].arguments").is_some());
        assert!(fields.get("commands[1].createdDate").is_some());
        assert!(fields.get("arguments").is_none());
    }
}
