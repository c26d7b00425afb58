// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab workflow orchestration.

use uuid::Uuid;

use crate::models::LabWorkflow;
use crate::services::error::{Entity, Result, categorized};
use crate::services::lab_workflow_commands::LabWorkflowCommandService;
use crate::services::lab_workflows::LabWorkflowService;

/// Composes the workflow and workflow command services.
pub struct LabWorkflowOrchestrationService {
    workflow_service: LabWorkflowService,
    workflow_command_service: LabWorkflowCommandService,
}

impl LabWorkflowOrchestrationService {
    pub fn new(
        workflow_service: LabWorkflowService,
        workflow_command_service: LabWorkflowCommandService,
    ) -> Self {
        Self {
            workflow_service,
            workflow_command_service,
        }
    }

    pub async fn add_lab_workflow(&self, lab_workflow: LabWorkflow) -> Result<LabWorkflow> {
        categorized(Entity::LabWorkflowOrchestration, async move {
            Ok(self.workflow_service.add_lab_workflow(lab_workflow).await?)
        })
        .await
    }

    /// A workflow with its commands attached.
    pub async fn retrieve_lab_workflow_by_id(&self, lab_workflow_id: Uuid) -> Result<LabWorkflow> {
        categorized(Entity::LabWorkflowOrchestration, async move {
            let lab_workflow = self
                .workflow_service
                .retrieve_lab_workflow_by_id(lab_workflow_id)
                .await?;
            let commands = self
                .workflow_command_service
                .retrieve_lab_workflow_commands_by_workflow_id(lab_workflow.id)
                .await?;

            Ok(LabWorkflow {
                commands,
                ..lab_workflow
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::brokers::StorageError;
    use crate::brokers::mock::{FixedClock, MemoryStorageBroker};
    use crate::models::{Lab, LabWorkflowCommand};
    use crate::services::{ErrorKind, ServiceError};

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn orchestration(storage: Arc<MemoryStorageBroker>) -> LabWorkflowOrchestrationService {
        let clock = Arc::new(FixedClock::new(now()));
        LabWorkflowOrchestrationService::new(
            LabWorkflowService::new(storage.clone(), clock.clone()),
            LabWorkflowCommandService::new(storage, clock),
        )
    }

    fn workflow_for(lab: &Lab, commands: usize) -> LabWorkflow {
        let id = Uuid::new_v4();
        LabWorkflow {
            id,
            name: "Regression".to_string(),
            owner: "qa".to_string(),
            commands: (0..commands)
                .map(|i| LabWorkflowCommand {
                    id: Uuid::new_v4(),
                    workflow_id: id,
                    lab_id: lab.id,
                    arguments: format!("step {i}"),
                    created_date: now(),
                    updated_date: now(),
                    ..Default::default()
                })
                .collect(),
            created_date: now(),
            updated_date: now(),
            ..Default::default()
        }
    }

    fn lab() -> Lab {
        Lab {
            id: Uuid::new_v4(),
            external_id: "lab-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_retrieve_lab_workflow_attaches_commands() {
        let lab = lab();
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![lab.clone()]));
        let orchestration = orchestration(storage.clone());
        let workflow = workflow_for(&lab, 2);

        orchestration
            .add_lab_workflow(workflow.clone())
            .await
            .unwrap();
        let retrieved = orchestration
            .retrieve_lab_workflow_by_id(workflow.id)
            .await
            .unwrap();

        assert_eq!(retrieved, workflow);
        assert_eq!(
            storage.calls().await,
            vec![
                "insert_lab_workflow",
                "select_lab_workflow_by_id",
                "select_lab_workflow_commands_by_workflow_id",
            ]
        );
    }

    #[tokio::test]
    async fn test_retrieve_unknown_workflow_is_wrapped_not_found() {
        let storage = Arc::new(MemoryStorageBroker::new());

        let err = orchestration(storage.clone())
            .retrieve_lab_workflow_by_id(Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::DependencyValidation {
                entity: Entity::LabWorkflowOrchestration,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            storage
                .call_count("select_lab_workflow_commands_by_workflow_id")
                .await,
            0
        );
    }

    #[tokio::test]
    async fn test_command_storage_failure_is_wrapped_dependency_error() {
        let lab = lab();
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![lab.clone()]));
        let orchestration = orchestration(storage.clone());
        let workflow = workflow_for(&lab, 1);
        orchestration
            .add_lab_workflow(workflow.clone())
            .await
            .unwrap();
        storage
            .fail_on("select_lab_workflow_commands_by_workflow_id", || {
                StorageError::Unavailable(sqlx::Error::PoolClosed)
            })
            .await;

        let err = orchestration
            .retrieve_lab_workflow_by_id(workflow.id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Dependency {
                entity: Entity::LabWorkflowOrchestration,
                critical: true,
                ..
            }
        ));
        assert_eq!(err.innermost().entity(), Entity::LabWorkflowCommand);
    }
}
