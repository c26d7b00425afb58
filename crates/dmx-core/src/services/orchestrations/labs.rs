// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab orchestration.
//!
//! Merges the labs the vendor reports with the labs stored locally:
//!
//! 1. A reported lab with a stored counterpart (same `external_id`) keeps
//!    the stored id, description and dates, and takes the reported name,
//!    status and devices.
//! 2. A reported lab without one is stored as a new lab.
//! 3. A stored lab that is no longer reported is returned as offline.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Lab, LabDevice, LabStatus};
use crate::services::error::{Entity, ErrorKind, Fault, Result, categorized};
use crate::services::external_labs::ExternalLabService;
use crate::services::labs::LabService;

/// Composes the external lab and lab services.
pub struct LabOrchestrationService {
    lab_service: LabService,
    external_lab_service: ExternalLabService,
}

impl LabOrchestrationService {
    pub fn new(lab_service: LabService, external_lab_service: ExternalLabService) -> Self {
        Self {
            lab_service,
            external_lab_service,
        }
    }

    pub async fn add_lab(&self, lab: Lab) -> Result<Lab> {
        categorized(Entity::LabOrchestration, async move {
            Ok(self.lab_service.add_lab(lab).await?)
        })
        .await
    }

    /// Reconciled view of reported and stored labs.
    pub async fn retrieve_all_labs(&self) -> Result<Vec<Lab>> {
        categorized(Entity::LabOrchestration, async {
            let external_labs = self.external_lab_service.retrieve_all_external_labs().await?;
            let stored_labs = self.lab_service.retrieve_all_labs_with_devices().await?;

            let mut labs = Vec::with_capacity(external_labs.len().max(stored_labs.len()));
            let mut reported = HashSet::new();

            for external in external_labs {
                if external.external_id.trim().is_empty() || external.name.trim().is_empty() {
                    warn!(
                        external_id = %external.external_id,
                        "Skipping reported lab without id or name"
                    );
                    continue;
                }
                if !reported.insert(external.external_id.clone()) {
                    warn!(external_id = %external.external_id, "Skipping duplicate reported lab");
                    continue;
                }

                let lab = match stored_labs
                    .iter()
                    .find(|stored| stored.external_id == external.external_id)
                {
                    Some(stored) => merge(stored, external),
                    None => self.register(external).await?,
                };
                labs.push(lab);
            }

            labs.extend(
                stored_labs
                    .into_iter()
                    .filter(|stored| !reported.contains(&stored.external_id))
                    .map(|stored| Lab {
                        status: LabStatus::Offline,
                        ..stored
                    }),
            );

            Ok(labs)
        })
        .await
    }

    pub async fn retrieve_lab_by_id(&self, lab_id: Uuid) -> Result<Lab> {
        categorized(Entity::LabOrchestration, async move {
            Ok(self.lab_service.retrieve_lab_by_id(lab_id).await?)
        })
        .await
    }

    pub async fn remove_lab_by_id(&self, lab_id: Uuid) -> Result<Lab> {
        categorized(Entity::LabOrchestration, async move {
            Ok(self.lab_service.remove_lab_by_id(lab_id).await?)
        })
        .await
    }

    /// Store a reported lab seen for the first time.
    async fn register(&self, external: Lab) -> std::result::Result<Lab, Fault> {
        let lab = Lab {
            id: Uuid::new_v4(),
            description: external.name.clone(),
            devices: external
                .devices
                .into_iter()
                .map(|device| LabDevice {
                    id: Uuid::new_v4(),
                    ..device
                })
                .collect(),
            ..external
        };

        match self.lab_service.add_lab(lab.clone()).await {
            Ok(added) => {
                info!(lab_id = %added.id, external_id = %added.external_id, "Registered reported lab");
                Ok(added)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                // Another request stored the same lab first.
                match self
                    .lab_service
                    .retrieve_lab_by_external_id(&lab.external_id)
                    .await?
                {
                    Some(stored) => Ok(merge(&stored, lab)),
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Stored identity with reported state.
fn merge(stored: &Lab, reported: Lab) -> Lab {
    let devices = reported
        .devices
        .into_iter()
        .map(|device| {
            let id = stored
                .devices
                .iter()
                .find(|known| {
                    known.device_type == device.device_type && known.category == device.category
                })
                .map_or_else(Uuid::new_v4, |known| known.id);
            LabDevice {
                id,
                lab_id: stored.id,
                ..device
            }
        })
        .collect();

    Lab {
        id: stored.id,
        external_id: stored.external_id.clone(),
        name: reported.name,
        description: stored.description.clone(),
        status: reported.status,
        devices,
        created_date: stored.created_date,
        updated_date: stored.updated_date,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::brokers::mock::{FixedClock, MemoryStorageBroker, StaticLabApiBroker};
    use crate::brokers::{LabApiError, StorageError};
    use crate::models::{
        ExternalLab, ExternalLabServiceInformation, LabDeviceCategory, LabDeviceType,
    };
    use crate::services::ServiceError;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn orchestration(
        storage: Arc<MemoryStorageBroker>,
        lab_api: Arc<StaticLabApiBroker>,
    ) -> LabOrchestrationService {
        let clock = Arc::new(FixedClock::new(now()));
        LabOrchestrationService::new(
            LabService::new(storage, clock),
            ExternalLabService::new(
                lab_api,
                ExternalLabServiceInformation {
                    service_id: "Bondi-HW-Lab".to_string(),
                    service_type: "AzureIotHub".to_string(),
                },
            ),
        )
    }

    fn external(id: &str, name: &str, connected: bool) -> ExternalLab {
        ExternalLab {
            id: id.to_string(),
            name: name.to_string(),
            is_connected: connected,
            is_reserved: false,
            properties: HashMap::from([("Phone\\isconnected".to_string(), "true".to_string())]),
        }
    }

    fn stored(external_id: &str) -> Lab {
        let id = Uuid::new_v4();
        Lab {
            id,
            external_id: external_id.to_string(),
            name: "Old name".to_string(),
            description: "Kept description".to_string(),
            status: LabStatus::Available,
            devices: vec![LabDevice {
                id: Uuid::new_v4(),
                lab_id: id,
                device_type: LabDeviceType::Phone,
                category: LabDeviceCategory::Attachment,
                ..Default::default()
            }],
            created_date: now(),
            updated_date: now(),
        }
    }

    #[tokio::test]
    async fn test_matched_lab_keeps_identity_and_takes_reported_state() {
        let known = stored("lab-1");
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![known.clone()]));
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![external(
            "lab-1", "New name", true,
        )]));

        let labs = orchestration(storage.clone(), lab_api)
            .retrieve_all_labs()
            .await
            .unwrap();

        assert_eq!(labs.len(), 1);
        let lab = &labs[0];
        assert_eq!(lab.id, known.id);
        assert_eq!(lab.description, "Kept description");
        assert_eq!(lab.name, "New name");
        assert_eq!(lab.status, LabStatus::Available);
        assert_eq!(lab.devices[0].id, known.devices[0].id);
        assert_eq!(lab.devices[0].lab_id, known.id);
        assert_eq!(storage.call_count("insert_lab").await, 0);
    }

    #[tokio::test]
    async fn test_newly_reported_device_gets_an_id() {
        let known = Lab {
            devices: Vec::new(),
            ..stored("lab-1")
        };
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![known.clone()]));
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![]));
        let orchestration = orchestration(storage, lab_api.clone());

        let labs = orchestration.retrieve_all_labs().await.unwrap();
        assert!(labs[0].devices.is_empty());

        lab_api
            .set_labs(vec![external("lab-1", "Bench 1", true)])
            .await;
        let labs = orchestration.retrieve_all_labs().await.unwrap();

        let device = &labs[0].devices[0];
        assert_eq!(device.device_type, LabDeviceType::Phone);
        assert!(!device.id.is_nil());
        assert_eq!(device.lab_id, known.id);
    }

    #[tokio::test]
    async fn test_unmatched_reported_lab_is_stored() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![external(
            "lab-2", "Bench 2", false,
        )]));

        let labs = orchestration(storage.clone(), lab_api)
            .retrieve_all_labs()
            .await
            .unwrap();

        assert_eq!(labs.len(), 1);
        let lab = &labs[0];
        assert!(!lab.id.is_nil());
        assert_eq!(lab.external_id, "lab-2");
        assert_eq!(lab.description, "Bench 2");
        assert_eq!(lab.status, LabStatus::Offline);
        assert_eq!(lab.created_date, now());
        assert!(!lab.devices[0].id.is_nil());
        assert_eq!(storage.labs().await, labs);
    }

    #[tokio::test]
    async fn test_unreported_stored_lab_is_offline() {
        let known = stored("lab-gone");
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![known.clone()]));
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![]));

        let labs = orchestration(storage, lab_api)
            .retrieve_all_labs()
            .await
            .unwrap();

        assert_eq!(
            labs,
            vec![Lab {
                status: LabStatus::Offline,
                ..known
            }]
        );
    }

    #[tokio::test]
    async fn test_reconciliation_order_and_duplicates() {
        let known_a = stored("a");
        let known_c = stored("c");
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![
            known_a.clone(),
            known_c.clone(),
        ]));
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![
            external("b", "B", true),
            external("a", "A", true),
            external("b", "B again", true),
            external("", "nameless", true),
        ]));

        let labs = orchestration(storage.clone(), lab_api)
            .retrieve_all_labs()
            .await
            .unwrap();

        let ids: Vec<_> = labs.iter().map(|l| l.external_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(labs[2].status, LabStatus::Offline);
        assert_eq!(storage.call_count("insert_lab").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_without_stored_lab_fails() {
        let storage = Arc::new(MemoryStorageBroker::new());
        storage
            .fail_on("insert_lab", || {
                StorageError::DuplicateKey("labs_pkey".to_string())
            })
            .await;
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![external(
            "lab-3", "Bench 3", true,
        )]));

        let err = orchestration(storage.clone(), lab_api)
            .retrieve_all_labs()
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::DependencyValidation { .. }));
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(storage.call_count("select_lab_by_external_id").await, 1);
    }

    #[tokio::test]
    async fn test_register_uses_stored_lab_when_insert_races() {
        let winner = stored("lab-4");
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![winner.clone()]));
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![]));
        let orchestration = orchestration(storage.clone(), lab_api);

        let reported = Lab {
            external_id: "lab-4".to_string(),
            name: "Bench 4".to_string(),
            status: LabStatus::Reserved,
            ..Default::default()
        };
        let lab = orchestration.register(reported).await.unwrap();

        assert_eq!(lab.id, winner.id);
        assert_eq!(lab.name, "Bench 4");
        assert_eq!(lab.status, LabStatus::Reserved);
        assert_eq!(storage.call_count("select_lab_by_external_id").await, 1);
    }

    #[tokio::test]
    async fn test_lab_api_failure_is_wrapped_as_dependency_error() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab_api = Arc::new(StaticLabApiBroker::failing(|| LabApiError::Forbidden));

        let err = orchestration(storage.clone(), lab_api)
            .retrieve_all_labs()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Dependency {
                entity: Entity::LabOrchestration,
                critical: true,
                ..
            }
        ));
        assert_eq!(err.innermost().entity(), Entity::ExternalLab);
        assert!(storage.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_lab_validation_is_wrapped_as_dependency_validation() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![]));

        let err = orchestration(storage, lab_api)
            .add_lab(Lab::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::DependencyValidation {
                entity: Entity::LabOrchestration,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_remove_lab_by_id_wraps_not_found() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab_api = Arc::new(StaticLabApiBroker::new(vec![]));

        let err = orchestration(storage, lab_api)
            .remove_lab_by_id(Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::DependencyValidation { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
