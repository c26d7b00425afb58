// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab foundation service.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::error::{Entity, Fault, Result, categorized};
use super::validation::Validator;
use crate::brokers::{DateTimeBroker, StorageBroker};
use crate::models::Lab;

/// Validates and persists labs.
pub struct LabService {
    storage: Arc<dyn StorageBroker>,
    clock: Arc<dyn DateTimeBroker>,
}

impl LabService {
    pub fn new(storage: Arc<dyn StorageBroker>, clock: Arc<dyn DateTimeBroker>) -> Self {
        Self { storage, clock }
    }

    /// Store a new lab with its devices.
    ///
    /// Both dates are stamped from the clock. Devices are attached to the
    /// lab and receive fresh ids when they have none.
    pub async fn add_lab(&self, lab: Lab) -> Result<Lab> {
        categorized(Entity::Lab, async move {
            validate_lab_on_add(&lab)?;

            let now = self.clock.current_date_time();
            let mut lab = Lab {
                created_date: now,
                updated_date: now,
                ..lab
            };
            for device in &mut lab.devices {
                device.lab_id = lab.id;
                if device.id.is_nil() {
                    device.id = Uuid::new_v4();
                }
            }

            let added = self.storage.insert_lab(&lab).await?;
            info!(lab_id = %added.id, external_id = %added.external_id, "Lab added");
            Ok(added)
        })
        .await
    }

    /// Every stored lab with its devices.
    pub async fn retrieve_all_labs_with_devices(&self) -> Result<Vec<Lab>> {
        categorized(Entity::Lab, async {
            Ok(self.storage.select_all_labs_with_devices().await?)
        })
        .await
    }

    pub async fn retrieve_lab_by_id(&self, lab_id: Uuid) -> Result<Lab> {
        categorized(Entity::Lab, async move {
            Validator::new().require_id("id", lab_id).finish()?;

            self.storage
                .select_lab_by_id(lab_id)
                .await?
                .ok_or(Fault::NotFound(lab_id))
        })
        .await
    }

    /// The stored lab linked to a vendor record, if any.
    pub async fn retrieve_lab_by_external_id(&self, external_id: &str) -> Result<Option<Lab>> {
        categorized(Entity::Lab, async move {
            Validator::new()
                .require_text("externalId", external_id)
                .finish()?;

            Ok(self.storage.select_lab_by_external_id(external_id).await?)
        })
        .await
    }

    /// Delete a lab and its devices, returning what was deleted.
    pub async fn remove_lab_by_id(&self, lab_id: Uuid) -> Result<Lab> {
        categorized(Entity::Lab, async move {
            Validator::new().require_id("id", lab_id).finish()?;

            let lab = self
                .storage
                .select_lab_by_id(lab_id)
                .await?
                .ok_or(Fault::NotFound(lab_id))?;

            let removed = self.storage.delete_lab(&lab).await?;
            info!(lab_id = %removed.id, "Lab removed");
            Ok(removed)
        })
        .await
    }
}

fn validate_lab_on_add(lab: &Lab) -> std::result::Result<(), Fault> {
    let mut validator = Validator::new();
    validator
        .require_id("id", lab.id)
        .require_text("externalId", &lab.external_id)
        .require_text("name", &lab.name)
        .require_text("description", &lab.description)
        .require_recognized("status", lab.status.is_recognized());

    for (index, device) in lab.devices.iter().enumerate() {
        validator
            .scope(format!("devices[{index}]."))
            .require_recognized("type", device.device_type.is_recognized())
            .require_recognized("category", device.category.is_recognized())
            .require_recognized("status", device.status.is_recognized());
    }

    validator.scope("").finish()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::brokers::StorageError;
    use crate::brokers::mock::{FixedClock, MemoryStorageBroker};
    use crate::models::{LabDevice, LabDeviceType, LabStatus};
    use crate::services::{ErrorKind, ServiceError};

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn random_lab() -> Lab {
        Lab {
            id: Uuid::new_v4(),
            external_id: format!("ext-{}", Uuid::new_v4()),
            name: "Bench".to_string(),
            description: "Bench lab".to_string(),
            status: LabStatus::Available,
            devices: vec![LabDevice {
                device_type: LabDeviceType::Phone,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn service(storage: Arc<MemoryStorageBroker>) -> LabService {
        LabService::new(storage, Arc::new(FixedClock::new(now())))
    }

    #[tokio::test]
    async fn test_add_lab_stamps_dates_and_device_ids() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab = random_lab();

        let added = service(storage.clone()).add_lab(lab.clone()).await.unwrap();

        assert_eq!(added.id, lab.id);
        assert_eq!(added.created_date, now());
        assert_eq!(added.updated_date, now());
        assert_eq!(added.devices[0].lab_id, lab.id);
        assert!(!added.devices[0].id.is_nil());
        assert_eq!(storage.labs().await, vec![added]);
    }

    #[tokio::test]
    async fn test_add_lab_rejects_missing_fields_without_touching_storage() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let lab = Lab {
            name: " ".to_string(),
            ..Default::default()
        };

        let err = service(storage.clone()).add_lab(lab).await.unwrap_err();

        let fields = err.invalid_fields().unwrap();
        assert_eq!(fields.get("id").unwrap(), ["Id is required"]);
        assert_eq!(fields.get("externalId").unwrap(), ["Text is required"]);
        assert_eq!(fields.get("name").unwrap(), ["Text is required"]);
        assert_eq!(fields.get("description").unwrap(), ["Text is required"]);
        assert!(storage.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_lab_rejects_unknown_lab_and_device_values() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let mut lab = random_lab();
        lab.status = LabStatus::Unrecognized;
        lab.devices.push(LabDevice {
            device_type: LabDeviceType::Unrecognized,
            ..Default::default()
        });

        let err = service(storage.clone()).add_lab(lab).await.unwrap_err();

        let fields = err.invalid_fields().unwrap();
        assert_eq!(fields.get("status").unwrap(), ["Value is not recognized"]);
        assert_eq!(
            fields.get("devices[1].type").unwrap(),
            ["Value is not recognized"]
        );
        assert!(fields.get("devices[0].type").is_none());
        assert!(storage.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_lab_is_already_exists() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let service = service(storage);
        let lab = random_lab();
        service.add_lab(lab.clone()).await.unwrap();

        let err = service.add_lab(lab).await.unwrap_err();

        assert!(matches!(err, ServiceError::DependencyValidation { entity: Entity::Lab, .. }));
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_retrieve_lab_by_id_not_found() {
        let storage = Arc::new(MemoryStorageBroker::new());
        let id = Uuid::new_v4();

        let err = service(storage).retrieve_lab_by_id(id).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation { entity: Entity::Lab, .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_retrieve_lab_by_nil_id_is_invalid() {
        let storage = Arc::new(MemoryStorageBroker::new());

        let err = service(storage.clone())
            .retrieve_lab_by_id(Uuid::nil())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(storage.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_lab_by_id_deletes_stored_lab() {
        let lab = random_lab();
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![lab.clone()]));

        let removed = service(storage.clone()).remove_lab_by_id(lab.id).await.unwrap();

        assert_eq!(removed, lab);
        assert!(storage.labs().await.is_empty());
        assert_eq!(storage.calls().await, vec!["select_lab_by_id", "delete_lab"]);
    }

    #[tokio::test]
    async fn test_retrieve_lab_by_external_id() {
        let lab = random_lab();
        let storage = Arc::new(MemoryStorageBroker::with_labs(vec![lab.clone()]));
        let service = service(storage);

        assert_eq!(
            service.retrieve_lab_by_external_id(&lab.external_id).await.unwrap(),
            Some(lab)
        );
        assert_eq!(service.retrieve_lab_by_external_id("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_outage_is_critical_dependency_error() {
        let storage = Arc::new(MemoryStorageBroker::new());
        storage
            .fail_on("select_all_labs_with_devices", || {
                StorageError::Unavailable(sqlx::Error::PoolTimedOut)
            })
            .await;

        let err = service(storage)
            .retrieve_all_labs_with_devices()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Dependency {
                entity: Entity::Lab,
                critical: true,
                ..
            }
        ));
    }
}
