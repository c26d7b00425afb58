// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Labs reported by the lab-management API.
//!
//! The vendor flattens devices into `Device\property` keys. A device is
//! present when any key carries its prefix:
//!
//! | Prefix | Type | Category |
//! |--------|------|----------|
//! | `Host\` | PC | Host |
//! | `Phone\` | Phone | Attachment |
//! | `HMD\` | HeadMountedDisplay | Attachment |
//!
//! Recognized properties are `name`, `isconnected` and `powerlevel`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{Entity, Result, categorized};
use crate::brokers::LabApiBroker;
use crate::models::{
    ExternalLab, ExternalLabServiceInformation, Lab, LabDevice, LabDeviceCategory,
    LabDeviceStatus, LabDeviceType, LabStatus,
};

const DEVICE_KINDS: [(&str, LabDeviceType, LabDeviceCategory); 3] = [
    ("Host", LabDeviceType::Pc, LabDeviceCategory::Host),
    ("Phone", LabDeviceType::Phone, LabDeviceCategory::Attachment),
    (
        "HMD",
        LabDeviceType::HeadMountedDisplay,
        LabDeviceCategory::Attachment,
    ),
];

/// Reads labs from the lab-management API.
pub struct ExternalLabService {
    lab_api: Arc<dyn LabApiBroker>,
    service_information: ExternalLabServiceInformation,
}

impl ExternalLabService {
    pub fn new(
        lab_api: Arc<dyn LabApiBroker>,
        service_information: ExternalLabServiceInformation,
    ) -> Self {
        Self {
            lab_api,
            service_information,
        }
    }

    /// Every lab the vendor reports, mapped into [`Lab`].
    ///
    /// Returned labs carry no local identity: `id`, `description` and the
    /// dates are left at their defaults.
    pub async fn retrieve_all_external_labs(&self) -> Result<Vec<Lab>> {
        categorized(Entity::ExternalLab, async {
            let collection = self
                .lab_api
                .get_available_labs(&self.service_information)
                .await?;

            debug!(
                count = collection.external_labs.len(),
                "Retrieved external labs"
            );

            Ok(collection.external_labs.iter().map(to_lab).collect())
        })
        .await
    }
}

fn to_lab(external: &ExternalLab) -> Lab {
    Lab {
        external_id: external.id.clone(),
        name: external.name.clone(),
        status: lab_status(external),
        devices: DEVICE_KINDS
            .iter()
            .filter_map(|(prefix, device_type, category)| {
                find_device(external, prefix, *device_type, *category)
            })
            .collect(),
        ..Default::default()
    }
}

fn lab_status(external: &ExternalLab) -> LabStatus {
    match (external.is_connected, external.is_reserved) {
        (false, _) => LabStatus::Offline,
        (true, false) => LabStatus::Available,
        (true, true) => LabStatus::Reserved,
    }
}

fn find_device(
    external: &ExternalLab,
    prefix: &str,
    device_type: LabDeviceType,
    category: LabDeviceCategory,
) -> Option<LabDevice> {
    let key_prefix = format!("{prefix}\\");
    if !external.properties.keys().any(|key| key.contains(&key_prefix)) {
        return None;
    }

    let property = |name: &str| external.properties.get(&format!("{key_prefix}{name}"));

    let status = match property("isconnected").map(|value| value.trim()) {
        Some(value) if value.eq_ignore_ascii_case("true") => LabDeviceStatus::Online,
        Some(value) if value.eq_ignore_ascii_case("false") => LabDeviceStatus::Offline,
        other => {
            warn!(
                lab_id = %external.id,
                device = prefix,
                value = ?other,
                "Unreadable device connection state, treating device as offline"
            );
            LabDeviceStatus::Offline
        }
    };

    let power_level = property("powerlevel").and_then(|value| match value.trim().parse() {
        Ok(level) => Some(level),
        Err(_) => {
            warn!(
                lab_id = %external.id,
                device = prefix,
                value = %value,
                "Unreadable device power level, ignoring it"
            );
            None
        }
    });

    Some(LabDevice {
        name: property("name").cloned(),
        power_level,
        device_type,
        category,
        status,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::brokers::LabApiError;
    use crate::brokers::mock::StaticLabApiBroker;
    use crate::services::{ErrorKind, ServiceError};

    fn service_information() -> ExternalLabServiceInformation {
        ExternalLabServiceInformation {
            service_id: "Bondi-HW-Lab".to_string(),
            service_type: "AzureIotHub".to_string(),
        }
    }

    fn external_lab(id: &str, connected: bool, reserved: bool, props: &[(&str, &str)]) -> ExternalLab {
        ExternalLab {
            id: id.to_string(),
            name: format!("{id} name"),
            is_connected: connected,
            is_reserved: reserved,
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn test_maps_status_from_connection_and_reservation() {
        let broker = Arc::new(StaticLabApiBroker::new(vec![
            external_lab("offline", false, true, &[]),
            external_lab("available", true, false, &[]),
            external_lab("reserved", true, true, &[]),
        ]));
        let service = ExternalLabService::new(broker.clone(), service_information());

        let labs = service.retrieve_all_external_labs().await.unwrap();

        let statuses: Vec<_> = labs.iter().map(|l| (l.external_id.as_str(), l.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("offline", LabStatus::Offline),
                ("available", LabStatus::Available),
                ("reserved", LabStatus::Reserved),
            ]
        );
        assert_eq!(broker.requests().await, vec![service_information()]);
        assert!(labs.iter().all(|l| l.id.is_nil() && l.description.is_empty()));
    }

    #[tokio::test]
    async fn test_maps_devices_from_properties() {
        let broker = Arc::new(StaticLabApiBroker::new(vec![external_lab(
            "lab-1",
            true,
            false,
            &[
                ("Host\\name", "bench-pc"),
                ("Host\\isconnected", "True"),
                ("Phone\\name", "Pixel"),
                ("Phone\\isconnected", "false"),
                ("Phone\\powerlevel", "87"),
            ],
        )]));
        let service = ExternalLabService::new(broker, service_information());

        let labs = service.retrieve_all_external_labs().await.unwrap();
        let devices = &labs[0].devices;

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_type, LabDeviceType::Pc);
        assert_eq!(devices[0].category, LabDeviceCategory::Host);
        assert_eq!(devices[0].name.as_deref(), Some("bench-pc"));
        assert_eq!(devices[0].status, LabDeviceStatus::Online);
        assert_eq!(devices[0].power_level, None);

        assert_eq!(devices[1].device_type, LabDeviceType::Phone);
        assert_eq!(devices[1].category, LabDeviceCategory::Attachment);
        assert_eq!(devices[1].status, LabDeviceStatus::Offline);
        assert_eq!(devices[1].power_level, Some(87));
    }

    #[tokio::test]
    async fn test_unreadable_device_properties_are_tolerated() {
        let broker = Arc::new(StaticLabApiBroker::new(vec![external_lab(
            "lab-1",
            true,
            false,
            &[("HMD\\isconnected", "maybe"), ("HMD\\powerlevel", "full")],
        )]));
        let service = ExternalLabService::new(broker, service_information());

        let labs = service.retrieve_all_external_labs().await.unwrap();
        let device = &labs[0].devices[0];

        assert_eq!(device.device_type, LabDeviceType::HeadMountedDisplay);
        assert_eq!(device.status, LabDeviceStatus::Offline);
        assert_eq!(device.power_level, None);
        assert_eq!(device.name, None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_critical_dependency_error() {
        let broker = Arc::new(StaticLabApiBroker::failing(|| LabApiError::Unauthorized));
        let service = ExternalLabService::new(broker, service_information());

        let err = service.retrieve_all_external_labs().await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Dependency {
                entity: Entity::ExternalLab,
                critical: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_response_is_service_error() {
        let broker = Arc::new(StaticLabApiBroker::failing(|| {
            LabApiError::Decode("expected value at line 1".to_string())
        }));
        let service = ExternalLabService::new(broker, service_information());

        let err = service.retrieve_all_external_labs().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Service);
    }
}
