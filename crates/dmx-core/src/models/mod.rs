// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Domain and wire models.

pub mod external_labs;
pub mod lab_commands;
pub mod lab_workflows;
pub mod labs;

pub use external_labs::{ExternalLab, ExternalLabCollection, ExternalLabServiceInformation};
pub use lab_commands::{CommandStatus, CommandType, LabCommand};
pub use lab_workflows::{LabWorkflow, LabWorkflowCommand, WorkflowStatus};
pub use labs::{Lab, LabDevice, LabDeviceCategory, LabDeviceStatus, LabDeviceType, LabStatus};

use serde::{Deserialize, Deserializer};

/// Read an explicit JSON `null` as the field's default.
///
/// Missing fields already default through `#[serde(default)]`; this covers
/// clients that send `null`, so the validators see an empty value instead of
/// the request failing to parse.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
