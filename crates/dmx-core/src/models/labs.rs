// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lab and lab device models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Availability of a lab as last reported by the lab-management API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum LabStatus {
    /// Connected and free to reserve.
    Available,
    /// Connected and reserved by someone.
    Reserved,
    /// Not connected.
    #[default]
    Offline,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

/// Kind of hardware a device represents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum LabDeviceType {
    /// Host PC driving the lab.
    #[default]
    #[serde(rename = "PC")]
    #[strum(serialize = "PC")]
    Pc,
    /// Phone attached to the host.
    Phone,
    /// Head-mounted display attached to the host.
    HeadMountedDisplay,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

/// Role of a device inside a lab.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum LabDeviceCategory {
    /// The machine every attachment hangs off.
    #[default]
    Host,
    /// Peripheral device.
    Attachment,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

/// Connectivity of a single device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum LabDeviceStatus {
    /// Device reports itself connected.
    Online,
    /// Device is disconnected or did not report.
    #[default]
    Offline,
    /// Unknown value received over the wire.
    #[serde(other)]
    Unrecognized,
}

impl LabStatus {
    /// Whether this is one of the known states.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

impl LabDeviceType {
    /// Whether this is one of the known device kinds.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

impl LabDeviceCategory {
    /// Whether this is one of the known roles.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

impl LabDeviceStatus {
    /// Whether this is one of the known states.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }
}

/// A hardware test rig.
///
/// `external_id` links the lab to the record kept by the lab-management API
/// and is the key used when reconciling the two.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lab {
    /// Local primary key.
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: Uuid,
    /// Vendor-assigned identifier.
    #[serde(deserialize_with = "super::null_as_default")]
    pub external_id: String,
    /// Display name.
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
    /// Free-form description.
    #[serde(deserialize_with = "super::null_as_default")]
    pub description: String,
    /// Current availability.
    #[serde(deserialize_with = "super::null_as_default")]
    pub status: LabStatus,
    /// Devices owned by this lab.
    #[serde(deserialize_with = "super::null_as_default")]
    pub devices: Vec<LabDevice>,
    /// When the lab was first stored.
    #[serde(deserialize_with = "super::null_as_default")]
    pub created_date: DateTime<Utc>,
    /// When the lab was last stored.
    #[serde(deserialize_with = "super::null_as_default")]
    pub updated_date: DateTime<Utc>,
}

/// A device that belongs to exactly one lab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabDevice {
    /// Local primary key.
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: Uuid,
    /// Owning lab.
    #[serde(deserialize_with = "super::null_as_default")]
    pub lab_id: Uuid,
    /// Device name, when the vendor reports one.
    pub name: Option<String>,
    /// Battery level in percent, when the device has one.
    pub power_level: Option<i32>,
    /// Hardware kind.
    #[serde(rename = "type", deserialize_with = "super::null_as_default")]
    pub device_type: LabDeviceType,
    /// Role inside the lab.
    #[serde(deserialize_with = "super::null_as_default")]
    pub category: LabDeviceCategory,
    /// Connectivity.
    #[serde(deserialize_with = "super::null_as_default")]
    pub status: LabDeviceStatus,
}
