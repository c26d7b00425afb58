// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire models of the external lab-management API.
//!
//! The vendor speaks PascalCase JSON and describes devices as flat
//! `Device\property` keys inside `Properties`, e.g. `Phone\powerlevel`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifies which vendor service to query for labs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExternalLabServiceInformation {
    /// Vendor service identifier.
    pub service_id: String,
    /// Vendor service type.
    pub service_type: String,
}

/// A lab as reported by the vendor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalLab {
    /// Vendor-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the host is connected.
    pub is_connected: bool,
    /// Whether the lab is reserved.
    pub is_reserved: bool,
    /// Flat device properties.
    pub properties: HashMap<String, String>,
}

/// Response body of the available-labs call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalLabCollection {
    /// Labs known to the vendor service.
    pub external_labs: Vec<ExternalLab>,
}
