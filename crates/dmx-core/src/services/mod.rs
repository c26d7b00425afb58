// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Services.
//!
//! Foundation services validate and persist one entity each. Orchestration
//! services in [`orchestrations`] combine them. Every operation returns a
//! categorized [`ServiceError`] and logs it before returning.

pub mod error;
pub mod external_labs;
pub mod lab_commands;
pub mod lab_workflow_commands;
pub mod lab_workflows;
pub mod labs;
pub mod orchestrations;
mod validation;

pub use error::{
    DependencyReason, DependencyValidationReason, Entity, ErrorKind, InvalidFields, ServiceError,
    ServiceReason, ValidationReason,
};
pub use external_labs::ExternalLabService;
pub use lab_commands::LabCommandService;
pub use lab_workflow_commands::LabWorkflowCommandService;
pub use lab_workflows::LabWorkflowService;
pub use labs::LabService;
pub use validation::RECENT_WINDOW_SECS;
pub use orchestrations::{LabOrchestrationService, LabWorkflowOrchestrationService};
