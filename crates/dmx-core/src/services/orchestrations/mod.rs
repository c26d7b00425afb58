// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestration services compose foundation services.
//!
//! Errors from a called service are wrapped: input problems become
//! `DependencyValidation`, everything else becomes `Dependency`.

pub mod lab_workflows;
pub mod labs;

pub use lab_workflows::LabWorkflowOrchestrationService;
pub use labs::LabOrchestrationService;
