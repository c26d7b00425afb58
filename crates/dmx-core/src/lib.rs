// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! DMX Core - Hardware Lab Management API
//!
//! This crate manages hardware test labs: rigs made of a host PC with
//! attached phones and head-mounted displays. It keeps lab state in sync
//! with an external lab-management API and records commands and workflows
//! issued against labs.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     HTTP API (axum)                        │
//! │          /api/labs  /api/labcommands  /api/labworkflows    │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Orchestration services                     │
//! │     lab reconciliation        workflow + commands          │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Foundation services                       │
//! │   external labs   labs   lab commands   workflows ...      │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────┐ ┌────────────────────┐ ┌──────────────┐
//! │  StorageBroker   │ │   LabApiBroker     │ │ DateTime-    │
//! │  (PostgreSQL)    │ │  (lab-mgmt HTTP)   │ │ Broker       │
//! └──────────────────┘ └────────────────────┘ └──────────────┘
//! ```
//!
//! Foundation services validate one entity and categorize every failure as
//! validation, dependency validation, dependency or service error (see
//! [`services::ServiceError`]). Orchestration services wrap those errors
//! and the API maps the original reason to a status code.
//!
//! # Configuration
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `DMX_DATABASE_URL` | yes | |
//! | `DMX_DATABASE_MAX_CONNECTIONS` | no | `10` |
//! | `DMX_HTTP_PORT` | no | `8080` |
//! | `DMX_LAB_API_URL` | yes | |
//! | `DMX_LAB_API_ACCESS_KEY` | no | empty |
//! | `DMX_LAB_API_SERVICE_ID` | no | `Bondi-HW-Lab` |
//! | `DMX_LAB_API_SERVICE_TYPE` | no | `AzureIotHub` |
//! | `DMX_LAB_API_TIMEOUT_SECS` | no | `30` |
//!
//! # Modules
//!
//! - [`api`] - HTTP routes and error mapping
//! - [`services`] - Foundation and orchestration services
//! - [`brokers`] - Storage, lab API and clock adapters
//! - [`models`] - Domain and wire models
//! - [`server`] - Process startup
//! - [`config`] - Configuration from environment
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Startup error types

pub mod api;
pub mod brokers;
pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::{Error, Result};
