// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for server startup.
//!
//! Request-level failures are [`crate::services::ServiceError`]; this type
//! only covers what can stop the process from serving.

use thiserror::Error;

/// Startup errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Connecting to the database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The lab API client could not be built.
    #[error("Lab API error: {0}")]
    LabApi(#[from] crate::brokers::LabApiError),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using the startup [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
