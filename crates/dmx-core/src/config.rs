// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for dmx-core.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::models::ExternalLabServiceInformation;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_SERVICE_ID: &str = "Bondi-HW-Lab";
const DEFAULT_SERVICE_TYPE: &str = "AzureIotHub";
const DEFAULT_LAB_API_TIMEOUT_SECS: u64 = 30;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound of the connection pool.
    pub database_max_connections: u32,
    /// HTTP listen address.
    pub http_addr: SocketAddr,
    /// Lab-management API settings.
    pub lab_api: LabApiConfig,
}

/// Lab-management API settings.
#[derive(Clone)]
pub struct LabApiConfig {
    /// Base URL, without the `/api/...` suffix.
    pub url: String,
    /// Bearer token. Empty disables the `Authorization` header.
    pub access_key: String,
    /// Vendor service to query.
    pub service_id: String,
    /// Vendor service type.
    pub service_type: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl LabApiConfig {
    /// Request payload identifying the vendor service.
    pub fn service_information(&self) -> ExternalLabServiceInformation {
        ExternalLabServiceInformation {
            service_id: self.service_id.clone(),
            service_type: self.service_type.clone(),
        }
    }
}

impl fmt::Debug for LabApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabApiConfig")
            .field("url", &self.url)
            .field("access_key", &"<redacted>")
            .field("service_id", &self.service_id)
            .field("service_type", &self.service_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DMX_DATABASE_URL")?;
        let database_max_connections =
            parsed("DMX_DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        let port: u16 = parsed("DMX_HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let http_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let lab_api = LabApiConfig {
            url: required("DMX_LAB_API_URL")?,
            access_key: std::env::var("DMX_LAB_API_ACCESS_KEY").unwrap_or_default(),
            service_id: std::env::var("DMX_LAB_API_SERVICE_ID")
                .unwrap_or_else(|_| DEFAULT_SERVICE_ID.to_string()),
            service_type: std::env::var("DMX_LAB_API_SERVICE_TYPE")
                .unwrap_or_else(|_| DEFAULT_SERVICE_TYPE.to_string()),
            timeout: Duration::from_secs(parsed(
                "DMX_LAB_API_TIMEOUT_SECS",
                DEFAULT_LAB_API_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            http_addr,
            lab_api,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name)),
    }
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// An environment variable could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}
