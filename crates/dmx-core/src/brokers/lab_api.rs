// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! External lab-management API broker.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::LabApiConfig;
use crate::models::{ExternalLabCollection, ExternalLabServiceInformation};

/// Errors from the lab-management API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LabApiError {
    /// The configured endpoint does not exist.
    #[error("Lab API endpoint not found: {url}")]
    UrlNotFound { url: String },

    /// The access key was rejected.
    #[error("Lab API rejected the access key")]
    Unauthorized,

    /// The access key is not allowed to list labs.
    #[error("Lab API denied access")]
    Forbidden,

    /// Any other non-success status.
    #[error("Lab API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("Lab API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not a lab collection.
    #[error("Lab API returned an unreadable body: {0}")]
    Decode(String),
}

impl LabApiError {
    /// Whether the failure points at broken configuration rather than a transient fault.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::UrlNotFound { .. } | Self::Unauthorized | Self::Forbidden
        )
    }
}

/// Access to the lab-management API.
#[async_trait]
pub trait LabApiBroker: Send + Sync {
    /// Labs currently known to the given vendor service.
    async fn get_available_labs(
        &self,
        service_information: &ExternalLabServiceInformation,
    ) -> Result<ExternalLabCollection, LabApiError>;
}

/// HTTP implementation of [`LabApiBroker`].
pub struct HttpLabApiBroker {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl HttpLabApiBroker {
    /// Build a broker from configuration.
    pub fn new(config: &LabApiConfig) -> Result<Self, LabApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
        })
    }
}

#[async_trait]
impl LabApiBroker for HttpLabApiBroker {
    async fn get_available_labs(
        &self,
        service_information: &ExternalLabServiceInformation,
    ) -> Result<ExternalLabCollection, LabApiError> {
        let url = format!("{}/api/labs/available", self.base_url);
        debug!(url = %url, service_id = %service_information.service_id, "Requesting available labs");

        let mut request = self.client.post(&url).json(service_information);
        if !self.access_key.is_empty() {
            request = request.bearer_auth(&self.access_key);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(LabApiError::UrlNotFound { url }),
            StatusCode::UNAUTHORIZED => return Err(LabApiError::Unauthorized),
            StatusCode::FORBIDDEN => return Err(LabApiError::Forbidden),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(LabApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LabApiError::Decode(e.to_string()))
    }
}
