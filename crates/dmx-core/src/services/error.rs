// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Service error categories.
//!
//! Every service operation fails with a [`ServiceError`] in one of four
//! categories:
//!
//! | Category | Meaning | Caller action |
//! |----------|---------|---------------|
//! | `Validation` | the input is wrong | fix the input |
//! | `DependencyValidation` | a dependency rejected the input | fix the input |
//! | `Dependency` | a dependency failed | retry or escalate |
//! | `Service` | an unexpected failure | escalate |
//!
//! Orchestration services wrap the errors of the services they call, so the
//! original reason stays reachable through [`ServiceError::kind`].

use std::collections::BTreeMap;
use std::error::Error as _;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::brokers::{LabApiError, StorageError};

/// The entity a service operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Entity {
    #[strum(serialize = "Lab")]
    Lab,
    #[strum(serialize = "Lab command")]
    LabCommand,
    #[strum(serialize = "Lab workflow")]
    LabWorkflow,
    #[strum(serialize = "Lab workflow command")]
    LabWorkflowCommand,
    #[strum(serialize = "External lab")]
    ExternalLab,
    #[strum(serialize = "Lab orchestration")]
    LabOrchestration,
    #[strum(serialize = "Lab workflow orchestration")]
    LabWorkflowOrchestration,
}

/// Field name to validation messages.
///
/// Field names follow the JSON wire names, e.g. `createdDate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvalidFields(BTreeMap<String, Vec<String>>);

impl InvalidFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Iterate over fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for InvalidFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

/// Why the input was rejected.
#[derive(Debug, Error)]
pub enum ValidationReason {
    #[error("Invalid input: {0}")]
    Invalid(InvalidFields),
    #[error("Couldn't find item with id: {0}")]
    NotFound(Uuid),
}

/// Why a dependency rejected the input.
#[derive(Debug, Error)]
pub enum DependencyValidationReason {
    #[error("Item with the same key already exists: {0}")]
    AlreadyExists(String),
    #[error("Item is locked, try again later: {0}")]
    Locked(String),
    #[error("Item references a missing or dependent item: {0}")]
    InvalidReference(String),
    #[error(transparent)]
    Upstream(Box<ServiceError>),
}

/// Which dependency failed.
#[derive(Debug, Error)]
pub enum DependencyReason {
    #[error("Failed storage operation")]
    Storage(#[source] StorageError),
    #[error("Failed lab API operation")]
    LabApi(#[source] LabApiError),
    #[error(transparent)]
    Upstream(Box<ServiceError>),
}

/// Unexpected failure inside the service.
#[derive(Debug, Error)]
pub enum ServiceReason {
    #[error("Failed service operation: {0}")]
    Failed(String),
    #[error(transparent)]
    Upstream(Box<ServiceError>),
}

/// Error returned by every service operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{entity} validation error occurred, fix the errors and try again")]
    Validation {
        entity: Entity,
        #[source]
        reason: ValidationReason,
    },

    #[error("{entity} dependency validation error occurred, fix the errors and try again")]
    DependencyValidation {
        entity: Entity,
        #[source]
        reason: DependencyValidationReason,
    },

    #[error("{entity} dependency error occurred, contact support")]
    Dependency {
        entity: Entity,
        critical: bool,
        #[source]
        reason: DependencyReason,
    },

    #[error("{entity} service error occurred, contact support")]
    Service {
        entity: Entity,
        #[source]
        reason: ServiceReason,
    },
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// The innermost reason of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invalid,
    NotFound,
    AlreadyExists,
    Locked,
    InvalidReference,
    Dependency,
    Service,
}

impl ServiceError {
    /// The entity whose service raised this error.
    pub fn entity(&self) -> Entity {
        match self {
            Self::Validation { entity, .. }
            | Self::DependencyValidation { entity, .. }
            | Self::Dependency { entity, .. }
            | Self::Service { entity, .. } => *entity,
        }
    }

    /// The wrapped error, when this one came from a called service.
    pub fn upstream(&self) -> Option<&ServiceError> {
        match self {
            Self::DependencyValidation {
                reason: DependencyValidationReason::Upstream(inner),
                ..
            }
            | Self::Dependency {
                reason: DependencyReason::Upstream(inner),
                ..
            }
            | Self::Service {
                reason: ServiceReason::Upstream(inner),
                ..
            } => Some(inner.as_ref()),
            _ => None,
        }
    }

    /// The service error closest to the original fault.
    pub fn innermost(&self) -> &ServiceError {
        let mut current = self;
        while let Some(inner) = current.upstream() {
            current = inner;
        }
        current
    }

    /// The original reason, looking through wrapping layers.
    pub fn kind(&self) -> ErrorKind {
        match self.innermost() {
            Self::Validation { reason, .. } => match reason {
                ValidationReason::Invalid(_) => ErrorKind::Invalid,
                ValidationReason::NotFound(_) => ErrorKind::NotFound,
            },
            Self::DependencyValidation { reason, .. } => match reason {
                DependencyValidationReason::AlreadyExists(_) => ErrorKind::AlreadyExists,
                DependencyValidationReason::Locked(_) => ErrorKind::Locked,
                DependencyValidationReason::InvalidReference(_)
                | DependencyValidationReason::Upstream(_) => ErrorKind::InvalidReference,
            },
            Self::Dependency { .. } => ErrorKind::Dependency,
            Self::Service { .. } => ErrorKind::Service,
        }
    }

    /// Whether the failure needs immediate operator attention.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Dependency { critical: true, .. })
    }

    /// The rejected fields, if the original reason was invalid input.
    pub fn invalid_fields(&self) -> Option<&InvalidFields> {
        match self.innermost() {
            Self::Validation {
                reason: ValidationReason::Invalid(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    /// A client-facing description of the original reason.
    pub fn detail(&self) -> String {
        let innermost = self.innermost();
        let entity = innermost.entity().to_string().to_lowercase();
        match innermost {
            Self::Validation {
                reason: ValidationReason::Invalid(_),
                ..
            } => format!("Invalid {entity}, fix the errors and try again"),
            Self::Validation {
                reason: ValidationReason::NotFound(id),
                ..
            } => format!("Couldn't find {entity} with id: {id}"),
            Self::DependencyValidation {
                reason: DependencyValidationReason::AlreadyExists(_),
                ..
            } => format!("{} with the same id already exists", innermost.entity()),
            Self::DependencyValidation {
                reason: DependencyValidationReason::Locked(_),
                ..
            } => format!("Locked {entity} error occurred, please try again"),
            Self::DependencyValidation { .. } => {
                format!("Invalid {entity} reference error occurred")
            }
            Self::Dependency { .. } | Self::Service { .. } => innermost.to_string(),
        }
    }
}

/// A failure raised inside a service before it is categorized.
#[derive(Debug, Error)]
pub(crate) enum Fault {
    #[error("{0}")]
    Invalid(InvalidFields),
    #[error("not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    LabApi(#[from] LabApiError),
    #[error(transparent)]
    Upstream(#[from] ServiceError),
}

/// Turn a fault into a categorized error and log it.
pub(crate) fn categorize(entity: Entity, fault: Fault) -> ServiceError {
    let error = match fault {
        Fault::Invalid(fields) => ServiceError::Validation {
            entity,
            reason: ValidationReason::Invalid(fields),
        },
        Fault::NotFound(id) => ServiceError::Validation {
            entity,
            reason: ValidationReason::NotFound(id),
        },
        Fault::Storage(err) => match err {
            StorageError::DuplicateKey(message) => ServiceError::DependencyValidation {
                entity,
                reason: DependencyValidationReason::AlreadyExists(message),
            },
            StorageError::ForeignKey(message) => ServiceError::DependencyValidation {
                entity,
                reason: DependencyValidationReason::InvalidReference(message),
            },
            StorageError::Locked(message) => ServiceError::DependencyValidation {
                entity,
                reason: DependencyValidationReason::Locked(message),
            },
            err => ServiceError::Dependency {
                entity,
                critical: err.is_critical(),
                reason: DependencyReason::Storage(err),
            },
        },
        Fault::LabApi(err) => match err {
            LabApiError::Decode(message) => ServiceError::Service {
                entity,
                reason: ServiceReason::Failed(message),
            },
            err => ServiceError::Dependency {
                entity,
                critical: err.is_critical(),
                reason: DependencyReason::LabApi(err),
            },
        },
        Fault::Upstream(inner) => {
            let critical = inner.is_critical();
            match inner {
                ServiceError::Validation { .. } | ServiceError::DependencyValidation { .. } => {
                    ServiceError::DependencyValidation {
                        entity,
                        reason: DependencyValidationReason::Upstream(Box::new(inner)),
                    }
                }
                ServiceError::Dependency { .. } | ServiceError::Service { .. } => {
                    ServiceError::Dependency {
                        entity,
                        critical,
                        reason: DependencyReason::Upstream(Box::new(inner)),
                    }
                }
            }
        }
    };

    log_error(&error);
    error
}

/// Run a service operation and categorize its fault.
pub(crate) async fn categorized<T>(
    entity: Entity,
    operation: impl Future<Output = std::result::Result<T, Fault>>,
) -> Result<T> {
    operation.await.map_err(|fault| categorize(entity, fault))
}

fn log_error(error: &ServiceError) {
    let cause = cause_chain(error);
    if error.is_critical() {
        error!(
            critical = true,
            entity = %error.entity(),
            kind = ?error.kind(),
            cause = %cause,
            "{}", error
        );
    } else {
        error!(
            entity = %error.entity(),
            kind = ?error.kind(),
            cause = %cause,
            "{}", error
        );
    }
}

fn cause_chain(error: &ServiceError) -> String {
    let mut parts = Vec::new();
    let mut source = error.source();
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}
