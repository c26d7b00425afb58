// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Brokers wrap external dependencies behind traits.
//!
//! Each broker is a thin adapter: no validation and no business rules.
//!
//! - [`StorageBroker`]: relational storage ([`PostgresStorageBroker`])
//! - [`LabApiBroker`]: the lab-management HTTP API ([`HttpLabApiBroker`])
//! - [`DateTimeBroker`]: the clock ([`SystemClock`])
//!
//! [`mock`] holds in-memory implementations for tests.

pub mod clock;
pub mod lab_api;
pub mod mock;
pub mod postgres;
pub mod storage;

pub use clock::{DateTimeBroker, SystemClock};
pub use lab_api::{HttpLabApiBroker, LabApiBroker, LabApiError};
pub use postgres::PostgresStorageBroker;
pub use storage::{StorageBroker, StorageError};
