// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test utilities for dmx-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{Router, body::Body, http::Request, http::StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dmx_core::api::{self, AppState};
use dmx_core::brokers::mock::{FixedClock, MemoryStorageBroker, StaticLabApiBroker};
use dmx_core::models::{ExternalLab, ExternalLabServiceInformation};

/// Skip the current test when no database is configured.
#[allow(unused_macros)]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DMX_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_DMX_DATABASE_URL not set");
            return;
        }
    };
}

/// Instant every test app reads from its clock.
pub fn test_now() -> DateTime<Utc> {
    "2025-03-01T12:00:00Z".parse().unwrap()
}

/// Router over in-memory brokers.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorageBroker>,
    pub lab_api: Arc<StaticLabApiBroker>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_external_labs(Vec::new())
    }

    pub fn with_external_labs(external_labs: Vec<ExternalLab>) -> Self {
        Self::with_brokers(
            Arc::new(MemoryStorageBroker::new()),
            Arc::new(StaticLabApiBroker::new(external_labs)),
        )
    }

    pub fn with_brokers(
        storage: Arc<MemoryStorageBroker>,
        lab_api: Arc<StaticLabApiBroker>,
    ) -> Self {
        let clock = Arc::new(FixedClock::new(test_now()));

        let state = AppState::new(
            storage.clone(),
            lab_api.clone(),
            clock.clone(),
            ExternalLabServiceInformation {
                service_id: "dmx-test".to_string(),
                service_type: "Lab".to_string(),
            },
        );

        Self {
            router: api::router(Arc::new(state)),
            storage,
            lab_api,
            clock,
        }
    }

    /// Send one request and decode the JSON body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(req).await
    }

    /// Send a prepared request and decode the JSON body.
    pub async fn send_request(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}

/// Get a migrated database pool for testing.
pub async fn get_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DMX_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&database_url).await.ok()?;
    dmx_core::migrations::run(&pool).await.ok()?;
    Some(pool)
}
