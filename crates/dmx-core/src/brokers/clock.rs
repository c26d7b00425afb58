// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Clock broker.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait DateTimeBroker: Send + Sync {
    fn current_date_time(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl DateTimeBroker for SystemClock {
    fn current_date_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
