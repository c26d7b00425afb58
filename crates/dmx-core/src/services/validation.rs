// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Field validation shared by the foundation services.
//!
//! Wire models default every missing field, so "missing" here means the
//! default value: a nil UUID, a blank string or the Unix epoch.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::error::{Fault, InvalidFields};

/// How far in the past a date may lie and still count as current.
pub const RECENT_WINDOW_SECS: i64 = 60;

pub(crate) const TEXT_REQUIRED: &str = "Text is required";
pub(crate) const ID_REQUIRED: &str = "Id is required";
pub(crate) const DATE_REQUIRED: &str = "Date is required";
pub(crate) const NOT_RECOGNIZED: &str = "Value is not recognized";
pub(crate) const DATE_NOT_RECENT: &str = "Date is not recent";

pub(crate) fn is_missing_date(date: DateTime<Utc>) -> bool {
    date == DateTime::<Utc>::default()
}

/// `0 <= now - date <= RECENT_WINDOW_SECS`.
pub(crate) fn is_recent(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let age = now - date;
    age >= TimeDelta::zero() && age <= TimeDelta::seconds(RECENT_WINDOW_SECS)
}

/// Collects rule violations and turns them into a single fault.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    fields: InvalidFields,
    prefix: String,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_id(&mut self, field: impl Into<String>, id: Uuid) -> &mut Self {
        self.check(id.is_nil(), field, ID_REQUIRED)
    }

    pub fn require_text(&mut self, field: impl Into<String>, text: &str) -> &mut Self {
        self.check(text.trim().is_empty(), field, TEXT_REQUIRED)
    }

    pub fn require_date(&mut self, field: impl Into<String>, date: DateTime<Utc>) -> &mut Self {
        self.check(is_missing_date(date), field, DATE_REQUIRED)
    }

    pub fn require_recognized(&mut self, field: impl Into<String>, recognized: bool) -> &mut Self {
        self.check(!recognized, field, NOT_RECOGNIZED)
    }

    /// Record `message` against `field` when `violated` holds.
    pub fn check(
        &mut self,
        violated: bool,
        field: impl Into<String>,
        message: &str,
    ) -> &mut Self {
        if violated {
            self.fields
                .add(format!("{}{}", self.prefix, field.into()), message);
        }
        self
    }

    /// Report subsequent violations under `prefix`, e.g. `commands[0].`.
    pub fn scope(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    /// `Ok` when no rule was violated.
    pub fn finish(&mut self) -> Result<(), Fault> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(Fault::Invalid(std::mem::take(&mut self.fields)))
        }
    }
}

/// Validates a (creation, last update) date pair.
///
/// Pairing rules only run when both dates are present.
pub(crate) struct DatePair {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl DatePair {
    /// Rules for a new record: both dates equal and current.
    pub fn check_on_add(&self, validator: &mut Validator, now: DateTime<Utc>) {
        validator
            .require_date("createdDate", self.created)
            .require_date("updatedDate", self.updated);

        if is_missing_date(self.created) || is_missing_date(self.updated) {
            return;
        }

        validator
            .check(
                self.updated != self.created,
                "updatedDate",
                "Date is not the same as CreatedDate",
            )
            .check(
                !is_recent(self.created, now),
                "createdDate",
                DATE_NOT_RECENT,
            );
    }

    /// Rules for a modification: a fresh update date after the creation date.
    pub fn check_on_modify(&self, validator: &mut Validator, now: DateTime<Utc>) {
        validator
            .require_date("createdDate", self.created)
            .require_date("updatedDate", self.updated);

        if is_missing_date(self.created) || is_missing_date(self.updated) {
            return;
        }

        validator
            .check(
                self.updated == self.created,
                "updatedDate",
                "Date is the same as CreatedDate",
            )
            .check(
                self.updated < self.created,
                "updatedDate",
                "Date can not be before CreatedDate",
            )
            .check(
                !is_recent(self.updated, now),
                "updatedDate",
                DATE_NOT_RECENT,
            );
    }
}
