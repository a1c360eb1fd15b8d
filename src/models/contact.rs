// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact model and request payloads.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A contact record, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact ID (UUID, also used as document ID)
    pub id: String,
    /// ID of the owning user; every query is scoped by it
    pub owner_id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub born_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    /// When the contact was created (RFC3339)
    pub created_at: String,
}

impl Contact {
    /// Next birthday anniversary on or after `today`.
    ///
    /// Feb 29 birthdays are observed on Feb 28 in non-leap years.
    pub fn next_birthday(&self, today: NaiveDate) -> Option<NaiveDate> {
        let born = self.born_date?;
        let this_year = anniversary(born, today.year());
        if this_year >= today {
            Some(this_year)
        } else {
            Some(anniversary(born, today.year() + 1))
        }
    }

    /// Overwrite every editable field from `input`.
    pub fn apply(&mut self, input: ContactInput) {
        self.firstname = input.firstname;
        self.lastname = input.lastname;
        self.email = input.email;
        self.phone = input.phone;
        self.born_date = input.born_date;
        self.notes = input.notes;
    }

    /// Case-insensitive substring match, OR-combined over the set criteria.
    /// An empty filter matches everything.
    pub fn matches(&self, filter: &ContactFilter) -> bool {
        let criteria = [
            (filter.firstname.as_deref(), self.firstname.as_str()),
            (filter.lastname.as_deref(), self.lastname.as_str()),
            (filter.email.as_deref(), self.email.as_str()),
        ];

        let mut any_set = false;
        for (needle, haystack) in criteria {
            let Some(needle) = needle.filter(|n| !n.is_empty()) else {
                continue;
            };
            any_set = true;
            if haystack.to_lowercase().contains(&needle.to_lowercase()) {
                return true;
            }
        }
        !any_set
    }
}

fn anniversary(born: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, born.month(), born.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(born)
}

/// Body for creating or replacing a contact.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 2, max = 150))]
    pub firstname: String,
    #[validate(length(min = 2, max = 150))]
    pub lastname: String,
    #[validate(email, length(max = 150))]
    pub email: String,
    #[validate(length(min = 4, max = 20))]
    pub phone: String,
    #[serde(default)]
    pub born_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Body for `PATCH /api/contacts/{id}/birthday`.
#[derive(Debug, Deserialize)]
pub struct ContactBirthday {
    pub born_date: NaiveDate,
}

/// Body for `PATCH /api/contacts/{id}/notes`.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactNotes {
    #[validate(length(max = 500))]
    pub notes: String,
}

/// Search criteria for `GET /api/contacts/search`.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct ContactFilter {
    #[validate(length(max = 150))]
    pub firstname: Option<String>,
    #[validate(length(max = 150))]
    pub lastname: Option<String>,
    #[validate(length(max = 150))]
    pub email: Option<String>,
}
