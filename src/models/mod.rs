// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contact;
pub mod user;

pub use contact::{Contact, ContactFilter, ContactInput};
pub use user::{User, UserResponse};
