//! Database layer.
//!
//! Auth and contact services only see the [`UserDirectory`] and
//! [`ContactStore`] traits; Firestore and an in-memory map implement them.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Contact, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Users, keyed by URL-encoded email
    pub const USERS: &str = "users";
    /// Contacts, keyed by contact ID and carrying `owner_id`
    pub const CONTACTS: &str = "contacts";
}

/// Authoritative store of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    /// Commit all fields of an existing user.
    async fn save(&self, user: &User) -> Result<(), AppError>;
}

/// Per-owner contact storage.
///
/// Every method is scoped by `owner_id`: a contact owned by someone else
/// behaves exactly like a missing one.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Page of contacts in creation order.
    async fn list_contacts(
        &self,
        owner_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Contact>, AppError>;

    async fn all_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError>;

    async fn get_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError>;

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError>;

    /// Delete and return the contact, if the owner had it.
    async fn delete_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError>;
}
