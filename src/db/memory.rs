//! In-memory storage backend.
//!
//! Used when no GCP project is configured and by the test suite.

use crate::db::{ContactStore, UserDirectory};
use crate::error::AppError;
use crate::models::{Contact, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// DashMap-backed users and contacts. Clones share the same maps.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    contacts: Arc<DashMap<String, Contact>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn owned_sorted(&self, owner_id: &str) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .contacts
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        contacts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        contacts
    }
}

#[async_trait]
impl UserDirectory for MemoryDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn insert(&self, user: User) -> Result<User, AppError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Account already exists".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.email.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryDb {
    async fn list_contacts(
        &self,
        owner_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Contact>, AppError> {
        Ok(self
            .owned_sorted(owner_id)
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn all_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError> {
        Ok(self.owned_sorted(owner_id))
    }

    async fn get_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError> {
        Ok(self
            .contacts
            .get(contact_id)
            .filter(|c| c.owner_id == owner_id)
            .map(|c| c.value().clone()))
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError> {
        self.contacts.insert(contact.id.clone(), contact.clone());
        Ok(())
    }

    async fn delete_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError> {
        Ok(self
            .contacts
            .remove_if(contact_id, |_, c| c.owner_id == owner_id)
            .map(|(_, c)| c))
    }
}
