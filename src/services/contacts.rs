//! Contact book operations, always scoped to the resolved user.

use crate::db::ContactStore;
use crate::error::{AppError, Result};
use crate::models::contact::{Contact, ContactFilter, ContactInput};
use crate::models::User;
use crate::time_utils::now_rfc3339;
use chrono::NaiveDate;
use std::sync::Arc;

/// Page size cap for contact listings.
pub const MAX_LIMIT: u32 = 100;
/// How far ahead `upcoming_birthdays` looks (inclusive).
pub const BIRTHDAY_WINDOW_DAYS: i64 = 7;

fn not_found() -> AppError {
    AppError::NotFound("Contact not found".to_string())
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user: &User, skip: u32, limit: u32) -> Result<Vec<Contact>> {
        self.store
            .list_contacts(&user.id, skip, limit.min(MAX_LIMIT))
            .await
    }

    pub async fn get(&self, user: &User, contact_id: &str) -> Result<Contact> {
        self.store
            .get_contact(&user.id, contact_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, user: &User, input: ContactInput) -> Result<Contact> {
        let contact = Contact {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            firstname: input.firstname,
            lastname: input.lastname,
            email: input.email,
            phone: input.phone,
            born_date: input.born_date,
            notes: input.notes,
            created_at: now_rfc3339(),
        };
        self.store.upsert_contact(&contact).await?;
        tracing::debug!(user_id = %user.id, contact_id = %contact.id, "Contact created");
        Ok(contact)
    }

    pub async fn update(
        &self,
        user: &User,
        contact_id: &str,
        input: ContactInput,
    ) -> Result<Contact> {
        self.modify(user, contact_id, |c| c.apply(input)).await
    }

    pub async fn update_born_date(
        &self,
        user: &User,
        contact_id: &str,
        born_date: NaiveDate,
    ) -> Result<Contact> {
        self.modify(user, contact_id, |c| c.born_date = Some(born_date))
            .await
    }

    pub async fn update_notes(&self, user: &User, contact_id: &str, notes: String) -> Result<Contact> {
        self.modify(user, contact_id, |c| c.notes = Some(notes)).await
    }

    pub async fn remove(&self, user: &User, contact_id: &str) -> Result<Contact> {
        let contact = self
            .store
            .delete_contact(&user.id, contact_id)
            .await?
            .ok_or_else(not_found)?;
        tracing::debug!(user_id = %user.id, contact_id, "Contact deleted");
        Ok(contact)
    }

    pub async fn search(&self, user: &User, filter: &ContactFilter) -> Result<Vec<Contact>> {
        let contacts = self.store.all_contacts(&user.id).await?;
        Ok(contacts.into_iter().filter(|c| c.matches(filter)).collect())
    }

    /// Contacts whose birthday falls within the next week, soonest first.
    pub async fn upcoming_birthdays(&self, user: &User, today: NaiveDate) -> Result<Vec<Contact>> {
        let horizon = today + chrono::Duration::days(BIRTHDAY_WINDOW_DAYS);

        let mut upcoming: Vec<(NaiveDate, Contact)> = self
            .store
            .all_contacts(&user.id)
            .await?
            .into_iter()
            .filter_map(|c| c.next_birthday(today).map(|d| (d, c)))
            .filter(|(d, _)| *d <= horizon)
            .collect();

        upcoming.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(upcoming.into_iter().map(|(_, c)| c).collect())
    }

    async fn modify(
        &self,
        user: &User,
        contact_id: &str,
        change: impl FnOnce(&mut Contact),
    ) -> Result<Contact> {
        let mut contact = self.get(user, contact_id).await?;
        change(&mut contact);
        self.store.upsert_contact(&contact).await?;
        Ok(contact)
    }
}
