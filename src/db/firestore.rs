// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides storage for:
//! - Users (keyed by URL-encoded email, so email uniqueness is the document ID)
//! - Contacts (keyed by contact ID, filtered by `owner_id`)

use crate::db::{collections, ContactStore, UserDirectory};
use crate::error::AppError;
use crate::models::{Contact, User};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client; every operation returns `Database` errors.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Document ID for a user. Emails may contain `/`, which Firestore rejects.
    fn user_doc_id(email: &str) -> String {
        urlencoding::encode(email).into_owned()
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for FirestoreDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&Self::user_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, user: User) -> Result<User, AppError> {
        // `insert` fails if the document already exists, which makes the
        // uniqueness check atomic across instances.
        let result: Result<User, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(Self::user_doc_id(&user.email))
            .object(&user)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                Err(AppError::Conflict("Account already exists".to_string()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(Self::user_doc_id(&user.email))
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Contact Operations ──────────────────────────────────────

#[async_trait]
impl ContactStore for FirestoreDb {
    async fn list_contacts(
        &self,
        owner_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Contact>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONTACTS)
            .filter(move |q| q.for_all([q.field("owner_id").eq(owner_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .limit(limit)
            .offset(skip)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn all_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONTACTS)
            .filter(move |q| q.for_all([q.field("owner_id").eq(owner_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError> {
        let contact: Option<Contact> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONTACTS)
            .obj()
            .one(contact_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(contact.filter(|c| c.owner_id == owner_id))
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONTACTS)
            .document_id(&contact.id)
            .object(contact)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_contact(
        &self,
        owner_id: &str,
        contact_id: &str,
    ) -> Result<Option<Contact>, AppError> {
        let Some(contact) = self.get_contact(owner_id, contact_id).await? else {
            return Ok(None);
        };

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CONTACTS)
            .document_id(contact_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(contact))
    }
}
