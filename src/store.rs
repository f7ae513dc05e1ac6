//! Persistence seam for leads.
//!
//! [`LeadStore`] is what the service talks to. `PgLeadStore` in
//! [`crate::db_storage`] is the production adapter; [`InMemoryLeadStore`]
//! backs tests and the `LEAD_STORE=memory` mode.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge_lead_data, Lead, LeadDocument};

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// All live (not soft-deleted) leads, oldest first.
    async fn find_all(&self) -> Result<Vec<Lead>, AppError>;

    /// Live lead with this id, if any.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    /// Inserts a new lead built with [`Lead::new`].
    ///
    /// Fails with `EmailAlreadyExists` when another live lead holds the same
    /// `data.email`.
    async fn create(&self, lead: Lead) -> Result<Lead, AppError>;

    /// Persists the `data` of an existing live lead and bumps `updated_at`.
    async fn save(&self, lead: Lead) -> Result<Lead, AppError>;

    /// Atomically layers the stored `data` of a live lead over `incoming`
    /// (see [`merge_lead_data`]) and bumps `updated_at`. Returns `None` when
    /// no live lead has this id.
    async fn merge_data(&self, id: Uuid, incoming: &LeadDocument)
        -> Result<Option<Lead>, AppError>;

    /// Number of live leads whose `data.email` equals `email` exactly.
    async fn count_active_by_email(&self, email: &str) -> Result<i64, AppError>;

    /// Sets `deleted_date` on a live lead. Returns false when no live lead
    /// has this id.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Process-local store with the same constraints as the `leads` table.
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_taken(leads: &HashMap<Uuid, Lead>, email: &str, except: Uuid) -> bool {
        leads
            .values()
            .any(|l| l.id != except && !l.is_deleted() && l.email() == Some(email))
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn find_all(&self) -> Result<Vec<Lead>, AppError> {
        let leads = self.leads.read().await;
        let mut live: Vec<Lead> = leads.values().filter(|l| !l.is_deleted()).cloned().collect();
        live.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(live)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let leads = self.leads.read().await;
        Ok(leads.get(&id).filter(|l| !l.is_deleted()).cloned())
    }

    async fn create(&self, lead: Lead) -> Result<Lead, AppError> {
        let mut leads = self.leads.write().await;
        if leads.contains_key(&lead.id) {
            return Err(AppError::InternalError(format!(
                "duplicate lead id {}",
                lead.id
            )));
        }
        if let Some(email) = lead.email() {
            if Self::email_taken(&leads, email, lead.id) {
                return Err(AppError::EmailAlreadyExists(email.to_string()));
            }
        }
        leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn save(&self, mut lead: Lead) -> Result<Lead, AppError> {
        let mut leads = self.leads.write().await;
        let Some(stored) = leads.get(&lead.id).filter(|l| !l.is_deleted()) else {
            return Err(AppError::LeadNotFound(lead.id));
        };
        lead.created_at = stored.created_at;
        lead.deleted_date = None;
        if let Some(email) = lead.email() {
            if Self::email_taken(&leads, email, lead.id) {
                return Err(AppError::EmailAlreadyExists(email.to_string()));
            }
        }
        lead.updated_at = Utc::now();
        leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn merge_data(
        &self,
        id: Uuid,
        incoming: &LeadDocument,
    ) -> Result<Option<Lead>, AppError> {
        let mut leads = self.leads.write().await;
        let Some(stored) = leads.get(&id).filter(|l| !l.is_deleted()) else {
            return Ok(None);
        };

        let mut lead = stored.clone();
        lead.data = merge_lead_data(&stored.data, incoming);
        if let Some(email) = lead.email() {
            if Self::email_taken(&leads, email, id) {
                return Err(AppError::EmailAlreadyExists(email.to_string()));
            }
        }
        lead.updated_at = Utc::now();
        leads.insert(id, lead.clone());
        Ok(Some(lead))
    }

    async fn count_active_by_email(&self, email: &str) -> Result<i64, AppError> {
        let leads = self.leads.read().await;
        let count = leads
            .values()
            .filter(|l| !l.is_deleted() && l.email() == Some(email))
            .count();
        Ok(count as i64)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut leads = self.leads.write().await;
        match leads.get_mut(&id) {
            Some(lead) if !lead.is_deleted() => {
                let now = Utc::now();
                lead.deleted_date = Some(now);
                lead.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
