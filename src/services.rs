use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{redact_document, Lead, LeadData, LeadDataPatch, LeadDocument};
use crate::store::LeadStore;

pub use crate::models::merge_lead_data;

/// Business rules around the lead lifecycle.
///
/// Every log line is emitted inside the span handed over at construction, so
/// callers decide where service diagnostics go.
pub struct LeadService {
    store: Arc<dyn LeadStore>,
    span: Span,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self::with_span(store, tracing::info_span!("lead_service"))
    }

    pub fn with_span(store: Arc<dyn LeadStore>, span: Span) -> Self {
        Self { store, span }
    }

    /// Every live lead, unpaginated.
    pub async fn find_all(&self) -> Result<Vec<Lead>, AppError> {
        self.store.find_all().instrument(self.span.clone()).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Lead, AppError> {
        async {
            match self.store.find_by_id(id).await? {
                Some(lead) => Ok(lead),
                None => {
                    tracing::warn!(lead_id = %id, "Lead not found");
                    Err(AppError::LeadNotFound(id))
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Creates a lead after checking its email is free among live leads.
    pub async fn create(&self, data: LeadData) -> Result<Lead, AppError> {
        async {
            self.validate_if_email_is_taken(&data.email).await?;

            let lead = Lead::new(data.to_document()?);
            tracing::info!("Creating lead -> {}", to_log_json(&lead.data));

            self.store.create(lead).await
        }
        .instrument(self.span.clone())
        .await
    }

    /// Fills in fields of the stored data that are missing, from `patch`.
    ///
    /// Stored keys always win; see [`merge_lead_data`].
    pub async fn update_lead_data(&self, id: Uuid, patch: LeadDataPatch) -> Result<Lead, AppError> {
        async {
            if patch.is_empty() {
                tracing::warn!(lead_id = %id, "No fields to update");
                return Err(AppError::NoFieldsToUpdate);
            }

            let current = self.find_by_id(id).await?;
            let incoming = patch.to_document()?;

            tracing::debug!("Current info -> {}", to_log_json(&current.data));
            tracing::debug!("Info to update -> {}", to_log_json(&incoming));

            // The store merges against the row as it is at write time, so a
            // concurrent update landing after the read above is kept.
            let lead = match self.store.merge_data(id, &incoming).await? {
                Some(lead) => lead,
                None => {
                    tracing::warn!(lead_id = %id, "Lead not found");
                    return Err(AppError::LeadNotFound(id));
                }
            };
            tracing::debug!("Data after merge -> {}", to_log_json(&lead.data));

            Ok(lead)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Marks a live lead as deleted.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        async {
            if self.store.soft_delete(id).await? {
                tracing::info!(lead_id = %id, "Lead soft-deleted");
                Ok(())
            } else {
                tracing::warn!(lead_id = %id, "Lead not found");
                Err(AppError::LeadNotFound(id))
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn validate_if_email_is_taken(&self, email: &str) -> Result<(), AppError> {
        if self.store.count_active_by_email(email).await? > 0 {
            tracing::warn!("Email is taken -> {}", email);
            return Err(AppError::EmailAlreadyExists(email.to_string()));
        }
        Ok(())
    }
}

fn to_log_json(data: &LeadDocument) -> String {
    Value::Object(redact_document(data)).to_string()
}
