use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::errors::AppError;

/// JSON document stored in the `data` column of a lead.
pub type LeadDocument = Map<String, Value>;

/// Keys accepted on input but never returned to callers.
pub const WRITE_ONLY_FIELDS: &[&str] = &["password"];

// ============ Payload Models ============

/// Postal address attached to a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
}

/// Validated payload for creating a lead.
///
/// Built by [`crate::validation::validate_lead_data`]; the four identifying
/// fields are guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadData {
    pub name: String,
    pub surname: String,
    /// Brazilian tax id, stored as given.
    pub cpf: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Kept as the string the caller sent; no date parsing is applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl LeadData {
    pub fn to_document(&self) -> Result<LeadDocument, AppError> {
        to_document(self)
    }
}

/// Partial lead payload used by the update operation.
///
/// Every field is optional. An explicit JSON `null` is read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadDataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl LeadDataPatch {
    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.cpf.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.birth_date.is_none()
            && self.occupation.is_none()
            && self.monthly_income.is_none()
            && self.address.is_none()
    }

    pub fn to_document(&self) -> Result<LeadDocument, AppError> {
        to_document(self)
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<LeadDocument, AppError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::InternalError(format!(
            "lead payload serialized to a non-object value: {}",
            other
        ))),
        Err(e) => Err(AppError::InternalError(format!(
            "failed to serialize lead payload: {}",
            e
        ))),
    }
}

// ============ Database Models ============

/// A persisted lead row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Generated on creation, never changes.
    pub id: Uuid,
    /// Lead attributes as a JSON object.
    pub data: LeadDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Set rows are invisible to lookups and to the
    /// email uniqueness check.
    pub deleted_date: Option<DateTime<Utc>>,
}

impl Lead {
    /// Builds a new, not yet persisted, lead entity around `data`.
    pub fn new(data: LeadDocument) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            data,
            created_at: now,
            updated_at: now,
            deleted_date: None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.data.get("email").and_then(Value::as_str)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

/// Returns a copy of `data` without write-only keys, for responses and logs.
pub fn redact_document(data: &LeadDocument) -> LeadDocument {
    data.iter()
        .filter(|(key, _)| !WRITE_ONLY_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Layers `existing` over `incoming`.
///
/// Keys only present in `incoming` are added; a key present in both keeps
/// the existing value. Top-level keys only, so an existing `address` wins as
/// a whole.
pub fn merge_lead_data(existing: &LeadDocument, incoming: &LeadDocument) -> LeadDocument {
    let mut merged = incoming.clone();
    for (key, value) in existing {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

// ============ API Response Models ============

/// Lead as returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadResponse {
    pub id: Uuid,
    pub data: LeadDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            data: redact_document(&lead.data),
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_document_skips_absent_fields() {
        let patch = LeadDataPatch {
            occupation: Some("Engineer".to_string()),
            monthly_income: Some(Number::from(5000)),
            ..Default::default()
        };

        let doc = patch.to_document().unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({"occupation": "Engineer", "monthly_income": 5000})
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(LeadDataPatch::default().is_empty());
        let patch = LeadDataPatch {
            address: Some(Address::default()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_response_hides_password() {
        let data = json!({"email": "a@example.com", "password": "secret"});
        let Value::Object(data) = data else {
            unreachable!()
        };
        let lead = Lead::new(data);

        let response = LeadResponse::from(lead.clone());
        assert_eq!(lead.email(), Some("a@example.com"));
        assert!(response.data.get("password").is_none());
        assert_eq!(response.data.get("email"), Some(&json!("a@example.com")));
    }
}
