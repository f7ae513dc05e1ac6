//! Field rules for lead payloads.
//!
//! Every rule of a payload is checked and all violations are reported
//! together, in field order. Nested address violations are prefixed with
//! `address.`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::AppError;
use crate::models::{Address, LeadData, LeadDataPatch};

const NOT_EMPTY: &str = "should not be empty";
const NOT_STRING: &str = "must be a string";
const NOT_NUMBER: &str = "must be a number";
const NOT_OBJECT: &str = "must be an object";

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates a create payload.
///
/// `name`, `surname`, `cpf` and `email` must be present non-empty strings.
/// Everything else is optional but type-checked when present.
pub fn validate_lead_data(payload: &Value) -> Result<LeadData, AppError> {
    let object = as_object(payload)?;
    let mut violations = Vec::new();

    let name = required_string(object, "name", &mut violations);
    let surname = required_string(object, "surname", &mut violations);
    let cpf = required_string(object, "cpf", &mut violations);
    let email = required_string(object, "email", &mut violations);
    let password = optional_string(object, "", "password", &mut violations);
    let birth_date = optional_string(object, "", "birth_date", &mut violations);
    let occupation = optional_string(object, "", "occupation", &mut violations);
    let monthly_income = optional_number(object, "monthly_income", &mut violations);
    let address = optional_address(object, &mut violations);

    match (name, surname, cpf, email) {
        (Some(name), Some(surname), Some(cpf), Some(email)) if violations.is_empty() => {
            Ok(LeadData {
                name,
                surname,
                cpf,
                email,
                password,
                birth_date,
                occupation,
                monthly_income,
                address,
            })
        }
        _ => Err(AppError::ValidationFailed(violations)),
    }
}

/// Validates a partial update payload.
///
/// Same type rules as [`validate_lead_data`] with every field optional. The
/// identifying fields still reject an empty string when they are sent.
pub fn validate_lead_patch(payload: &Value) -> Result<LeadDataPatch, AppError> {
    let object = as_object(payload)?;
    let mut violations = Vec::new();

    let patch = LeadDataPatch {
        name: optional_non_empty_string(object, "name", &mut violations),
        surname: optional_non_empty_string(object, "surname", &mut violations),
        cpf: optional_non_empty_string(object, "cpf", &mut violations),
        email: optional_non_empty_string(object, "email", &mut violations),
        password: optional_string(object, "", "password", &mut violations),
        birth_date: optional_string(object, "", "birth_date", &mut violations),
        occupation: optional_string(object, "", "occupation", &mut violations),
        monthly_income: optional_number(object, "monthly_income", &mut violations),
        address: optional_address(object, &mut violations),
    };

    if violations.is_empty() {
        Ok(patch)
    } else {
        Err(AppError::ValidationFailed(violations))
    }
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, AppError> {
    payload.as_object().ok_or_else(|| {
        AppError::ValidationFailed(vec![FieldViolation::new(
            "$",
            "payload must be a JSON object",
        )])
    })
}

/// Present, non-null value for `key`.
fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn path(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

fn required_string(
    object: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match present(object, key) {
        None => {
            violations.push(FieldViolation::new(key, NOT_EMPTY));
            None
        }
        Some(value) => non_empty_string(value, key, violations),
    }
}

fn optional_non_empty_string(
    object: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    present(object, key).and_then(|value| non_empty_string(value, key, violations))
}

fn non_empty_string(
    value: &Value,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match value.as_str() {
        Some("") => {
            violations.push(FieldViolation::new(key, NOT_EMPTY));
            None
        }
        Some(s) => Some(s.to_string()),
        None => {
            violations.push(FieldViolation::new(key, NOT_STRING));
            None
        }
    }
}

fn optional_string(
    object: &Map<String, Value>,
    prefix: &str,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let value = present(object, key)?;
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            violations.push(FieldViolation::new(path(prefix, key), NOT_STRING));
            None
        }
    }
}

fn optional_number(
    object: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Number> {
    match present(object, key)? {
        Value::Number(n) => Some(n.clone()),
        _ => {
            violations.push(FieldViolation::new(key, NOT_NUMBER));
            None
        }
    }
}

fn optional_address(
    object: &Map<String, Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<Address> {
    let value = present(object, "address")?;
    let Some(fields) = value.as_object() else {
        violations.push(FieldViolation::new("address", NOT_OBJECT));
        return None;
    };

    let before = violations.len();
    let prefix = "address.";
    let address = Address {
        cep: optional_string(fields, prefix, "cep", violations),
        state: optional_string(fields, prefix, "state", violations),
        city: optional_string(fields, prefix, "city", violations),
        district: optional_string(fields, prefix, "district", violations),
        street: optional_string(fields, prefix, "street", violations),
        number: optional_string(fields, prefix, "number", violations),
        complement: optional_string(fields, prefix, "complement", violations),
    };

    (violations.len() == before).then_some(address)
}
