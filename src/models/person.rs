use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A `{ value, label }` pair as stored in the `emails` and `contact_numbers` collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub value: String,
    pub label: String,
}

impl LabeledValue {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}

/// A contact record in the CRM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub job_title: Option<String>,
    pub emails: Vec<LabeledValue>,
    pub contact_numbers: Vec<LabeledValue>,
    pub organization_id: Option<i64>,
    /// Eager-loaded relation, `None` when the person has no organization
    pub organization: Option<Organization>,
    /// Custom attribute code -> value
    pub attribute_values: BTreeMap<String, Value>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn has_email(&self, value: &str) -> bool {
        self.emails.iter().any(|email| email.value == value)
    }
}

/// Validated and sanitized person fields handed to the store on create/update
#[derive(Debug, Clone, PartialEq)]
pub struct PersonData {
    pub name: String,
    pub job_title: Option<String>,
    pub emails: Vec<LabeledValue>,
    pub contact_numbers: Vec<LabeledValue>,
    pub organization_id: Option<i64>,
    pub attribute_values: BTreeMap<String, Value>,
    pub user_id: Option<i64>,
}

/// Loosely-typed entry of an incoming `emails`/`contact_numbers` array.
/// Every field stays optional so validation can report what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledValueInput {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl LabeledValueInput {
    pub fn new(value: Option<&str>, label: Option<&str>) -> Self {
        Self {
            value: value.map(str::to_string),
            label: label.map(str::to_string),
        }
    }
}

/// Raw create/update body as sent by clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub emails: Option<Vec<LabeledValueInput>>,
    #[serde(default)]
    pub contact_numbers: Option<Vec<LabeledValueInput>>,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub attribute_values: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub user_id: Option<i64>,
}
