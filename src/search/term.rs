use serde_json::{json, Value};

use crate::filter::escape_like;
use crate::models::Person;

/// Text columns that accept `field:value` substring terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Name,
    JobTitle,
}

impl TextColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextColumn::Name => "name",
            TextColumn::JobTitle => "job_title",
        }
    }

    fn value_of<'a>(&self, person: &'a Person) -> Option<&'a str> {
        match self {
            TextColumn::Name => Some(person.name.as_str()),
            TextColumn::JobTitle => person.job_title.as_deref(),
        }
    }
}

/// One parsed search token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// `emails` holds an entry whose value equals this exactly
    EmailEquals(String),
    /// Case-insensitive substring match against a text column
    Contains { column: TextColumn, value: String },
    /// Bare token: name substring OR exact email entry
    NameOrEmail(String),
}

impl SearchTerm {
    /// Parse a single token. Returns `None` for tokens that apply no filter:
    /// blank tokens and `field:value` pairs naming an unsupported field.
    pub fn parse(token: &str) -> Option<Self> {
        if token.trim().is_empty() {
            return None;
        }

        let Some((field, value)) = token.split_once(':') else {
            return Some(SearchTerm::NameOrEmail(token.to_string()));
        };

        match field {
            "emails.value" | "email" => Some(SearchTerm::EmailEquals(value.to_string())),
            "name" => Some(SearchTerm::Contains {
                column: TextColumn::Name,
                value: value.to_string(),
            }),
            "job_title" => Some(SearchTerm::Contains {
                column: TextColumn::JobTitle,
                value: value.to_string(),
            }),
            other => {
                tracing::debug!("Ignoring search term on unsupported field '{}'", other);
                None
            }
        }
    }

    pub fn matches(&self, person: &Person) -> bool {
        match self {
            SearchTerm::EmailEquals(value) => person.has_email(value),
            SearchTerm::Contains { column, value } => column
                .value_of(person)
                .map(|text| contains_ignore_case(text, value))
                .unwrap_or(false),
            SearchTerm::NameOrEmail(token) => {
                contains_ignore_case(&person.name, token) || person.has_email(token)
            }
        }
    }

    /// Where-clause fragment understood by [`crate::filter::Filter`]
    pub fn to_where(&self) -> Value {
        match self {
            SearchTerm::EmailEquals(value) => email_contains(value),
            SearchTerm::Contains { column, value } => {
                json!({ column.as_str(): { "$ilike": like_pattern(value) } })
            }
            SearchTerm::NameOrEmail(token) => json!({
                "$or": [
                    { "name": { "$ilike": like_pattern(token) } },
                    email_contains(token),
                ]
            }),
        }
    }
}

/// Parse every token, dropping the ones that apply no filter
pub fn parse_terms<I, S>(tokens: I) -> Vec<SearchTerm>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter_map(|token| SearchTerm::parse(token.as_ref()))
        .collect()
}

fn email_contains(value: &str) -> Value {
    json!({ "emails": { "$contains": [{ "value": value }] } })
}

fn like_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
