use std::collections::HashMap;

use crate::models::{LabeledValueInput, PersonPayload};

/// Dotted field path (`emails.0.value`) -> message
pub type FieldErrors = HashMap<String, String>;

/// Validate a create/update body. Runs every rule and reports all failures.
pub fn validate_person(payload: &PersonPayload) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if payload.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.insert("name".to_string(), "The name field is required.".to_string());
    }

    match payload.emails.as_deref() {
        None | Some([]) => {
            errors.insert("emails".to_string(), "The emails field is required.".to_string());
        }
        Some(emails) => {
            for (i, email) in emails.iter().enumerate() {
                match email.value.as_deref().map(str::trim) {
                    None | Some("") => {
                        errors.insert(format!("emails.{}.value", i), "The email value is required.".to_string());
                    }
                    Some(value) if !is_valid_email(value) => {
                        errors.insert(
                            format!("emails.{}.value", i),
                            "The email value must be a valid email address.".to_string(),
                        );
                    }
                    Some(_) => {}
                }
                require_label(&mut errors, "emails", i, email);
            }
        }
    }

    match payload.contact_numbers.as_deref() {
        None | Some([]) => {
            errors.insert(
                "contact_numbers".to_string(),
                "The contact numbers field is required.".to_string(),
            );
        }
        Some(numbers) => {
            for (i, number) in numbers.iter().enumerate() {
                // Null values are dropped by `sanitize_person`, not rejected here
                let Some(value) = number.value.as_deref() else { continue };
                if value.trim().is_empty() {
                    errors.insert(
                        format!("contact_numbers.{}.value", i),
                        "The contact number value is required.".to_string(),
                    );
                }
                require_label(&mut errors, "contact_numbers", i, number);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_label(errors: &mut FieldErrors, field: &str, index: usize, entry: &LabeledValueInput) {
    if entry.label.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.insert(format!("{}.{}.label", field, index), "The label field is required.".to_string());
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || local.len() > 64 {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> PersonPayload {
        PersonPayload {
            name: Some("Jo Smith".to_string()),
            emails: Some(vec![LabeledValueInput::new(Some("jo@example.com"), Some("work"))]),
            contact_numbers: Some(vec![LabeledValueInput::new(Some("+1 555 0100"), Some("work"))]),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_valid_payload() {
        assert!(validate_person(&valid_payload()).is_ok());
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = validate_person(&PersonPayload::default()).unwrap_err();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("emails"));
        assert!(errors.contains_key("contact_numbers"));
    }

    #[test]
    fn rejects_blank_name_and_empty_arrays() {
        let payload = PersonPayload {
            name: Some("   ".to_string()),
            emails: Some(vec![]),
            contact_numbers: Some(vec![]),
            ..Default::default()
        };
        let errors = validate_person(&payload).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_bad_email_entries() {
        let mut payload = valid_payload();
        payload.emails = Some(vec![
            LabeledValueInput::new(None, Some("work")),
            LabeledValueInput::new(Some("not-an-email"), Some("home")),
            LabeledValueInput::new(Some("ok@example.com"), None),
        ]);
        let errors = validate_person(&payload).unwrap_err();
        assert!(errors.contains_key("emails.0.value"));
        assert!(errors.contains_key("emails.1.value"));
        assert!(errors.contains_key("emails.2.label"));
        assert!(!errors.contains_key("emails.2.value"));
    }

    #[test]
    fn null_contact_number_values_pass_validation() {
        let mut payload = valid_payload();
        payload.contact_numbers = Some(vec![
            LabeledValueInput::new(None, Some("home")),
            LabeledValueInput::new(Some("123"), Some("work")),
        ]);
        assert!(validate_person(&payload).is_ok());
    }

    #[test]
    fn rejects_blank_contact_number_values_and_labels() {
        let mut payload = valid_payload();
        payload.contact_numbers = Some(vec![
            LabeledValueInput::new(Some(""), Some("home")),
            LabeledValueInput::new(Some("123"), Some(" ")),
        ]);
        let errors = validate_person(&payload).unwrap_err();
        assert!(errors.contains_key("contact_numbers.0.value"));
        assert!(errors.contains_key("contact_numbers.1.label"));
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b..com"));
        assert!(!is_valid_email("a@-b.com"));
    }
}
