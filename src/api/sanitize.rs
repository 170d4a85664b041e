use crate::models::{LabeledValue, LabeledValueInput, PersonData, PersonPayload};

/// Default `contact_numbers` to an empty list and drop entries without a value,
/// keeping the order of the rest. Other fields pass through untouched.
pub fn sanitize_person(mut payload: PersonPayload) -> PersonPayload {
    let numbers = payload.contact_numbers.take().unwrap_or_default();
    payload.contact_numbers = Some(numbers.into_iter().filter(|n| n.value.is_some()).collect());
    payload
}

/// Convert a validated, sanitized payload into store input.
///
/// Labeled values are stored trimmed, exactly as validation saw them.
/// `default_owner` applies when the payload names no owning user; `None`
/// leaves the owner to the store (kept as-is on update).
pub fn into_person_data(payload: PersonPayload, default_owner: Option<i64>) -> PersonData {
    PersonData {
        name: payload.name.unwrap_or_default().trim().to_string(),
        job_title: payload.job_title,
        emails: labeled(payload.emails.unwrap_or_default()),
        contact_numbers: labeled(payload.contact_numbers.unwrap_or_default()),
        organization_id: payload.organization_id,
        attribute_values: payload.attribute_values.unwrap_or_default(),
        user_id: payload.user_id.or(default_owner),
    }
}

fn labeled(entries: Vec<LabeledValueInput>) -> Vec<LabeledValue> {
    entries
        .into_iter()
        .filter_map(|entry| {
            entry
                .value
                .map(|value| LabeledValue::new(value.trim(), entry.label.as_deref().unwrap_or("").trim()))
        })
        .collect()
}
