pub mod format;
pub mod sanitize;
pub mod validation;

pub use format::{Paginated, PersonResource};
pub use sanitize::{into_person_data, sanitize_person};
pub use validation::{is_valid_email, validate_person, FieldErrors};
