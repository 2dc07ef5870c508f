//! Request payload validation
//!
//! DTOs derive `validator::Validate`; handlers call [`validate`] before
//! touching the store so every rule violation comes back as a 400 with
//! per-field details.

use std::borrow::Cow;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::utils::AppError;

/// Run the derived rules and convert failures into `ValidationFailed`
pub fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(into_app_error)
}

fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut fields = Vec::new();
    collect(&errors, "", &mut fields);
    fields.sort();

    let message = match fields.first() {
        Some((field, reason)) => format!("{field}: {reason}"),
        None => "Invalid request body".to_string(),
    };
    let mut err = AppError::validation(message);
    for (field, reason) in fields {
        err = err.with_detail(field, reason);
    }
    err
}

/// Flatten nested and list errors into `contact.email`-style paths
fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let reason = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .clone()
                            .unwrap_or_else(|| Cow::Owned(e.code.to_string()))
                            .into_owned()
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push((path, reason));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect(inner, &format!("{path}[{idx}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{RestaurantUpdate, ReviewCreate};
    use shared::error::ErrorCode;

    #[test]
    fn test_range_violation_reports_field() {
        let review = ReviewCreate {
            order_id: 1,
            rating: 9,
            comment: None,
        };
        let err = validate(&review).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.starts_with("rating"));
        assert!(err.details.unwrap().contains_key("rating"));
    }

    #[test]
    fn test_nested_field_path() {
        let update: RestaurantUpdate = serde_json::from_value(serde_json::json!({
            "contact": { "email": "not-an-email" }
        }))
        .unwrap();
        let err = validate(&update).unwrap_err();
        assert!(err.details.unwrap().contains_key("contact.email"));
    }

    #[test]
    fn test_valid_payload_passes() {
        let review = ReviewCreate {
            order_id: 1,
            rating: 5,
            comment: Some("Enak".into()),
        };
        assert!(validate(&review).is_ok());
    }
}
