// ABOUTME: Declarative request validation over JSON bodies
// ABOUTME: Data-driven rule tables evaluated uniformly, collecting every violation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Request validation
//!
//! Each endpoint declares a rule table: a list of (field path, checks)
//! entries evaluated uniformly against the JSON body. Evaluation runs the
//! full table and collects every violation; stopping at the first failure
//! is not allowed, since clients rely on receiving the complete list in
//! one response.

use serde_json::Value as JsonValue;

use crate::errors::{AppError, AppResult, Violation};

/// A single field check
#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// Value must be a JSON string
    IsString,
    /// Value must be a JSON object
    IsObject,
    /// Value must be a JSON array
    IsArray,
    /// Value must be a JSON boolean
    IsBool,
    /// String must look like an email address
    Email,
    /// String must look like a phone number
    Phone,
    /// Trimmed string must be at least this long
    MinTrimmedLen(usize),
    /// Value must be a number within the optional bounds
    Float {
        /// Inclusive lower bound
        min: Option<f64>,
        /// Inclusive upper bound
        max: Option<f64>,
    },
    /// String must be one of the listed values
    OneOf(&'static [&'static str]),
    /// String must parse as an RFC 3339 date-time
    DateTime,
}

/// A validation rule for one field path
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Dotted field path (e.g. `location.lat`)
    pub field: &'static str,
    /// Whether absence itself is a violation
    pub required: bool,
    /// Checks applied when the field is present
    pub checks: &'static [Check],
}

/// Simple email shape check: something@domain.tld
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 {
        return false;
    }
    let Some(at_pos) = email.find('@') else {
        return false;
    };
    if at_pos == 0 || at_pos == email.len() - 1 {
        return false;
    }
    email[at_pos + 1..].contains('.')
}

/// Phone shape check: optional leading `+`, 7 to 15 digits
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn lookup<'a>(body: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn check_value(field: &str, value: &JsonValue, check: Check) -> Option<Violation> {
    match check {
        Check::IsString => value
            .as_str()
            .is_none()
            .then(|| Violation::new(field, "must be a string")),
        Check::IsObject => (!value.is_object()).then(|| Violation::new(field, "must be an object")),
        Check::IsArray => (!value.is_array()).then(|| Violation::new(field, "must be an array")),
        Check::IsBool => (!value.is_boolean()).then(|| Violation::new(field, "must be a boolean")),
        Check::Email => match value.as_str() {
            Some(s) if is_valid_email(s) => None,
            _ => Some(Violation::new(field, "must be a valid email address")),
        },
        Check::Phone => match value.as_str() {
            Some(s) if is_valid_phone(s) => None,
            _ => Some(Violation::new(field, "must be a valid phone number")),
        },
        Check::MinTrimmedLen(min) => match value.as_str() {
            Some(s) if s.trim().len() >= min => None,
            _ => Some(Violation::new(
                field,
                format!("must be a string of at least {min} characters"),
            )),
        },
        Check::Float { min, max } => match value.as_f64() {
            Some(n) => {
                if min.is_some_and(|bound| n < bound) || max.is_some_and(|bound| n > bound) {
                    let range = match (min, max) {
                        (Some(lo), Some(hi)) => format!("must be between {lo} and {hi}"),
                        (Some(lo), None) => format!("must be at least {lo}"),
                        (None, Some(hi)) => format!("must be at most {hi}"),
                        (None, None) => "must be a number".to_owned(),
                    };
                    Some(Violation::new(field, range))
                } else {
                    None
                }
            }
            None => Some(Violation::new(field, "must be a number")),
        },
        Check::OneOf(values) => match value.as_str() {
            Some(s) if values.contains(&s) => None,
            _ => Some(Violation::new(
                field,
                format!("must be one of: {}", values.join(", ")),
            )),
        },
        Check::DateTime => match value.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => None,
            _ => Some(Violation::new(field, "must be an RFC 3339 date-time")),
        },
    }
}

/// Evaluates a rule table against a body, collecting every violation
#[must_use]
pub fn validate(body: &JsonValue, rules: &[Rule]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        match lookup(body, rule.field) {
            None | Some(JsonValue::Null) => {
                if rule.required {
                    violations.push(Violation::new(rule.field, "is required"));
                }
            }
            Some(value) => {
                for check in rule.checks {
                    if let Some(violation) = check_value(rule.field, value, *check) {
                        violations.push(violation);
                    }
                }
            }
        }
    }

    violations
}

/// Rejects the request when any rule fails, carrying all violations
///
/// # Errors
/// Returns a validation error listing every violation found
pub fn ensure_valid(body: &JsonValue, rules: &[Rule]) -> AppResult<()> {
    let violations = validate(body, rules);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(violations))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    const RULES: &[Rule] = &[
        Rule {
            field: "email",
            required: true,
            checks: &[Check::Email],
        },
        Rule {
            field: "phLevel",
            required: true,
            checks: &[Check::Float {
                min: Some(0.0),
                max: Some(14.0),
            }],
        },
        Rule {
            field: "season",
            required: false,
            checks: &[Check::OneOf(&["rainy", "dry"])],
        },
    ];

    #[test]
    fn all_violations_are_collected_not_just_the_first() {
        let body = json!({ "email": "not-an-email", "phLevel": 22.5, "season": "monsoon" });
        let violations = validate(&body, RULES);
        assert_eq!(violations.len(), 3);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "phLevel", "season"]);
    }

    #[test]
    fn missing_required_field_is_a_violation() {
        let violations = validate(&json!({ "phLevel": 6.5 }), RULES);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[0].message, "is required");
    }

    #[test]
    fn missing_optional_field_is_not_a_violation() {
        let body = json!({ "email": "amina@example.com", "phLevel": 6.5 });
        assert!(validate(&body, RULES).is_empty());
    }

    #[test]
    fn nested_paths_resolve() {
        const NESTED: &[Rule] = &[Rule {
            field: "location.lat",
            required: true,
            checks: &[Check::Float { min: None, max: None }],
        }];
        assert!(validate(&json!({ "location": { "lat": 9.05 } }), NESTED).is_empty());
        assert_eq!(validate(&json!({ "location": {} }), NESTED).len(), 1);
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+2348012345678"));
        assert!(is_valid_phone("08012345678"));
        assert!(!is_valid_phone("12-34"));
        assert!(!is_valid_phone("not a phone"));
    }
}
