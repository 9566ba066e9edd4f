// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Criterion operator which is not part of the supported operator set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown criterion operator '{0}'")]
pub struct UnknownOperatorError(pub String);

/// Errors raised when a constraint record is malformed or can not be compiled safely.
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// Record could not be decoded, for example because a required key is missing.
    #[error("malformed constraint record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("'{field}' exceeds the maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Identifiers, names and group ids are restricted to letters, digits, spaces and `-._`.
    #[error("'{field}' contains invalid characters: '{value}'")]
    InvalidName { field: &'static str, value: String },

    /// Field names are restricted to letters, digits and `-._`, without whitespace.
    #[error("criterion field name '{0}' contains invalid characters")]
    InvalidFieldName(String),

    #[error("constraint '{0}' does not grant any group permissions")]
    MissingGroupPermissions(String),

    #[error("constraint '{0}' does not contain any criteria")]
    MissingCriteria(String),

    #[error("criterion on field '{0}' has an empty value")]
    EmptyValue(String),

    /// A group may hold only one permission tier per constraint.
    #[error("group '{group_id}' holds more than one permission on constraint '{constraint_id}'")]
    DuplicateGroupPermission {
        constraint_id: String,
        group_id: String,
    },

    #[error(transparent)]
    UnknownOperator(#[from] UnknownOperatorError),
}

#[cfg(test)]
mod tests {
    use super::{ConstraintError, UnknownOperatorError};

    #[test]
    fn error_display_variants() {
        let errors = vec![
            ConstraintError::MissingField("constraintId"),
            ConstraintError::TooLong {
                field: "name",
                max: 256,
            },
            ConstraintError::InvalidName {
                field: "groupId",
                value: "g1:admins".to_string(),
            },
            ConstraintError::InvalidFieldName("secret OR public".to_string()),
            ConstraintError::MissingGroupPermissions("c1".to_string()),
            ConstraintError::MissingCriteria("c1".to_string()),
            ConstraintError::EmptyValue("labels".to_string()),
            ConstraintError::DuplicateGroupPermission {
                constraint_id: "c1".to_string(),
                group_id: "g1".to_string(),
            },
            ConstraintError::UnknownOperator(UnknownOperatorError("matches".to_string())),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn unknown_operator_is_transparent() {
        let error: ConstraintError = UnknownOperatorError("matches".to_string()).into();
        assert_eq!(error.to_string(), "unknown criterion operator 'matches'");
    }
}
