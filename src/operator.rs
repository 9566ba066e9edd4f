// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownOperatorError;

/// Comparison applied by a criterion to a resource field.
///
/// Parsing through [`FromStr`] is strict and rejects unknown operator names. Records read back
/// from storage are decoded leniently instead: an unknown name is kept as
/// [`Operator::Unsupported`] so validation can reject it and the compiler can treat the
/// constraint as matching nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// Field contains the value.
    Contains,

    /// Field does not contain the value.
    DoesNotContain,

    /// Field equals any of a comma-separated set of values.
    IsOneOf,

    /// Field equals none of a comma-separated set of values.
    IsNotOneOf,

    /// Field equals the value exactly.
    Equals,

    /// Field starts with the value.
    StartsWith,

    /// Field ends with the value.
    EndsWith,

    /// Operator name found in a stored record which is not supported.
    Unsupported(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::IsOneOf => "is_one_of",
            Operator::IsNotOneOf => "is_not_one_of",
            Operator::Equals => "equals",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Unsupported(name) => name,
        }
    }

    /// Operator excludes matching resources instead of including them.
    pub fn is_negated(&self) -> bool {
        matches!(self, Operator::DoesNotContain | Operator::IsNotOneOf)
    }

    /// Operator takes a comma-separated list of values.
    pub fn is_set(&self) -> bool {
        matches!(self, Operator::IsOneOf | Operator::IsNotOneOf)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Operator::Unsupported(_))
    }
}

impl FromStr for Operator {
    type Err = UnknownOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Operator::from(s.to_owned()) {
            Operator::Unsupported(name) => Err(UnknownOperatorError(name)),
            operator => Ok(operator),
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "contains" => Operator::Contains,
            "does_not_contain" => Operator::DoesNotContain,
            "is_one_of" => Operator::IsOneOf,
            "is_not_one_of" => Operator::IsNotOneOf,
            "equals" => Operator::Equals,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            _ => Operator::Unsupported(value),
        }
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unsupported(name) => name,
            operator => operator.as_str().to_owned(),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
