// SPDX-License-Identifier: MIT OR Apache-2.0

//! Constraint records binding group permissions to field-level criteria.
//!
//! Constraints are long-lived and only change through administrative writes. Records are
//! validated before they are persisted (see [`Validate`]), the query compiler then reads them on
//! every request.
use std::collections::HashSet;
use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::caller::{CallerContext, GroupId};
use crate::error::{ConstraintError, UnknownOperatorError};
use crate::operator::Operator;

/// Maximum number of characters of identifiers, names, descriptions and criterion attributes.
pub const MAX_LENGTH: usize = 256;

/// Checks identifiers, constraint names and group ids.
///
/// 1. It is not empty
/// 2. It uses only letters, digits, spaces and the characters `-`, `.` and `_`
pub fn is_valid_name(value: &str) -> bool {
    static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
        // Unwrap as we checked the regular expression for correctness
        Regex::new(r"^[A-Za-z0-9\-._ ]+$").unwrap()
    });

    NAME_REGEX.is_match(value)
}

/// Checks the field name of a criterion.
///
/// 1. It begins with a letter, digit or underscore
/// 2. It uses only letters, digits and the characters `-`, `.` and `_`, never whitespace
pub fn is_valid_field_name(value: &str) -> bool {
    static FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
        // Unwrap as we checked the regular expression for correctness
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").unwrap()
    });

    FIELD_REGEX.is_match(value)
}

/// Validation of records before they are accepted by a store.
pub trait Validate {
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// Coarse permission tiers used to bucket search results.
///
/// Tiers are ordered `Read < Edit < Admin` but are not hierarchical when bucketing: a group
/// holding `Admin` on a constraint contributes to the `Admin` bucket only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionTier {
    Read,
    Edit,
    Admin,
}

impl PermissionTier {
    pub const ALL: [PermissionTier; 3] = [
        PermissionTier::Read,
        PermissionTier::Edit,
        PermissionTier::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionTier::Read => "Read",
            PermissionTier::Edit => "Edit",
            PermissionTier::Admin => "Admin",
        }
    }
}

impl Display for PermissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permission tier granted to a group on a constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub group_id: GroupId,
    pub permission: PermissionTier,
}

impl GroupPermission {
    pub fn new(group_id: impl Into<GroupId>, permission: PermissionTier) -> Self {
        Self {
            id: None,
            group_id: group_id.into(),
            permission,
        }
    }
}

/// Single field / operator / value predicate of a constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Criterion {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            id: None,
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Values of a set operator: the value split on `,` with every token trimmed. Empty tokens
    /// are dropped.
    pub fn values(&self) -> Vec<&str> {
        self.value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect()
    }
}

/// Named access rule: every caller who is a member of one of the listed groups gets the
/// associated permission on resources matching _all_ criteria.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub constraint_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub group_permissions: Vec<GroupPermission>,

    pub criteria: Vec<Criterion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl Constraint {
    pub fn new(constraint_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            constraint_id: constraint_id.into(),
            name: name.into(),
            description: String::new(),
            group_permissions: Vec::new(),
            criteria: Vec::new(),
            created: None,
            updated: None,
        }
    }

    /// Decode a stored constraint record.
    pub fn from_json(record: &str) -> Result<Self, ConstraintError> {
        Ok(serde_json::from_str(record)?)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_group_permission(
        mut self,
        group_id: impl Into<GroupId>,
        permission: PermissionTier,
    ) -> Self {
        self.group_permissions
            .push(GroupPermission::new(group_id, permission));
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Group permissions held by one of the caller's groups.
    pub fn permissions_for<'a>(
        &'a self,
        caller: &'a CallerContext,
    ) -> impl Iterator<Item = &'a GroupPermission> + 'a {
        self.group_permissions
            .iter()
            .filter(|permission| caller.is_member(&permission.group_id))
    }

    /// Distinct tiers the caller holds on this constraint, in tier order.
    pub fn tiers_for(&self, caller: &CallerContext) -> Vec<PermissionTier> {
        let held: HashSet<PermissionTier> = self
            .permissions_for(caller)
            .map(|permission| permission.permission)
            .collect();

        PermissionTier::ALL
            .into_iter()
            .filter(|tier| held.contains(tier))
            .collect()
    }

    pub fn is_relevant_to(&self, caller: &CallerContext) -> bool {
        self.permissions_for(caller).next().is_some()
    }
}

impl Validate for Constraint {
    type Error = ConstraintError;

    /// Validate a constraint before it gets persisted.
    ///
    /// 1. Identifier and name are valid names (see [`is_valid_name`])
    /// 2. The description is at most [`MAX_LENGTH`] characters long
    /// 3. At least one group permission is granted, with every group id being a valid name and
    ///    every group holding only one tier
    /// 4. At least one criterion is given
    /// 5. Every criterion is valid
    fn validate(&self) -> Result<(), Self::Error> {
        validate_name("constraintId", &self.constraint_id)?;
        validate_name("name", &self.name)?;
        validate_length("description", &self.description)?;

        if self.group_permissions.is_empty() {
            return Err(ConstraintError::MissingGroupPermissions(
                self.constraint_id.clone(),
            ));
        }

        let mut groups = HashSet::new();
        for permission in &self.group_permissions {
            validate_name("groupId", &permission.group_id)?;

            if !groups.insert(permission.group_id.as_str()) {
                return Err(ConstraintError::DuplicateGroupPermission {
                    constraint_id: self.constraint_id.clone(),
                    group_id: permission.group_id.clone(),
                });
            }
        }

        if self.criteria.is_empty() {
            return Err(ConstraintError::MissingCriteria(self.constraint_id.clone()));
        }

        for criterion in &self.criteria {
            criterion.validate()?;
        }

        Ok(())
    }
}

impl Validate for Criterion {
    type Error = ConstraintError;

    /// Validate a single criterion.
    ///
    /// 1. The field is a valid field name (see [`is_valid_field_name`]) of at most
    ///    [`MAX_LENGTH`] characters
    /// 2. The operator is supported
    /// 3. The value is at most [`MAX_LENGTH`] characters long and not empty, for set operators
    ///    it contains at least one token
    fn validate(&self) -> Result<(), Self::Error> {
        if self.field.trim().is_empty() {
            return Err(ConstraintError::MissingField("field"));
        }
        validate_length("field", &self.field)?;

        if !is_valid_field_name(&self.field) {
            return Err(ConstraintError::InvalidFieldName(self.field.clone()));
        }

        if let Operator::Unsupported(name) = &self.operator {
            return Err(UnknownOperatorError(name.clone()).into());
        }

        validate_length("value", &self.value)?;

        let is_empty = if self.operator.is_set() {
            self.values().is_empty()
        } else {
            self.value.trim().is_empty()
        };

        if is_empty {
            return Err(ConstraintError::EmptyValue(self.field.clone()));
        }

        Ok(())
    }
}

fn validate_length(field: &'static str, value: &str) -> Result<(), ConstraintError> {
    if value.chars().count() > MAX_LENGTH {
        return Err(ConstraintError::TooLong {
            field,
            max: MAX_LENGTH,
        });
    }

    Ok(())
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ConstraintError> {
    if value.trim().is_empty() {
        return Err(ConstraintError::MissingField(field));
    }

    validate_length(field, value)?;

    if !is_valid_name(value) {
        return Err(ConstraintError::InvalidName {
            field,
            value: value.to_owned(),
        });
    }

    Ok(())
}
