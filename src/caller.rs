// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request view of the caller's group memberships.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identifier of a group (or role) which can be granted permissions on a constraint.
pub type GroupId = String;

/// Claims handed over by the identity layer for an authenticated request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Group identifiers the caller is a member of.
    #[serde(default)]
    pub tokens: Vec<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// Groups of the caller, built once per request and discarded afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerContext {
    groups: HashSet<GroupId>,
}

impl CallerContext {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<GroupId>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the caller context from claims, treating every token as a group identifier.
    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.tokens.iter().cloned())
    }

    pub fn groups(&self) -> &HashSet<GroupId> {
        &self.groups
    }

    pub fn is_member(&self, group_id: &str) -> bool {
        self.groups.contains(group_id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl From<&Claims> for CallerContext {
    fn from(claims: &Claims) -> Self {
        Self::from_claims(claims)
    }
}
